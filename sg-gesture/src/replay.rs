//! This module provides collaborators for the gesture bridge which don't need a real camera or
//! model: a [`ReplayClassifier`] which plays back scripted results, and a [`SyntheticCamera`]
//! which produces blank frames on a steady clock.

use crate::{
    Camera, CaptureRequest, Classifier, ClassifierLoader, GestureError, GestureResult, VideoFrame,
    VideoStream,
};
use image::RgbImage;
use std::{cell::Cell, collections::VecDeque, fs, path::PathBuf, rc::Rc};
use tracing::{debug, instrument, trace};

/// A classifier which returns a scripted result for each frame, in order. Once the script runs
/// out, it never finds a hand.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReplayClassifier {
    /// The results still to be returned.
    script: VecDeque<Option<GestureResult>>,

    /// The timestamp of the last call, to make sure time never goes backwards.
    last_timestamp: Option<u64>,
}

impl ReplayClassifier {
    /// Create a classifier that plays back the given results.
    pub fn new(script: impl IntoIterator<Item = Option<GestureResult>>) -> Self {
        Self {
            script: script.into_iter().collect(),
            last_timestamp: None,
        }
    }

    /// The number of results still to be returned.
    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl Classifier for ReplayClassifier {
    fn classify(&mut self, _frame: &VideoFrame, timestamp_ms: u64) -> Option<GestureResult> {
        if self
            .last_timestamp
            .is_some_and(|last| timestamp_ms < last)
        {
            debug!(timestamp_ms, "Timestamp went backwards");
        }
        self.last_timestamp = Some(timestamp_ms);

        let result = self.script.pop_front().flatten();
        trace!(timestamp_ms, found_hand = result.is_some(), "Replayed classification");
        result
    }
}

/// Where a [`ReplayLoader`] gets its script from.
#[derive(Clone, Debug, PartialEq)]
enum ScriptSource {
    /// A script already in memory.
    Memory(Vec<Option<GestureResult>>),

    /// A RON file containing a list of results.
    File(PathBuf),

    /// Loading always fails with this message.
    Broken(String),
}

/// A loader for a [`ReplayClassifier`].
///
/// Clones share the count of how many times the model was loaded.
#[derive(Clone, Debug)]
pub struct ReplayLoader {
    /// Where the script comes from.
    source: ScriptSource,

    /// The number of successful loads.
    loads: Rc<Cell<usize>>,
}

impl ReplayLoader {
    fn with_source(source: ScriptSource) -> Self {
        Self {
            source,
            loads: Rc::new(Cell::new(0)),
        }
    }

    /// A loader for a script that's already in memory.
    pub fn from_results(script: Vec<Option<GestureResult>>) -> Self {
        Self::with_source(ScriptSource::Memory(script))
    }

    /// A loader that reads a RON list of results from the given file when it loads.
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self::with_source(ScriptSource::File(path.into()))
    }

    /// A loader that always fails.
    pub fn broken(message: impl Into<String>) -> Self {
        Self::with_source(ScriptSource::Broken(message.into()))
    }

    /// The number of times the model has been loaded.
    pub fn loads(&self) -> usize {
        self.loads.get()
    }
}

impl ClassifierLoader for ReplayLoader {
    #[instrument(skip(self))]
    fn load(&mut self) -> Result<Box<dyn Classifier>, GestureError> {
        let script = match &self.source {
            ScriptSource::Memory(script) => script.clone(),
            ScriptSource::File(path) => {
                let text = fs::read_to_string(path).map_err(|e| {
                    GestureError::ModelLoad(format!("couldn't read {}: {e}", path.display()))
                })?;
                ron::from_str(&text).map_err(|e| {
                    GestureError::ModelLoad(format!("couldn't parse {}: {e}", path.display()))
                })?
            }
            ScriptSource::Broken(message) => return Err(GestureError::ModelLoad(message.clone())),
        };

        self.loads.set(self.loads.get() + 1);
        debug!(frames = script.len(), "Loaded replay script");

        Ok(Box::new(ReplayClassifier::new(script)))
    }
}

/// A camera that produces blank frames at a steady rate.
///
/// Clones share the count of open tracks and how many times the camera was opened.
#[derive(Clone, Debug)]
pub struct SyntheticCamera {
    /// How many times the stream reports zero dimensions before its metadata is ready.
    metadata_delay: u32,

    /// How many times [`VideoStream::current_time`] can be called before the video moves on to
    /// the next frame.
    hold_frames: u32,

    /// Whether access to the camera is denied.
    denied: bool,

    /// The number of streams which haven't been stopped yet.
    live_tracks: Rc<Cell<usize>>,

    /// The number of times the camera was successfully opened.
    opens: Rc<Cell<usize>>,
}

impl Default for SyntheticCamera {
    fn default() -> Self {
        Self {
            metadata_delay: 0,
            hold_frames: 1,
            denied: false,
            live_tracks: Rc::new(Cell::new(0)),
            opens: Rc::new(Cell::new(0)),
        }
    }
}

impl SyntheticCamera {
    /// Create a camera which delivers a new frame every time it's polled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Report zero dimensions for this many polls after opening.
    pub fn with_metadata_delay(self, polls: u32) -> Self {
        Self {
            metadata_delay: polls,
            ..self
        }
    }

    /// Keep each frame for this many polls of the current time.
    pub fn with_hold_frames(self, polls: u32) -> Self {
        Self {
            hold_frames: polls.max(1),
            ..self
        }
    }

    /// Deny access to the camera.
    pub fn denied(self) -> Self {
        Self {
            denied: true,
            ..self
        }
    }

    /// The number of streams which are still running.
    pub fn live_tracks(&self) -> usize {
        self.live_tracks.get()
    }

    /// The number of times the camera was opened.
    pub fn opens(&self) -> usize {
        self.opens.get()
    }
}

impl Camera for SyntheticCamera {
    #[instrument(skip(self))]
    fn open(&mut self, request: &CaptureRequest) -> Result<Box<dyn VideoStream>, GestureError> {
        if self.denied {
            return Err(GestureError::CameraAccess("permission denied".to_string()));
        }

        let (width, height) = (request.width, request.height);
        self.live_tracks.set(self.live_tracks.get() + 1);
        self.opens.set(self.opens.get() + 1);

        Ok(Box::new(SyntheticStream {
            width,
            height,
            frame_rate: f64::from(request.frame_rate.max(1)),
            metadata_delay: self.metadata_delay,
            hold_frames: self.hold_frames,
            polls: 0,
            frame_index: 0,
            stopped: false,
            live_tracks: Rc::clone(&self.live_tracks),
        }))
    }
}

/// The stream from a [`SyntheticCamera`].
#[derive(Debug)]
struct SyntheticStream {
    width: u32,
    height: u32,
    frame_rate: f64,
    metadata_delay: u32,
    hold_frames: u32,
    polls: u32,
    frame_index: u64,
    stopped: bool,
    live_tracks: Rc<Cell<usize>>,
}

impl VideoStream for SyntheticStream {
    fn dimensions(&mut self) -> (u32, u32) {
        if self.metadata_delay > 0 {
            self.metadata_delay -= 1;
            return (0, 0);
        }
        (self.width, self.height)
    }

    fn current_time(&mut self) -> f64 {
        let time = self.frame_index as f64 / self.frame_rate;

        self.polls += 1;
        if self.polls >= self.hold_frames {
            self.polls = 0;
            self.frame_index += 1;
        }

        time
    }

    fn frame(&mut self) -> Result<VideoFrame, GestureError> {
        if self.stopped {
            return Err(GestureError::CameraFrame("stream stopped".to_string()));
        }

        Ok(VideoFrame {
            image: RgbImage::new(self.width, self.height),
        })
    }

    fn stop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.live_tracks.set(self.live_tracks.get().saturating_sub(1));
        }
    }
}
