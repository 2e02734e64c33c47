//! This module provides the traits for the external collaborators of the gesture bridge: the
//! classifier model and the camera.
//!
//! The bridge only owns the polling loop, the confidence decision, and the skeleton overlay.
//! Everything else is injected through these traits.

use crate::{GestureError, GestureResult, VideoFrame};
use serde::{Deserialize, Serialize};

/// A loaded gesture classifier.
pub trait Classifier {
    /// Classify a single video frame. The timestamp must never decrease between calls.
    ///
    /// Returns `None` if there's no hand in the frame.
    fn classify(&mut self, frame: &VideoFrame, timestamp_ms: u64) -> Option<GestureResult>;
}

/// Something which can load a [`Classifier`]. Loading can be slow, so the bridge only ever does
/// it once.
pub trait ClassifierLoader {
    /// Load the classifier.
    fn load(&mut self) -> Result<Box<dyn Classifier>, GestureError>;
}

/// Which way the camera should face.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Facing {
    /// Towards the user.
    #[default]
    User,

    /// Away from the user.
    Environment,
}

/// The video that the bridge asks the camera for. The camera may pick something close instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureRequest {
    /// The width of each frame.
    pub width: u32,

    /// The height of each frame.
    pub height: u32,

    /// The number of frames per second.
    pub frame_rate: u32,

    /// Which way the camera should face.
    pub facing: Facing,
}

impl Default for CaptureRequest {
    fn default() -> Self {
        Self {
            width: 320,
            height: 240,
            frame_rate: 30,
            facing: Facing::User,
        }
    }
}

/// A video capture device.
pub trait Camera {
    /// Open a stream of video. This fails if there's no camera or access is denied.
    fn open(&mut self, request: &CaptureRequest) -> Result<Box<dyn VideoStream>, GestureError>;
}

/// A live stream of video from a [`Camera`].
pub trait VideoStream {
    /// The size of each frame. This is `(0, 0)` until the stream knows its own metadata.
    fn dimensions(&mut self) -> (u32, u32);

    /// The presentation time of the current frame in seconds. This only changes when a new
    /// frame is available.
    fn current_time(&mut self) -> f64;

    /// The current frame.
    fn frame(&mut self) -> Result<VideoFrame, GestureError>;

    /// Stop every track of the stream and release the camera.
    fn stop(&mut self);
}
