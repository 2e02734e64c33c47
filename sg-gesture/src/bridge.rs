//! This module provides the [`GestureBridge`], which polls the camera every frame, classifies what
//! it sees, and switches the snow on and off.
//!
//! The bridge moves between three states:
//!
//! ```text
//! Idle --start--> Loading --stream acquired--> Active --stop--> Idle
//!                    |                            |
//!                    +------- failure ------------+----> Idle (with an error message)
//! ```

use crate::{
    draw_skeleton, skeleton_colour, Camera, CaptureRequest, Category, Classifier,
    ClassifierLoader, GestureError, GestureLabel, GestureResult, VideoStream,
};
use serde::{Deserialize, Serialize};
use sg_frame::{FrameLoop, FrameScheduler};
use sg_scene::Settings;
use sg_surface_trait::Surface;
use strum::Display;
use tracing::{debug, error, info, instrument, trace, warn};

/// The state of a [`GestureBridge`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Display)]
pub enum BridgeState {
    /// Not running.
    #[default]
    Idle,

    /// Loading the model and opening the camera.
    Loading,

    /// The camera is running and every new frame is being classified.
    Active,
}

/// The config for the gesture bridge.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// A gesture must be more confident than this to count.
    pub threshold: f32,

    /// The video to ask the camera for.
    pub request: CaptureRequest,

    /// Whether to draw the skeleton like a mirror image.
    pub mirror: bool,

    /// The width and height of the surface the skeleton is drawn onto. This is independent of
    /// the video size, since landmarks are normalised.
    pub overlay_size: (u32, u32),
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            request: CaptureRequest::default(),
            mirror: true,
            overlay_size: (128, 96),
        }
    }
}

/// The gesture, but only if the classifier is more confident than the threshold.
pub fn confident_gesture(category: &Category, threshold: f32) -> Option<GestureLabel> {
    (category.score > threshold).then(|| category.label())
}

/// Decide what a confident gesture does to the snow. An open palm switches it on and a closed fist
/// switches it off. Anything else leaves the snow alone.
pub fn snow_toggle(label: &GestureLabel) -> Option<bool> {
    match label {
        GestureLabel::OpenPalm => Some(true),
        GestureLabel::ClosedFist => Some(false),
        _ => None,
    }
}

/// The bridge between a camera, a gesture classifier, and the snow.
pub struct GestureBridge<O> {
    /// Loads the classifier the first time the bridge starts.
    loader: Box<dyn ClassifierLoader>,

    /// The camera to open when the bridge starts.
    camera: Box<dyn Camera>,

    /// The surface to draw the hand skeleton onto.
    overlay: O,

    /// The classifier, once it's been loaded. This is kept when the bridge stops.
    classifier: Option<Box<dyn Classifier>>,

    /// The video stream while the bridge is active.
    stream: Option<Box<dyn VideoStream>>,

    /// The current state.
    state: BridgeState,

    /// The loop that calls [`Self::on_frame`].
    frame_loop: FrameLoop,

    /// The video time of the last classified frame.
    last_video_time: Option<f64>,

    /// The last confident gesture.
    current_gesture: GestureLabel,

    /// A message for the user about the last failure.
    error: Option<String>,

    /// The config.
    config: GestureConfig,
}

impl<O> std::fmt::Debug for GestureBridge<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GestureBridge")
            .field("classifier_loaded", &self.classifier.is_some())
            .field("streaming", &self.stream.is_some())
            .field("state", &self.state)
            .field("frame_loop", &self.frame_loop)
            .field("last_video_time", &self.last_video_time)
            .field("current_gesture", &self.current_gesture)
            .field("error", &self.error)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<O: Surface> GestureBridge<O> {
    /// Create a new idle bridge.
    pub fn new(
        loader: Box<dyn ClassifierLoader>,
        camera: Box<dyn Camera>,
        overlay: O,
        config: GestureConfig,
    ) -> Self {
        Self {
            loader,
            camera,
            overlay,
            classifier: None,
            stream: None,
            state: BridgeState::Idle,
            frame_loop: FrameLoop::new(),
            last_video_time: None,
            current_gesture: GestureLabel::NoGesture,
            error: None,
            config,
        }
    }

    /// Start the bridge. This loads the classifier if it hasn't been loaded yet, then opens the
    /// camera and starts polling it every frame.
    ///
    /// On failure the bridge goes back to [`BridgeState::Idle`] and
    /// [`error_message`](Self::error_message) explains what happened. Starting again retries.
    #[instrument(skip_all)]
    pub fn start(&mut self, scheduler: &mut FrameScheduler) {
        if self.state != BridgeState::Idle {
            debug!(state = %self.state, "Gesture bridge already started");
            return;
        }

        self.error = None;
        self.state = BridgeState::Loading;
        info!("Starting gesture bridge");

        if self.classifier.is_none() {
            match self.loader.load() {
                Ok(classifier) => {
                    info!("Loaded gesture classifier");
                    self.classifier = Some(classifier);
                }
                Err(err) => return self.fail(err),
            }
        }

        match self.camera.open(&self.config.request) {
            Ok(stream) => {
                self.stream = Some(stream);
                self.last_video_time = None;
                self.state = BridgeState::Active;
                self.frame_loop.start(scheduler);
                info!("Gesture bridge active");
            }
            Err(err) => self.fail(err),
        }
    }

    /// Poll the camera if the bridge's frame callback is due, classify any new frame, and update
    /// the settings. Returns true if the callback ran.
    pub fn on_frame(&mut self, scheduler: &mut FrameScheduler, settings: &mut Settings) -> bool {
        if !self.frame_loop.poll(scheduler) {
            return false;
        }

        let (Some(stream), Some(classifier)) = (self.stream.as_mut(), self.classifier.as_mut())
        else {
            return true;
        };

        // Keep polling until the video knows how big it is
        let (width, height) = stream.dimensions();
        if width == 0 || height == 0 {
            trace!("Waiting for video metadata");
            return true;
        }

        let video_time = stream.current_time();
        if self.last_video_time == Some(video_time) {
            return true;
        }
        self.last_video_time = Some(video_time);

        let frame = match stream.frame() {
            Ok(frame) => frame,
            Err(err) => {
                self.fail(err);
                self.teardown(scheduler);
                return true;
            }
        };

        let timestamp_ms = scheduler.elapsed().as_millis() as u64;
        let result = classifier.classify(&frame, timestamp_ms);
        self.apply(result, settings);

        true
    }

    /// Stop the camera and the polling loop. The classifier is kept for next time.
    #[instrument(skip_all)]
    pub fn stop(&mut self, scheduler: &mut FrameScheduler) {
        if self.state == BridgeState::Idle && self.stream.is_none() {
            return;
        }

        self.teardown(scheduler);
        info!("Stopped gesture bridge");
    }

    /// The current state.
    pub fn state(&self) -> BridgeState {
        self.state
    }

    /// The last gesture that was recognised with enough confidence.
    pub fn current_gesture(&self) -> &GestureLabel {
        &self.current_gesture
    }

    /// A short message about the last failure, if there was one.
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// The surface the skeleton is drawn onto.
    pub fn overlay(&self) -> &O {
        &self.overlay
    }

    /// Is the classifier loaded?
    pub fn is_classifier_loaded(&self) -> bool {
        self.classifier.is_some()
    }

    /// Draw the skeleton for a classification result and act on its gesture.
    fn apply(&mut self, result: Option<GestureResult>, settings: &mut Settings) {
        let Some(GestureResult { landmarks, gesture }) = result else {
            self.overlay.clear();
            self.current_gesture = GestureLabel::NoGesture;
            return;
        };

        let label = gesture
            .as_ref()
            .map(Category::label)
            .unwrap_or_default();
        draw_skeleton(
            &mut self.overlay,
            &landmarks,
            skeleton_colour(&label),
            self.config.mirror,
        );

        let Some(category) = gesture else {
            self.current_gesture = GestureLabel::NoGesture;
            return;
        };

        let Some(label) = confident_gesture(&category, self.config.threshold) else {
            trace!(?label, score = category.score, "Gesture not confident enough");
            return;
        };

        if let Some(snow_enabled) = snow_toggle(&label) {
            if settings.snow_enabled != snow_enabled {
                info!(?label, snow_enabled, "Gesture toggled snow");
            }
            settings.snow_enabled = snow_enabled;
        }
        self.current_gesture = label;
    }

    /// Record a failure and go back to idle.
    fn fail(&mut self, err: GestureError) {
        match err {
            GestureError::CameraFrame(_) => warn!(%err, "Gesture bridge failed"),
            _ => error!(%err, "Gesture bridge failed"),
        }
        self.error = Some(err.user_message().to_string());
        self.state = BridgeState::Idle;
    }

    /// Release the camera, cancel the loop, and reset everything the user can see.
    fn teardown(&mut self, scheduler: &mut FrameScheduler) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop();
        }
        self.frame_loop.stop(scheduler);
        self.last_video_time = None;
        self.current_gesture = GestureLabel::NoGesture;
        self.overlay.clear();
        self.state = BridgeState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Landmark, ReplayLoader, SyntheticCamera, LANDMARK_COUNT};
    use sg_surface_trait::RecordingSurface;
    use std::time::Duration;

    const REFRESH: Duration = Duration::from_millis(16);

    fn hand(name: &str, score: f32) -> Option<GestureResult> {
        Some(GestureResult {
            landmarks: [Landmark {
                x: 0.5,
                y: 0.5,
                z: 0.,
            }; LANDMARK_COUNT],
            gesture: Some(Category::new(name, score)),
        })
    }

    struct Fixture {
        bridge: GestureBridge<RecordingSurface>,
        loader: ReplayLoader,
        camera: SyntheticCamera,
        overlay: RecordingSurface,
        scheduler: FrameScheduler,
        settings: Settings,
    }

    impl Fixture {
        fn new(loader: ReplayLoader, camera: SyntheticCamera) -> Self {
            let overlay = RecordingSurface::new(128, 96);
            let bridge = GestureBridge::new(
                Box::new(loader.clone()),
                Box::new(camera.clone()),
                overlay.clone(),
                GestureConfig::default(),
            );

            Self {
                bridge,
                loader,
                camera,
                overlay,
                scheduler: FrameScheduler::new(),
                settings: Settings::default(),
            }
        }

        fn scripted(script: Vec<Option<GestureResult>>) -> Self {
            Self::new(ReplayLoader::from_results(script), SyntheticCamera::new())
        }

        fn start(&mut self) {
            self.bridge.start(&mut self.scheduler);
        }

        fn run(&mut self, frames: usize) {
            for _ in 0..frames {
                self.scheduler.begin_frame(REFRESH);
                self.bridge.on_frame(&mut self.scheduler, &mut self.settings);
            }
        }
    }

    #[test]
    fn threshold_test() {
        for label in ["Open_Palm", "Closed_Fist", "Victory", "None", "Mystery"] {
            for score in [0., 0.1, 0.3, 0.49, 0.5] {
                assert_eq!(confident_gesture(&Category::new(label, score), 0.5), None);
            }
        }

        let toggle = |name: &str, score: f32| {
            confident_gesture(&Category::new(name, score), 0.5)
                .as_ref()
                .and_then(snow_toggle)
        };
        assert_eq!(toggle("Open_Palm", 0.51), Some(true));
        assert_eq!(toggle("Closed_Fist", 0.9), Some(false));
        assert_eq!(toggle("Thumb_Up", 0.99), None);
        assert_eq!(
            confident_gesture(&Category::new("Thumb_Up", 0.99), 0.5),
            Some(GestureLabel::ThumbUp)
        );
    }

    #[test]
    fn gesture_config_defaults_test() {
        let config: GestureConfig = ron::from_str("(threshold: 0.7)").unwrap();
        assert_eq!(config.threshold, 0.7);
        assert_eq!(config.overlay_size, (128, 96));
        assert_eq!(config.request, CaptureRequest::default());

        let config: GestureConfig = ron::from_str("(overlay_size: (64, 48))").unwrap();
        assert_eq!(config.overlay_size, (64, 48));
        assert!(config.mirror);
    }

    #[test]
    fn confident_other_gesture_is_shown_test() {
        let mut fixture = Fixture::scripted(vec![hand("Thumb_Up", 0.9), hand("Victory", 0.3)]);
        fixture.settings.snow_enabled = false;
        fixture.start();

        fixture.run(1);
        assert!(!fixture.settings.snow_enabled);
        assert_eq!(*fixture.bridge.current_gesture(), GestureLabel::ThumbUp);

        // An unconfident gesture keeps showing the last confident one
        fixture.run(1);
        assert_eq!(*fixture.bridge.current_gesture(), GestureLabel::ThumbUp);
    }

    #[test]
    fn low_confidence_leaves_snow_alone_test() {
        for snow_enabled in [true, false] {
            let mut fixture = Fixture::scripted(vec![
                hand("Open_Palm", 0.5),
                hand("Closed_Fist", 0.2),
                hand("Open_Palm", 0.05),
            ]);
            fixture.settings.snow_enabled = snow_enabled;
            fixture.start();
            fixture.run(3);

            assert_eq!(fixture.settings.snow_enabled, snow_enabled);
            assert_eq!(*fixture.bridge.current_gesture(), GestureLabel::NoGesture);
        }
    }

    #[test]
    fn palm_then_fist_test() {
        let mut fixture =
            Fixture::scripted(vec![hand("Open_Palm", 0.9), hand("Closed_Fist", 0.9)]);
        fixture.settings.snow_enabled = false;
        fixture.start();
        assert_eq!(fixture.bridge.state(), BridgeState::Active);

        fixture.run(1);
        assert!(fixture.settings.snow_enabled);
        assert_eq!(*fixture.bridge.current_gesture(), GestureLabel::OpenPalm);

        fixture.run(1);
        assert!(!fixture.settings.snow_enabled);
        assert_eq!(*fixture.bridge.current_gesture(), GestureLabel::ClosedFist);
    }

    #[test]
    fn unchanged_video_is_not_reclassified_test() {
        let mut fixture = Fixture::new(
            ReplayLoader::from_results(vec![hand("Open_Palm", 0.9), hand("Closed_Fist", 0.9)]),
            SyntheticCamera::new().with_hold_frames(3),
        );
        fixture.settings.snow_enabled = false;
        fixture.start();

        // The first video frame is polled three times but only classified once
        fixture.run(3);
        assert!(fixture.settings.snow_enabled);
        assert_eq!(fixture.overlay.frame_count(), 1);

        fixture.run(1);
        assert!(!fixture.settings.snow_enabled);
        assert_eq!(fixture.overlay.frame_count(), 2);
    }

    #[test]
    fn waits_for_metadata_test() {
        let mut fixture = Fixture::new(
            ReplayLoader::from_results(vec![hand("Open_Palm", 0.9)]),
            SyntheticCamera::new().with_metadata_delay(4),
        );
        fixture.settings.snow_enabled = false;
        fixture.start();

        fixture.run(4);
        assert!(!fixture.settings.snow_enabled);
        assert_eq!(fixture.overlay.frame_count(), 0);
        assert_eq!(fixture.scheduler.pending_callbacks(), 1);

        fixture.run(1);
        assert!(fixture.settings.snow_enabled);
    }

    #[test]
    fn skeleton_overlay_test() {
        let mut fixture = Fixture::scripted(vec![hand("Open_Palm", 0.9), None, hand("Victory", 0.2)]);
        fixture.start();

        fixture.run(1);
        let frame = fixture.overlay.last_frame();
        assert_eq!(frame.len(), 23 + 21);
        assert_eq!(
            frame[0].solid_colour(),
            Some(sg_frame::Colour::rgb(0x4a, 0xde, 0x80))
        );

        // No hand clears the overlay and resets the gesture
        fixture.run(1);
        assert!(fixture.overlay.last_frame().is_empty());
        assert_eq!(*fixture.bridge.current_gesture(), GestureLabel::NoGesture);

        // A hand is drawn even when its gesture isn't confident
        fixture.run(1);
        assert_eq!(fixture.overlay.last_frame().len(), 23 + 21);
    }

    #[test]
    fn model_load_failure_test() {
        let mut fixture = Fixture::new(ReplayLoader::broken("no GPU"), SyntheticCamera::new());
        fixture.start();

        assert_eq!(fixture.bridge.state(), BridgeState::Idle);
        assert_eq!(
            fixture.bridge.error_message(),
            Some("Failed to load AI model.")
        );
        assert_eq!(fixture.camera.opens(), 0);
        assert_eq!(fixture.scheduler.pending_callbacks(), 0);
    }

    #[test]
    fn camera_denied_test() {
        let mut fixture = Fixture::new(
            ReplayLoader::from_results(vec![]),
            SyntheticCamera::new().denied(),
        );
        fixture.start();

        assert_eq!(fixture.bridge.state(), BridgeState::Idle);
        assert_eq!(fixture.bridge.error_message(), Some("Camera access denied."));
        assert!(fixture.bridge.is_classifier_loaded());
        assert_eq!(fixture.scheduler.pending_callbacks(), 0);

        fixture.run(3);
        assert_eq!(fixture.scheduler.invocations(), 0);
    }

    #[test]
    fn model_loaded_once_test() {
        let mut fixture = Fixture::scripted(vec![]);

        for _ in 0..3 {
            fixture.start();
            assert_eq!(fixture.bridge.state(), BridgeState::Active);
            fixture.run(2);
            fixture.bridge.stop(&mut fixture.scheduler);
        }

        assert_eq!(fixture.loader.loads(), 1);
        assert_eq!(fixture.camera.opens(), 3);
    }

    #[test]
    fn stop_releases_everything_test() {
        let mut fixture = Fixture::scripted(vec![hand("Open_Palm", 0.9)]);
        fixture.start();
        fixture.run(1);
        assert_eq!(fixture.camera.live_tracks(), 1);
        assert_eq!(*fixture.bridge.current_gesture(), GestureLabel::OpenPalm);

        fixture.bridge.stop(&mut fixture.scheduler);
        assert_eq!(fixture.bridge.state(), BridgeState::Idle);
        assert_eq!(fixture.camera.live_tracks(), 0);
        assert_eq!(*fixture.bridge.current_gesture(), GestureLabel::NoGesture);
        assert!(fixture.overlay.last_frame().is_empty());
        assert_eq!(fixture.scheduler.pending_callbacks(), 0);

        let invocations = fixture.scheduler.invocations();
        fixture.run(5);
        assert_eq!(fixture.scheduler.invocations(), invocations);
    }
}
