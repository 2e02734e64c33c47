//! This module provides [`CaptureWorker`], which pulls frames from a blocking video source on its
//! own thread so that polling the latest frame never waits for the hardware.

#![cfg_attr(not(feature = "nokhwa"), allow(dead_code))]

use crate::{GestureError, VideoFrame};
use image::RgbImage;
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc, Arc, PoisonError, RwLock,
    },
    thread,
    time::{Duration, Instant},
};
use tracing::{debug, info, warn};

/// How long to wait before trying again after a failed capture.
const RETRY_DELAY: Duration = Duration::from_millis(100);

/// A blocking source of video frames. It lives entirely on the worker thread, so it doesn't need
/// to be [`Send`].
pub(crate) trait CaptureSource {
    /// Wait for the next frame.
    fn capture(&mut self) -> Result<RgbImage, GestureError>;

    /// Release the device.
    fn stop(&mut self);
}

/// The newest frame captured by the worker.
#[derive(Debug, Default)]
struct Latest {
    /// The frame, once one has arrived.
    frame: Option<VideoFrame>,

    /// When the frame was captured, in seconds since the worker started.
    time: f64,
}

/// A thread which captures frames as fast as its source delivers them and keeps only the newest.
///
/// The thread stops and releases its source when [`Self::stop`] is called or the worker is
/// dropped.
#[derive(Debug)]
pub(crate) struct CaptureWorker {
    /// The newest frame.
    latest: Arc<RwLock<Latest>>,

    /// Cleared to tell the thread to stop.
    running: Arc<AtomicBool>,

    /// The size of the frames.
    resolution: (u32, u32),
}

impl CaptureWorker {
    /// Spawn the worker thread and open the source on it with `open`, which also gives the size of
    /// the frames. This only waits for the source to open, never for a frame.
    pub fn spawn<S, F>(name: &str, open: F) -> Result<Self, GestureError>
    where
        S: CaptureSource + 'static,
        F: FnOnce() -> Result<(S, (u32, u32)), GestureError> + Send + 'static,
    {
        let latest = Arc::new(RwLock::new(Latest::default()));
        let running = Arc::new(AtomicBool::new(true));
        let (opened_tx, opened_rx) = mpsc::sync_channel(1);

        let thread_latest = Arc::clone(&latest);
        let thread_running = Arc::clone(&running);

        thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                let mut source = match open() {
                    Ok((source, resolution)) => {
                        if opened_tx.send(Ok(resolution)).is_err() {
                            return;
                        }
                        source
                    }
                    Err(err) => {
                        let _ = opened_tx.send(Err(err));
                        return;
                    }
                };

                capture_loop(&mut source, &thread_latest, &thread_running);
                source.stop();
                debug!("Capture worker stopped");
            })
            .map_err(|e| GestureError::CameraAccess(e.to_string()))?;

        let resolution = opened_rx.recv().map_err(|_| {
            GestureError::CameraAccess("capture thread exited before opening".to_string())
        })??;
        info!(?resolution, "Capture worker running");

        Ok(Self {
            latest,
            running,
            resolution,
        })
    }

    /// The size of the frames.
    pub fn resolution(&self) -> (u32, u32) {
        self.resolution
    }

    /// When the newest frame was captured, in seconds since the worker started. This is 0 until
    /// the first frame arrives.
    pub fn current_time(&self) -> f64 {
        self.latest
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .time
    }

    /// A copy of the newest frame, if one has arrived.
    pub fn latest_frame(&self) -> Option<VideoFrame> {
        self.latest
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .frame
            .clone()
    }

    /// Tell the thread to stop after its current capture.
    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }
}

impl Drop for CaptureWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Capture frames into `latest` until `running` is cleared.
fn capture_loop<S: CaptureSource>(source: &mut S, latest: &RwLock<Latest>, running: &AtomicBool) {
    let started = Instant::now();

    while running.load(Ordering::Acquire) {
        match source.capture() {
            Ok(image) => {
                let mut latest = latest.write().unwrap_or_else(PoisonError::into_inner);
                latest.frame = Some(VideoFrame { image });
                latest.time = started.elapsed().as_secs_f64();
            }
            Err(err) => {
                warn!(%err, "Failed to capture frame");
                thread::sleep(RETRY_DELAY);
            }
        }
    }
}
