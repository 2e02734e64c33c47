//! This module provides [`NokhwaCamera`], a real webcam captured with `nokhwa`.
//!
//! `nokhwa` blocks until the webcam delivers a frame, so the camera is opened and read on a
//! [`CaptureWorker`] thread and the bridge only ever looks at the newest frame.

use crate::{
    capture::{CaptureSource, CaptureWorker},
    Camera, CaptureRequest, GestureError, VideoFrame, VideoStream,
};
use image::RgbImage;
use nokhwa::{
    pixel_format::RgbFormat,
    utils::{
        CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution,
    },
};
use tracing::{info, instrument, warn};

/// A webcam on this device.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NokhwaCamera {
    /// The index of the camera.
    index: u32,
}

impl NokhwaCamera {
    /// Use the camera with the given index. The default webcam is usually 0.
    pub fn new(index: u32) -> Self {
        nokhwa::nokhwa_initialize(|_| {});
        Self { index }
    }
}

impl Camera for NokhwaCamera {
    #[instrument]
    fn open(&mut self, request: &CaptureRequest) -> Result<Box<dyn VideoStream>, GestureError> {
        let index = self.index;
        let format = CameraFormat::new(
            Resolution::new(request.width, request.height),
            FrameFormat::MJPEG,
            request.frame_rate,
        );

        let worker = CaptureWorker::spawn("webcam capture", move || {
            let requested =
                RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(format));
            let mut camera = nokhwa::Camera::new(CameraIndex::Index(index), requested)
                .map_err(|e| GestureError::CameraAccess(e.to_string()))?;
            camera
                .open_stream()
                .map_err(|e| GestureError::CameraAccess(e.to_string()))?;

            let Resolution { width_x, height_y } = camera.resolution();
            info!(width_x, height_y, "Opened webcam");

            Ok((Webcam { camera }, (width_x, height_y)))
        })?;

        Ok(Box::new(NokhwaStream {
            worker: Some(worker),
        }))
    }
}

/// An open webcam, owned by the capture thread.
struct Webcam {
    camera: nokhwa::Camera,
}

impl CaptureSource for Webcam {
    fn capture(&mut self) -> Result<RgbImage, GestureError> {
        self.camera
            .frame()
            .and_then(|buffer| buffer.decode_image::<RgbFormat>())
            .map_err(|e| GestureError::CameraFrame(e.to_string()))
    }

    fn stop(&mut self) {
        if let Err(e) = self.camera.stop_stream() {
            warn!(%e, "Failed to stop webcam stream");
        }
    }
}

/// A running webcam stream. Stopping it drops the worker, which releases the webcam.
struct NokhwaStream {
    worker: Option<CaptureWorker>,
}

impl VideoStream for NokhwaStream {
    fn dimensions(&mut self) -> (u32, u32) {
        // The size only counts once there's a frame to go with it
        match &self.worker {
            Some(worker) if worker.current_time() > 0. => worker.resolution(),
            _ => (0, 0),
        }
    }

    fn current_time(&mut self) -> f64 {
        self.worker
            .as_ref()
            .map_or(0., CaptureWorker::current_time)
    }

    fn frame(&mut self) -> Result<VideoFrame, GestureError> {
        self.worker
            .as_ref()
            .and_then(CaptureWorker::latest_frame)
            .ok_or_else(|| GestureError::CameraFrame("no frame has been captured".to_string()))
    }

    fn stop(&mut self) {
        self.worker = None;
    }
}
