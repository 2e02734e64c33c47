//! This module provides [`GestureError`].

use thiserror::Error;

/// An error from one of the collaborators of the gesture bridge.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GestureError {
    /// The classifier model couldn't be loaded.
    #[error("failed to load gesture model: {0}")]
    ModelLoad(String),

    /// The camera couldn't be opened, or access to it was denied.
    #[error("failed to access camera: {0}")]
    CameraAccess(String),

    /// The camera was opened but stopped delivering frames.
    #[error("failed to capture camera frame: {0}")]
    CameraFrame(String),
}

impl GestureError {
    /// A short message to show to the user.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::ModelLoad(_) => "Failed to load AI model.",
            Self::CameraAccess(_) => "Camera access denied.",
            Self::CameraFrame(_) => "Camera stopped sending frames.",
        }
    }
}
