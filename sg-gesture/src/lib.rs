//! This crate provides the [`GestureBridge`], which watches a camera for hand gestures and uses
//! them to switch the snow on and off.
//!
//! The camera and the gesture classifier are injected through the [`Camera`] and
//! [`ClassifierLoader`] traits. This crate provides [`ReplayLoader`] and [`SyntheticCamera`] to run
//! without any hardware, and a real webcam behind the `nokhwa` feature.

mod bridge;
mod capability;
mod capture;
mod error;
mod replay;
mod skeleton;
mod types;

#[cfg(feature = "nokhwa")]
mod nokhwa_camera;

pub use self::{
    bridge::{confident_gesture, snow_toggle, BridgeState, GestureBridge, GestureConfig},
    capability::{Camera, CaptureRequest, Classifier, ClassifierLoader, Facing, VideoStream},
    error::GestureError,
    replay::{ReplayClassifier, ReplayLoader, SyntheticCamera},
    skeleton::{draw_skeleton, skeleton_colour, HAND_CONNECTIONS},
    types::{Category, GestureLabel, GestureResult, Landmark, VideoFrame, LANDMARK_COUNT},
};

#[cfg(feature = "nokhwa")]
pub use self::nokhwa_camera::NokhwaCamera;
