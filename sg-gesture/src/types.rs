//! This module provides the data that flows between the camera, the classifier, and the bridge.

use image::RgbImage;
use serde::{Deserialize, Serialize};
use strum::EnumString;

/// The number of landmarks on a hand.
pub const LANDMARK_COUNT: usize = 21;

/// A single landmark on a hand, in coordinates normalised to the video frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    /// The horizontal position, from 0 at the left to 1 at the right.
    pub x: f32,

    /// The vertical position, from 0 at the top to 1 at the bottom.
    pub y: f32,

    /// The depth relative to the wrist. Smaller is nearer the camera.
    #[serde(default)]
    pub z: f32,
}

/// The gestures that a classifier can recognise.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, EnumString)]
pub enum GestureLabel {
    #[default]
    #[strum(serialize = "None")]
    NoGesture,

    #[strum(serialize = "Closed_Fist")]
    ClosedFist,

    #[strum(serialize = "Open_Palm")]
    OpenPalm,

    #[strum(serialize = "Pointing_Up")]
    PointingUp,

    #[strum(serialize = "Thumb_Down")]
    ThumbDown,

    #[strum(serialize = "Thumb_Up")]
    ThumbUp,

    #[strum(serialize = "Victory")]
    Victory,

    #[strum(serialize = "ILoveYou")]
    ILoveYou,

    /// Anything else the classifier reports.
    #[strum(default)]
    Other(String),
}

/// A gesture reported by a classifier, with its confidence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Category {
    /// The name of the gesture, as the classifier reports it.
    pub category_name: String,

    /// The confidence, in [0, 1].
    pub score: f32,
}

impl Category {
    /// Create a new category.
    pub fn new(category_name: impl Into<String>, score: f32) -> Self {
        Self {
            category_name: category_name.into(),
            score,
        }
    }

    /// The recognised gesture.
    pub fn label(&self) -> GestureLabel {
        // Unknown names parse to `GestureLabel::Other`, so this never fails
        self.category_name
            .parse()
            .unwrap_or_else(|_| GestureLabel::Other(self.category_name.clone()))
    }
}

/// What a classifier found in one video frame: a single hand and its top gesture, if any.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GestureResult {
    /// The landmarks of the hand.
    pub landmarks: [Landmark; LANDMARK_COUNT],

    /// The most likely gesture.
    pub gesture: Option<Category>,
}

/// A single frame of video.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoFrame {
    /// The pixels of the frame.
    pub image: RgbImage,
}
