//! This module draws the hand skeleton overlay.

use crate::{GestureLabel, Landmark, LANDMARK_COUNT};
use glam::Vec2;
use sg_frame::{Colour, DrawCommand, Shape};
use sg_surface_trait::Surface;

/// The pairs of landmarks that are joined by a bone.
pub const HAND_CONNECTIONS: [(usize, usize); 23] = [
    // Thumb
    (0, 1),
    (1, 2),
    (2, 3),
    (3, 4),
    // Index
    (0, 5),
    (5, 6),
    (6, 7),
    (7, 8),
    // Middle
    (0, 9),
    (9, 10),
    (10, 11),
    (11, 12),
    // Ring
    (0, 13),
    (13, 14),
    (14, 15),
    (15, 16),
    // Pinky
    (0, 17),
    (17, 18),
    (18, 19),
    (19, 20),
    // Palm
    (5, 9),
    (9, 13),
    (13, 17),
];

/// The width of each bone.
const BONE_WIDTH: f32 = 2.;

/// The radius of each joint.
const JOINT_RADIUS: f32 = 3.;

/// The colour to draw the skeleton for the given gesture.
pub fn skeleton_colour(label: &GestureLabel) -> Colour {
    match label {
        GestureLabel::OpenPalm => Colour::rgb(0x4a, 0xde, 0x80),
        GestureLabel::ClosedFist => Colour::rgb(0xf8, 0x71, 0x71),
        _ => Colour::rgba(255, 255, 255, 0.8),
    }
}

/// Clear the surface and draw the skeleton of a hand on it, scaled to fill the surface.
///
/// If `mirror` is true, the skeleton is flipped horizontally so it moves like a mirror image.
pub fn draw_skeleton<S: Surface>(
    surface: &mut S,
    landmarks: &[Landmark; LANDMARK_COUNT],
    colour: Colour,
    mirror: bool,
) {
    let (width, height) = surface.size();
    let to_pixels = |landmark: &Landmark| {
        let x = if mirror { 1. - landmark.x } else { landmark.x };
        Vec2::new(x * width as f32, landmark.y * height as f32)
    };

    surface.clear();

    for (start, end) in HAND_CONNECTIONS {
        surface.draw(&DrawCommand::solid(
            Shape::Line {
                from: to_pixels(&landmarks[start]),
                to: to_pixels(&landmarks[end]),
                width: BONE_WIDTH,
            },
            colour,
        ));
    }

    for landmark in landmarks {
        surface.draw(&DrawCommand::solid(
            Shape::Circle {
                centre: to_pixels(landmark),
                radius: JOINT_RADIUS,
            },
            colour,
        ));
    }
}
