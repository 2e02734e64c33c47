//! This crate provides the building blocks for a single painted frame, along with the scheduler
//! which decides when the next frame gets painted.
//!
//! For all drawing maths, `x` grows to the right and `y` grows downwards, like a 2D canvas.

mod colour;
mod draw;
pub mod schedule;

pub use self::{
    colour::{Colour, RGBArray},
    draw::{star_vertices, DrawCommand, Fill, Glow, GradientStop, RadialGradient, Shape},
    schedule::{FrameHandle, FrameLoop, FrameScheduler},
};
