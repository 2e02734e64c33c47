//! This crate provides the [`Surface`] trait, along with a [`RecordingSurface`] for tests when
//! the `recording` feature is enabled.
//!
//! It's structured like this to avoid dependency cycles.

use sg_frame::DrawCommand;

#[cfg(feature = "recording")]
mod recording;

#[cfg(feature = "recording")]
pub use self::recording::{Recording, RecordingSurface};

/// The trait implemented by all 2D drawing surfaces.
///
/// Every layer clears its surface at the start of each frame and repaints from scratch, so a
/// surface never needs to remember anything between frames except its pixels.
pub trait Surface {
    /// Whether the surface can actually be drawn on. A layer whose surface is unavailable never
    /// starts its animation loop.
    fn is_available(&self) -> bool {
        true
    }

    /// The width and height of the surface in pixels.
    fn size(&self) -> (u32, u32);

    /// Resize the surface. This also clears it.
    fn resize(&mut self, width: u32, height: u32);

    /// Clear the whole surface to transparent.
    fn clear(&mut self);

    /// Paint a single draw command on top of everything already painted this frame.
    fn draw(&mut self, command: &DrawCommand);
}
