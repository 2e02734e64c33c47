//! This crate provides a very simple [`DebugSurface`] to test things with.

use sg_frame::DrawCommand;
use sg_surface_trait::Surface;
use tracing::{debug, instrument, trace};

/// A simple debug surface that paints nothing and just logs all its input with tracing.
///
/// Every draw call is logged at the trace level, and every clear logs how many draw calls the
/// previous frame had at the debug level.
#[derive(Debug)]
pub struct DebugSurface {
    /// The width of the surface.
    width: u32,

    /// The height of the surface.
    height: u32,

    /// The number of draw calls since the last clear.
    draws: usize,
}

impl DebugSurface {
    /// Create a new debug surface with the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            draws: 0,
        }
    }
}

impl Surface for DebugSurface {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[instrument(skip(self))]
    fn resize(&mut self, width: u32, height: u32) {
        debug!(old = ?(self.width, self.height), "Resizing debug surface");
        self.width = width;
        self.height = height;
        self.draws = 0;
    }

    fn clear(&mut self) {
        debug!(draws = self.draws, "Clearing debug surface");
        self.draws = 0;
    }

    fn draw(&mut self, command: &DrawCommand) {
        trace!(?command);
        self.draws += 1;
    }
}
