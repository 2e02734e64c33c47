//! This module provides [`RecordingSurface`], which records every draw call for tests to inspect.

use crate::Surface;
use sg_frame::DrawCommand;
use std::{cell::RefCell, rc::Rc};

/// Everything a [`RecordingSurface`] has been asked to do.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Recording {
    /// The width of the surface.
    pub width: u32,

    /// The height of the surface.
    pub height: u32,

    /// Whether the surface reports itself as available.
    pub available: bool,

    /// The draw calls between each clear. A new frame is started by every clear.
    pub frames: Vec<Vec<DrawCommand>>,

    /// The number of times the surface has been cleared.
    pub clears: usize,

    /// The number of times the surface has been resized.
    pub resizes: usize,
}

/// A surface that paints nothing but records every call.
///
/// Clones share the same recording, so a test can keep one clone and hand the other to a layer.
#[derive(Clone, Debug)]
pub struct RecordingSurface {
    /// The shared recording.
    inner: Rc<RefCell<Recording>>,
}

impl RecordingSurface {
    /// Create an available surface of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Recording {
                width,
                height,
                available: true,
                ..Recording::default()
            })),
        }
    }

    /// Create a surface which reports itself as unavailable.
    pub fn unavailable(width: u32, height: u32) -> Self {
        let surface = Self::new(width, height);
        surface.inner.borrow_mut().available = false;
        surface
    }

    /// Take a copy of the whole recording.
    pub fn recording(&self) -> Recording {
        self.inner.borrow().clone()
    }

    /// The draw calls of the most recent frame.
    pub fn last_frame(&self) -> Vec<DrawCommand> {
        self.inner.borrow().frames.last().cloned().unwrap_or_default()
    }

    /// The number of frames that have been started by a clear.
    pub fn frame_count(&self) -> usize {
        self.inner.borrow().frames.len()
    }

    /// The total number of draw calls across all frames.
    pub fn draw_count(&self) -> usize {
        self.inner.borrow().frames.iter().map(Vec::len).sum()
    }
}

impl Surface for RecordingSurface {
    fn is_available(&self) -> bool {
        self.inner.borrow().available
    }

    fn size(&self) -> (u32, u32) {
        let recording = self.inner.borrow();
        (recording.width, recording.height)
    }

    fn resize(&mut self, width: u32, height: u32) {
        let mut recording = self.inner.borrow_mut();
        recording.width = width;
        recording.height = height;
        recording.resizes += 1;
    }

    fn clear(&mut self) {
        let mut recording = self.inner.borrow_mut();
        recording.clears += 1;
        recording.frames.push(Vec::new());
    }

    fn draw(&mut self, command: &DrawCommand) {
        let mut recording = self.inner.borrow_mut();
        if recording.frames.is_empty() {
            recording.frames.push(Vec::new());
        }
        if let Some(frame) = recording.frames.last_mut() {
            frame.push(*command);
        }
    }
}
