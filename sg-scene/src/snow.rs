//! This module provides the falling snow.
//!
//! The snow is a fixed number of flakes, worked out from the width of the viewport. A flake that
//! falls out of the bottom of the viewport is recycled as a brand new flake just above the top.

use crate::rng;
use glam::Vec2;
use rand::{rngs::StdRng, Rng};
use serde::{Deserialize, Serialize};
use sg_frame::{Colour, DrawCommand, FrameLoop, FrameScheduler, Shape};
use sg_surface_trait::Surface;
use std::ops::Range;
use tracing::{debug, info, instrument, trace};

/// The config for the snow.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnowConfig {
    /// There is one flake for every this many pixels of viewport width.
    pub pixels_per_flake: u32,

    /// The range of flake radii.
    pub radius: Range<f32>,

    /// The range of how many pixels a flake falls each frame.
    pub speed: Range<f32>,

    /// The range of how many pixels the wind pushes a flake sideways each frame.
    pub drift: Range<f32>,

    /// The range of flake opacities.
    pub opacity: Range<f32>,

    /// Where recycled flakes start, above the top of the viewport.
    pub spawn_y: f32,

    /// The size of the gentle side to side wander as a flake falls.
    pub wander: f32,

    /// How quickly the wander changes as a flake falls.
    pub wander_frequency: f32,

    /// The blur of the glow around each flake.
    pub glow: f32,
}

impl Default for SnowConfig {
    fn default() -> Self {
        Self {
            pixels_per_flake: 3,
            radius: 1.0..4.0,
            speed: 1.0..3.0,
            drift: -0.25..0.25,
            opacity: 0.3..0.8,
            spawn_y: -10.,
            wander: 0.5,
            wander_frequency: 0.01,
            glow: 5.,
        }
    }
}

/// A single snowflake.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SnowFlake {
    /// The centre of the flake.
    pub position: Vec2,

    /// The radius of the flake.
    pub radius: f32,

    /// How far the flake falls each frame.
    pub speed: f32,

    /// How far the wind pushes the flake sideways each frame.
    pub drift: f32,

    /// How opaque the flake is.
    pub opacity: f32,
}

/// Pick a random value from the range. An empty or backwards range never panics: it gives values
/// between its two ends, or just `start` when they're equal.
fn sample<R: Rng>(range: &Range<f32>, rng: &mut R) -> f32 {
    range.start + rng.gen::<f32>() * (range.end - range.start)
}

impl SnowFlake {
    /// Create a random flake at the given height, anywhere across the width.
    fn random<R: Rng>(width: f32, y: f32, config: &SnowConfig, rng: &mut R) -> Self {
        Self {
            position: Vec2::new(rng.gen::<f32>() * width, y),
            radius: sample(&config.radius, rng),
            speed: sample(&config.speed, rng),
            drift: sample(&config.drift, rng),
            opacity: sample(&config.opacity, rng),
        }
    }

    /// The draw command for this flake.
    pub fn draw_command(&self, glow: f32) -> DrawCommand {
        DrawCommand::solid(
            Shape::Circle {
                centre: self.position,
                radius: self.radius,
            },
            Colour::WHITE.with_alpha(self.opacity),
        )
        .with_glow(glow, Colour::WHITE)
    }
}

/// All the snowflakes in the viewport.
#[derive(Clone, Debug, PartialEq)]
pub struct SnowField {
    /// The flakes. This never grows or shrinks.
    flakes: Box<[SnowFlake]>,

    /// The width of the viewport.
    width: f32,

    /// The height of the viewport.
    height: f32,

    /// The config for the snow.
    config: SnowConfig,
}

impl SnowField {
    /// Create a field of flakes scattered randomly over the whole viewport.
    pub fn new<R: Rng>(width: u32, height: u32, config: SnowConfig, rng: &mut R) -> Self {
        let count = (width / config.pixels_per_flake.max(1)) as usize;
        let (width, height) = (width as f32, height as f32);

        let flakes = (0..count)
            .map(|_| {
                let y = rng.gen::<f32>() * height;
                SnowFlake::random(width, y, &config, rng)
            })
            .collect();

        Self {
            flakes,
            width,
            height,
            config,
        }
    }

    /// The flakes.
    pub fn flakes(&self) -> &[SnowFlake] {
        &self.flakes
    }

    /// The number of flakes.
    pub fn len(&self) -> usize {
        self.flakes.len()
    }

    /// Is the field empty? It is when the viewport is narrower than one flake's worth.
    pub fn is_empty(&self) -> bool {
        self.flakes.is_empty()
    }

    /// Move every flake along by one frame, recycling any that fell out of the bottom. Returns
    /// the number of recycled flakes.
    pub fn step<R: Rng>(&mut self, rng: &mut R) -> usize {
        let mut recycled = 0;

        for flake in self.flakes.iter_mut() {
            flake.position.y += flake.speed;
            flake.position.x += flake.drift
                + (flake.position.y * self.config.wander_frequency).sin() * self.config.wander;

            if flake.position.y > self.height {
                *flake = SnowFlake::random(self.width, self.config.spawn_y, &self.config, rng);
                recycled += 1;
            }

            if flake.position.x > self.width {
                flake.position.x = 0.;
            } else if flake.position.x < 0. {
                flake.position.x = self.width;
            }
        }

        recycled
    }
}

/// The animated snow, painted onto its own surface.
#[derive(Debug)]
pub struct SnowLayer<S> {
    /// The surface to paint onto.
    surface: S,

    /// The config for the snow.
    config: SnowConfig,

    /// The flakes, if the layer has been mounted.
    field: Option<SnowField>,

    /// The loop that calls [`Self::on_frame`].
    frame_loop: FrameLoop,

    /// The RNG used for the flakes.
    rng: StdRng,

    /// Whether the layer is mounted.
    mounted: bool,
}

impl<S: Surface> SnowLayer<S> {
    /// Create a new snow layer. It won't paint anything until it's mounted.
    pub fn new(surface: S, config: SnowConfig) -> Self {
        Self {
            surface,
            config,
            field: None,
            frame_loop: FrameLoop::new(),
            rng: rng!(),
            mounted: false,
        }
    }

    /// Mount the layer to cover the given viewport and start the animation loop.
    ///
    /// If the surface isn't available, this does nothing.
    #[instrument(skip(self, scheduler))]
    pub fn mount(&mut self, scheduler: &mut FrameScheduler, width: u32, height: u32) {
        if !self.surface.is_available() {
            debug!("Snow surface unavailable, not mounting");
            return;
        }

        self.surface.resize(width, height);
        self.regenerate(width, height);
        self.frame_loop.start(scheduler);
        self.mounted = true;

        info!(flakes = self.field.as_ref().map_or(0, SnowField::len), "Mounted snow");
    }

    /// Resize the viewport. The flakes are regenerated from scratch if the size changed.
    #[instrument(skip(self))]
    pub fn resize(&mut self, width: u32, height: u32) {
        if !self.mounted || self.surface.size() == (width, height) {
            return;
        }

        self.surface.resize(width, height);
        self.regenerate(width, height);
    }

    /// Move and paint the next frame if the layer's frame callback is due. Returns true if a frame
    /// was painted.
    pub fn on_frame(&mut self, scheduler: &mut FrameScheduler) -> bool {
        if !self.frame_loop.poll(scheduler) {
            return false;
        }

        self.surface.clear();

        if let Some(field) = self.field.as_mut() {
            let recycled = field.step(&mut self.rng);
            if recycled > 0 {
                trace!(recycled, "Recycled snowflakes");
            }

            for flake in field.flakes() {
                self.surface.draw(&flake.draw_command(self.config.glow));
            }
        }

        true
    }

    /// Stop the animation loop and clear the surface.
    #[instrument(skip_all)]
    pub fn unmount(&mut self, scheduler: &mut FrameScheduler) {
        self.frame_loop.stop(scheduler);
        if self.mounted {
            self.surface.clear();
            info!("Unmounted snow");
        }
        self.mounted = false;
    }

    /// Is the layer mounted?
    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// The surface this layer paints onto.
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// The flakes, if the layer has ever been mounted.
    pub fn field(&self) -> Option<&SnowField> {
        self.field.as_ref()
    }

    fn regenerate(&mut self, width: u32, height: u32) {
        let field = SnowField::new(width, height, self.config.clone(), &mut self.rng);
        debug!(flakes = field.len(), "Generated snow");
        self.field = Some(field);
    }
}
