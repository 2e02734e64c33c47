//! This module provides the particle Christmas tree.
//!
//! The particles are generated once per canvas size by [`ParticleField::generate`]. Every frame
//! the [`TreeLayer`] clears its surface, sways every particle with a single shared gust of wind,
//! and paints them back to front.

mod config;
mod draw;
mod generate;
mod particle;

pub use self::{
    config::TreeDimensions,
    draw::{draw_particle, light_colour},
    generate::ParticleField,
    particle::{Particle, ParticleKind},
};

use crate::{rng, settings::Settings};
use rand::rngs::StdRng;
use sg_frame::{FrameLoop, FrameScheduler};
use sg_surface_trait::Surface;
use tracing::{debug, info, instrument, trace};

/// The animated tree, painted onto its own surface.
#[derive(Debug)]
pub struct TreeLayer<S> {
    /// The surface to paint onto.
    surface: S,

    /// The shape of the tree.
    dimensions: TreeDimensions,

    /// The particles, in painting order.
    field: ParticleField,

    /// The animation time, which drives the wind, blinking, and shimmer.
    time: f32,

    /// The loop that calls [`Self::on_frame`].
    frame_loop: FrameLoop,

    /// The RNG used to generate the particles.
    rng: StdRng,

    /// Whether the layer is mounted.
    mounted: bool,
}

impl<S: Surface> TreeLayer<S> {
    /// Create a new tree layer. It won't paint anything until it's mounted.
    pub fn new(surface: S, dimensions: TreeDimensions) -> Self {
        Self {
            surface,
            dimensions,
            field: ParticleField::default(),
            time: 0.,
            frame_loop: FrameLoop::new(),
            rng: rng!(),
            mounted: false,
        }
    }

    /// Mount the layer with the given canvas width. This generates the particles and starts the
    /// animation loop.
    ///
    /// If the surface isn't available, this does nothing.
    #[instrument(skip(self, scheduler))]
    pub fn mount(&mut self, scheduler: &mut FrameScheduler, width: u32) {
        if !self.surface.is_available() {
            debug!("Tree surface unavailable, not mounting");
            return;
        }

        self.surface.resize(width, self.dimensions.canvas_height);
        self.regenerate(width);
        self.frame_loop.start(scheduler);
        self.mounted = true;

        info!(particles = self.field.len(), "Mounted tree");
    }

    /// Resize the canvas. The particles are regenerated from scratch if the size changed.
    #[instrument(skip(self))]
    pub fn resize(&mut self, width: u32) {
        if !self.mounted {
            return;
        }

        let size = (width, self.dimensions.canvas_height);
        if self.surface.size() == size {
            trace!("Tree size unchanged");
            return;
        }

        self.surface.resize(size.0, size.1);
        self.regenerate(width);
    }

    /// Paint the next frame if the layer's frame callback is due. Returns true if a frame was
    /// painted.
    pub fn on_frame(&mut self, scheduler: &mut FrameScheduler, settings: &Settings) -> bool {
        if !self.frame_loop.poll(scheduler) {
            return false;
        }

        self.paint(settings);
        true
    }

    /// Stop the animation loop. Nothing more will be painted until the layer is mounted again.
    #[instrument(skip_all)]
    pub fn unmount(&mut self, scheduler: &mut FrameScheduler) {
        self.frame_loop.stop(scheduler);
        if self.mounted {
            self.surface.clear();
            info!("Unmounted tree");
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

    /// The shape of the tree.
    pub fn dimensions(&self) -> &TreeDimensions {
        &self.dimensions
    }

    /// The particles, in painting order.
    pub fn field(&self) -> &ParticleField {
        &self.field
    }

    /// The current animation time.
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Throw away all the particles and generate new ones.
    fn regenerate(&mut self, width: u32) {
        self.field = ParticleField::generate(width, &self.dimensions, &mut self.rng);
    }

    /// Clear the surface and paint every particle in order.
    fn paint(&mut self, settings: &Settings) {
        self.surface.clear();

        self.time += self.dimensions.time_step;
        let wind = self.time.sin() * self.dimensions.wind_strength;

        for (index, particle) in self.field.particles_mut().iter_mut().enumerate() {
            particle.apply_wind(wind);
            if let Some(command) = draw_particle(particle, index, self.time, settings) {
                self.surface.draw(&command);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;
    use sg_frame::Shape;
    use sg_surface_trait::RecordingSurface;
    use std::time::Duration;

    const REFRESH: Duration = Duration::from_millis(16);

    fn mounted_tree(width: u32) -> (TreeLayer<RecordingSurface>, RecordingSurface, FrameScheduler) {
        let surface = RecordingSurface::new(0, 0);
        let mut tree = TreeLayer::new(surface.clone(), TreeDimensions::default());
        let mut scheduler = FrameScheduler::new();
        tree.mount(&mut scheduler, width);
        (tree, surface, scheduler)
    }

    fn is_light(command: &sg_frame::DrawCommand) -> bool {
        matches!(command.shape, Shape::Circle { radius, .. } if radius == 3.)
            && command.glow.map(|glow| glow.blur) == Some(8.)
    }

    #[test]
    fn mount_test() {
        let (tree, surface, scheduler) = mounted_tree(640);

        assert!(tree.is_mounted());
        assert_eq!(surface.recording().width, 640);
        assert_eq!(surface.recording().height, 750);
        assert_eq!(tree.field().len(), TreeDimensions::default().particle_count());
        assert_eq!(scheduler.pending_callbacks(), 1);
    }

    #[test]
    fn unavailable_surface_never_starts_test() {
        let surface = RecordingSurface::unavailable(640, 750);
        let mut tree = TreeLayer::new(surface.clone(), TreeDimensions::default());
        let mut scheduler = FrameScheduler::new();
        tree.mount(&mut scheduler, 640);

        assert!(!tree.is_mounted());
        assert!(tree.field().is_empty());
        assert_eq!(scheduler.pending_callbacks(), 0);

        for _ in 0..3 {
            scheduler.begin_frame(REFRESH);
            assert!(!tree.on_frame(&mut scheduler, &Settings::default()));
        }
        assert_eq!(surface.draw_count(), 0);
    }

    #[test]
    fn cleared_every_frame_test() {
        let (mut tree, surface, mut scheduler) = mounted_tree(640);
        let settings = Settings {
            lights_on: false,
            ..Settings::default()
        };

        for _ in 0..4 {
            scheduler.begin_frame(REFRESH);
            assert!(tree.on_frame(&mut scheduler, &settings));
        }

        let recording = surface.recording();
        assert_eq!(recording.clears, 4);
        assert!(approx_eq!(f32, tree.time(), 0.04, epsilon = 1e-6));

        // Everything except the lights is painted every frame, and the same amount each time
        let expected = tree.field().len() - tree.field().count_of(ParticleKind::Light);
        assert!(recording.frames.iter().all(|frame| frame.len() == expected));
        assert!(recording.frames.iter().flatten().all(|command| !is_light(command)));
    }

    #[test]
    fn wind_sways_particles_test() {
        let (mut tree, _surface, mut scheduler) = mounted_tree(640);

        scheduler.begin_frame(REFRESH);
        tree.on_frame(&mut scheduler, &Settings::default());

        let wind = 0.01_f32.sin() * 3.;
        for particle in tree.field().particles() {
            let expected = particle.base.x + wind * particle.sway;
            assert!(approx_eq!(f32, particle.x, expected, epsilon = 1e-3));
        }
    }

    #[test]
    fn no_draws_after_unmount_test() {
        let (mut tree, surface, mut scheduler) = mounted_tree(640);
        let settings = Settings::default();

        for _ in 0..3 {
            scheduler.begin_frame(REFRESH);
            tree.on_frame(&mut scheduler, &settings);
        }
        tree.unmount(&mut scheduler);

        let invocations = scheduler.invocations();
        let draws = surface.draw_count();
        assert_eq!(scheduler.pending_callbacks(), 0);

        for _ in 0..5 {
            scheduler.begin_frame(REFRESH);
            assert!(!tree.on_frame(&mut scheduler, &settings));
        }

        assert_eq!(scheduler.invocations(), invocations);
        assert_eq!(surface.draw_count(), draws);
    }

    #[test]
    fn resize_regenerates_only_on_change_test() {
        let (mut tree, surface, _scheduler) = mounted_tree(640);
        let before = tree.field().clone();

        tree.resize(640);
        assert_eq!(*tree.field(), before);
        assert_eq!(surface.recording().resizes, 1);

        tree.resize(480);
        assert_ne!(*tree.field(), before);
        assert_eq!(surface.recording().resizes, 2);

        let star = tree.field().particles().last().unwrap();
        assert_eq!(star.kind, ParticleKind::Star);
        assert!(approx_eq!(f32, star.base.x, 240., ulps = 2));
    }
}
