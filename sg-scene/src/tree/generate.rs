//! This module procedurally generates the particles of the tree.
//!
//! The tree is a cone with its apex at the top. For a given progress `p` down the tree, from `0`
//! at the apex to `1` at the base, each kind of particle has its own envelope radius. Angles
//! around the trunk are turned into an `x` offset with `cos` and a depth with `sin`, so particles
//! on the far side of the tree are painted first.

use super::{Particle, ParticleKind, TreeDimensions};
use glam::Vec2;
use rand::Rng;
use sg_frame::Colour;
use std::f32::consts::{PI, TAU};
use tracing::{debug, instrument};

/// How far the top of the trunk overlaps the bottom of the foliage.
const TRUNK_OVERLAP: f32 = 40.;

/// How far behind the centre the trunk is pushed, so the front needles cover it.
const TRUNK_DEPTH_OFFSET: f32 = 10.;

/// How much each foliage layer can be randomly moved up or down.
const LAYER_JITTER: f32 = 20.;

/// How far the tinsel sits in front of the foliage.
const TINSEL_POP: f32 = 5.;

/// How far the ornaments sit in front of the foliage.
const ORNAMENT_POP: f32 = 2.;

/// The progress above which no ornaments are placed, to keep the area around the star clear.
const ORNAMENT_MIN_PROGRESS: f32 = 0.1;

/// How far above the apex the star sits.
const STAR_LIFT: f32 = 5.;

/// The radius of a foliage layer at the given progress down the tree. Even the apex has a
/// non-zero radius.
pub(crate) fn foliage_radius(progress: f32, dims: &TreeDimensions) -> f32 {
    10. + progress * dims.base_width * 0.5
}

/// The radius of the tinsel spiral at the given progress.
fn tinsel_radius(progress: f32, dims: &TreeDimensions) -> f32 {
    15. + progress * dims.base_width * 0.55
}

/// The radius of the surface where the ornaments sit at the given progress.
fn ornament_radius(progress: f32, dims: &TreeDimensions) -> f32 {
    10. + progress * dims.base_width * 0.45
}

/// The largest radius a light can have at the given progress.
fn light_radius(progress: f32, dims: &TreeDimensions) -> f32 {
    5. + progress * dims.base_width * 0.5
}

/// The depth of the star, which is always in front of every other particle.
pub(crate) fn star_depth(dims: &TreeDimensions) -> f32 {
    [
        foliage_radius(1., dims),
        tinsel_radius(1., dims) + TINSEL_POP,
        ornament_radius(1., dims) + ORNAMENT_POP,
        light_radius(1., dims),
        dims.trunk_width / 2. - TRUNK_DEPTH_OFFSET,
    ]
    .into_iter()
    .fold(f32::MIN, f32::max)
        + 1.
}

/// The whole set of particles of the tree, sorted back to front.
///
/// This is allocated once when generated and never grows or shrinks.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParticleField {
    /// The particles in painting order.
    particles: Box<[Particle]>,
}

impl ParticleField {
    /// Generate a new tree centred in a canvas of the given width.
    #[instrument(skip(dims, rng))]
    pub fn generate<R: Rng>(canvas_width: u32, dims: &TreeDimensions, rng: &mut R) -> Self {
        let centre_x = canvas_width as f32 / 2.;
        let mut particles = Vec::with_capacity(dims.particle_count());

        push_trunk(&mut particles, centre_x, dims, rng);
        push_foliage(&mut particles, centre_x, dims, rng);
        push_tinsel(&mut particles, centre_x, dims);
        push_ornaments(&mut particles, centre_x, dims, rng);
        push_lights(&mut particles, centre_x, dims, rng);

        particles.push(Particle::new(
            ParticleKind::Star,
            Vec2::new(centre_x, dims.top - STAR_LIFT),
            star_depth(dims),
            Colour::rgb(0xff, 0xd7, 0x00),
            dims.star_size,
            0.,
        ));

        // This is stable, so particles at the same depth keep their generation order
        particles.sort_by(|a, b| a.z.total_cmp(&b.z));

        debug!(count = particles.len(), "Generated tree");

        Self {
            particles: particles.into_boxed_slice(),
        }
    }

    /// The particles in painting order.
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// The particles in painting order, mutably. The order itself can't be changed.
    pub(crate) fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    /// The number of particles.
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    /// Is the field empty? It only is before the first generation.
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// The number of particles of the given kind.
    pub fn count_of(&self, kind: ParticleKind) -> usize {
        self.particles.iter().filter(|p| p.kind == kind).count()
    }
}

/// Sample a point in a disk of the given radius, uniform over its area, and return its `x` offset
/// and depth.
fn sample_disk<R: Rng>(radius: f32, rng: &mut R) -> (f32, f32) {
    let angle = rng.gen::<f32>() * TAU;
    let r = rng.gen::<f32>().sqrt() * radius;
    (angle.cos() * r, angle.sin() * r)
}

fn push_trunk<R: Rng>(
    particles: &mut Vec<Particle>,
    centre_x: f32,
    dims: &TreeDimensions,
    rng: &mut R,
) {
    let start_y = dims.top + dims.height - TRUNK_OVERLAP;
    let dark_bark = Colour::rgb(0x2d, 0x1b, 0x13);
    let bark = Colour::rgb(0x3e, 0x27, 0x23);

    for _ in 0..dims.trunk_particles {
        let x = centre_x + (rng.gen::<f32>() - 0.5) * dims.trunk_width;
        let y = start_y + rng.gen::<f32>() * dims.trunk_height;
        let z = (rng.gen::<f32>() - 0.5) * dims.trunk_width - TRUNK_DEPTH_OFFSET;
        let colour = if rng.gen_bool(0.4) { dark_bark } else { bark };
        let size = rng.gen_range(5.0..9.0);

        particles.push(Particle::new(
            ParticleKind::TrunkBlock,
            Vec2::new(x, y),
            z,
            colour,
            size,
            0.02,
        ));
    }
}

fn push_foliage<R: Rng>(
    particles: &mut Vec<Particle>,
    centre_x: f32,
    dims: &TreeDimensions,
    rng: &mut R,
) {
    for layer in 0..dims.foliage_layers {
        let progress = layer as f32 / dims.foliage_layers as f32;
        let layer_y = dims.top + progress * dims.height;
        let radius = foliage_radius(progress, dims);
        let count = 50 + 40 * layer;

        for _ in 0..count {
            let (dx, z) = sample_disk(radius, rng);
            let y = layer_y + (rng.gen::<f32>() - 0.5) * LAYER_JITTER;

            let brightness: f32 = rng.gen_range(10.0..50.0);
            let green = brightness + 40. + rng.gen::<f32>() * 30.;
            let colour = Colour::rgb(
                brightness as u8,
                green as u8,
                (brightness + 10.) as u8,
            );

            let mut needle = Particle::new(
                ParticleKind::Needle,
                Vec2::new(centre_x + dx, y),
                z,
                colour,
                rng.gen_range(2.0..5.0),
                (1. - progress) + 0.5,
            );
            needle.rotation = Some(rng.gen::<f32>() * PI);
            particles.push(needle);
        }
    }
}

fn push_tinsel(particles: &mut Vec<Particle>, centre_x: f32, dims: &TreeDimensions) {
    let gold = Colour::rgb(0xff, 0xd7, 0x00);

    for i in 0..dims.tinsel_points {
        let progress = i as f32 / dims.tinsel_points as f32;
        let angle = progress * TAU * dims.tinsel_loops as f32;
        let radius = tinsel_radius(progress, dims);

        particles.push(Particle::new(
            ParticleKind::Tinsel,
            Vec2::new(
                centre_x + angle.cos() * radius,
                dims.top + 20. + progress * dims.height,
            ),
            angle.sin() * radius + TINSEL_POP,
            gold,
            1.5,
            (1. - progress) + 0.2,
        ));
    }
}

fn push_ornaments<R: Rng>(
    particles: &mut Vec<Particle>,
    centre_x: f32,
    dims: &TreeDimensions,
    rng: &mut R,
) {
    let deep_red = Colour::rgb(0xcc, 0x00, 0x00);

    for _ in 0..dims.ornaments {
        let progress = rng.gen_range(ORNAMENT_MIN_PROGRESS..1.0);
        let radius = ornament_radius(progress, dims);
        let angle = rng.gen::<f32>() * TAU;

        particles.push(Particle::new(
            ParticleKind::Ornament,
            Vec2::new(
                centre_x + angle.cos() * radius,
                dims.top + 20. + progress * dims.height,
            ),
            angle.sin() * radius + ORNAMENT_POP,
            deep_red,
            rng.gen_range(5.0..8.0),
            1. - progress,
        ));
    }
}

fn push_lights<R: Rng>(
    particles: &mut Vec<Particle>,
    centre_x: f32,
    dims: &TreeDimensions,
    rng: &mut R,
) {
    for _ in 0..dims.lights {
        let progress: f32 = rng.gen();
        let angle = rng.gen::<f32>() * TAU;
        // Anywhere inside the envelope, so some lights shine out from within the needles
        let radius = rng.gen::<f32>() * light_radius(progress, dims);

        let mut light = Particle::new(
            ParticleKind::Light,
            Vec2::new(
                centre_x + angle.cos() * radius,
                dims.top + 10. + progress * dims.height,
            ),
            angle.sin() * radius,
            Colour::WHITE,
            3.,
            1. - progress,
        );
        light.blink_offset = Some(rng.gen::<f32>() * 100.);
        particles.push(light);
    }
}
