//! This module provides the [`Particle`] type.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use sg_frame::Colour;
use strum::{Display, EnumIter};

/// What a particle is, which decides how it gets painted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, Display)]
pub enum ParticleKind {
    /// A pine needle, painted as a short diagonal stroke.
    Needle,

    /// A block of bark, painted as a small rectangle.
    TrunkBlock,

    /// A bead of gold tinsel which shimmers over time.
    Tinsel,

    /// A red bauble with a highlight.
    Ornament,

    /// A blinking light.
    Light,

    /// The star on top of the tree.
    Star,
}

/// A single particle of the tree.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    /// What this particle is.
    pub kind: ParticleKind,

    /// Where the particle sits when there's no wind.
    pub base: Vec2,

    /// The current horizontal position, which moves with the wind.
    pub x: f32,

    /// The depth, used only for painting order. Bigger is nearer the viewer.
    pub z: f32,

    /// The base colour. Some kinds ignore this and work out their colour every frame.
    pub colour: Colour,

    /// The size of the particle. What this means depends on the kind.
    pub size: f32,

    /// A random rotation. Only needles have this.
    pub rotation: Option<f32>,

    /// The phase of this light's blinking. Only lights have this.
    pub blink_offset: Option<f32>,

    /// How strongly the wind moves this particle.
    pub sway: f32,
}

impl Particle {
    /// Create a particle at rest at the given base position.
    pub(crate) fn new(
        kind: ParticleKind,
        base: Vec2,
        z: f32,
        colour: Colour,
        size: f32,
        sway: f32,
    ) -> Self {
        Self {
            kind,
            base,
            x: base.x,
            z,
            colour,
            size,
            rotation: None,
            blink_offset: None,
            sway,
        }
    }

    /// The vertical position. This never changes after generation.
    #[inline]
    pub fn y(&self) -> f32 {
        self.base.y
    }

    /// The current position.
    #[inline]
    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.base.y)
    }

    /// Move the particle horizontally from its base position by the wind, scaled by its sway.
    #[inline]
    pub fn apply_wind(&mut self, wind: f32) {
        self.x = self.base.x + wind * self.sway;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;

    #[test]
    fn apply_wind_test() {
        let mut particle = Particle::new(
            ParticleKind::Tinsel,
            Vec2::new(100., 200.),
            0.,
            Colour::WHITE,
            1.5,
            0.5,
        );

        particle.apply_wind(3.);
        assert!(approx_eq!(f32, particle.x, 101.5, ulps = 2));

        // Wind never accumulates
        particle.apply_wind(3.);
        assert!(approx_eq!(f32, particle.x, 101.5, ulps = 2));

        particle.apply_wind(-2.);
        assert!(approx_eq!(f32, particle.x, 99., ulps = 2));
        assert_eq!(particle.y(), 200.);
    }
}
