//! This module provides [`TreeDimensions`], the shape and population of the tree.

use serde::{Deserialize, Serialize};

/// The dimensions of the tree and how many of each particle it has.
///
/// All lengths are in canvas pixels, with `y` growing downwards from the top of the canvas.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeDimensions {
    /// The height of the tree's canvas.
    pub canvas_height: u32,

    /// The widest the tree's canvas can be. A wider viewport just leaves space either side.
    pub max_canvas_width: u32,

    /// The height of the foliage, from the apex to the lowest layer.
    pub height: f32,

    /// The width of the foliage at its base.
    pub base_width: f32,

    /// The `y` coordinate of the apex of the foliage.
    pub top: f32,

    /// The number of foliage layers.
    pub foliage_layers: u32,

    /// The number of trunk particles.
    pub trunk_particles: u32,

    /// The height of the trunk.
    pub trunk_height: f32,

    /// The width (and depth) of the trunk.
    pub trunk_width: f32,

    /// The number of beads in the tinsel garland.
    pub tinsel_points: u32,

    /// How many times the tinsel garland winds around the tree.
    pub tinsel_loops: u32,

    /// The number of ornaments.
    pub ornaments: u32,

    /// The number of lights.
    pub lights: u32,

    /// The outer radius of the star on top.
    pub star_size: f32,

    /// How much animation time passes each frame.
    pub time_step: f32,

    /// The largest horizontal displacement caused by the wind, before scaling by each particle's
    /// sway.
    pub wind_strength: f32,
}

impl Default for TreeDimensions {
    fn default() -> Self {
        Self {
            canvas_height: 750,
            max_canvas_width: 896,
            height: 550.,
            base_width: 320.,
            top: 80.,
            foliage_layers: 24,
            trunk_particles: 300,
            trunk_height: 80.,
            trunk_width: 40.,
            tinsel_points: 600,
            tinsel_loops: 6,
            ornaments: 45,
            lights: 80,
            star_size: 25.,
            time_step: 0.01,
            wind_strength: 3.,
        }
    }
}

impl TreeDimensions {
    /// The total number of foliage needles across all the layers.
    pub fn needle_count(&self) -> usize {
        (0..self.foliage_layers)
            .map(|layer| 50 + 40 * layer as usize)
            .sum()
    }

    /// The total number of particles in a generated tree.
    pub fn particle_count(&self) -> usize {
        self.trunk_particles as usize
            + self.needle_count()
            + self.tinsel_points as usize
            + self.ornaments as usize
            + self.lights as usize
            + 1
    }
}
