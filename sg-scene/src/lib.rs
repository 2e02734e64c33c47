//! This crate provides the animated layers of the scene: a particle Christmas tree and a field of
//! falling snow, along with the [`Scene`] which mounts them and drives them every frame.
//!
//! Every layer paints onto its own [`Surface`](sg_surface_trait::Surface) and is driven by a
//! [`FrameLoop`](sg_frame::FrameLoop) on a host-owned [`FrameScheduler`](sg_frame::FrameScheduler).

/// Create a `rand::rngs::StdRng` from entropy in a normal build, or seeded from 12345 in a test
/// build.
macro_rules! rng {
    () => {{
        use ::rand::{rngs::StdRng, SeedableRng};

        cfg_if::cfg_if! {
            if #[cfg(test)] {
                StdRng::seed_from_u64(12345)
            } else {
                StdRng::from_entropy()
            }
        }
    }};
}

pub(crate) use rng;

pub mod scene;
pub mod settings;
pub mod snow;
pub mod tree;

pub use self::{
    scene::{Scene, SceneConfig, Viewport},
    settings::{ColourMode, Settings},
    snow::{SnowConfig, SnowField, SnowFlake, SnowLayer},
    tree::{Particle, ParticleField, ParticleKind, TreeDimensions, TreeLayer},
};
