//! This module provides the [`Scene`], which hosts the tree and the snow.

use crate::{
    settings::Settings,
    snow::{SnowConfig, SnowLayer},
    tree::{TreeDimensions, TreeLayer},
};
use serde::{Deserialize, Serialize};
use sg_frame::FrameScheduler;
use sg_surface_trait::Surface;
use tracing::{debug, info, instrument};

/// The size of the whole viewport in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Viewport {
    /// The width.
    pub width: u32,

    /// The height.
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 800,
        }
    }
}

/// The config for every layer in the scene.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// The shape of the tree.
    pub tree: TreeDimensions,

    /// The snow.
    pub snow: SnowConfig,
}

/// The whole animated scene: a tree with snow falling in front of it.
///
/// The scene owns the [`Settings`] and passes them down to its layers every frame. The snow layer
/// is mounted and unmounted to follow [`Settings::snow_enabled`].
#[derive(Debug)]
pub struct Scene<S> {
    /// The current settings.
    settings: Settings,

    /// The size of the viewport.
    viewport: Viewport,

    /// The tree.
    tree: TreeLayer<S>,

    /// The snow.
    snow: SnowLayer<S>,

    /// Whether the scene is mounted.
    mounted: bool,
}

impl<S: Surface> Scene<S> {
    /// Create a new scene. It won't paint anything until it's mounted.
    pub fn new(tree_surface: S, snow_surface: S, config: SceneConfig, settings: Settings) -> Self {
        Self {
            settings,
            viewport: Viewport::default(),
            tree: TreeLayer::new(tree_surface, config.tree),
            snow: SnowLayer::new(snow_surface, config.snow),
            mounted: false,
        }
    }

    /// Mount the scene into the given viewport.
    #[instrument(skip(self, scheduler))]
    pub fn mount(&mut self, scheduler: &mut FrameScheduler, viewport: Viewport) {
        self.viewport = viewport;
        self.tree.mount(scheduler, self.tree_width());
        if self.settings.snow_enabled {
            self.snow.mount(scheduler, viewport.width, viewport.height);
        }
        self.mounted = true;

        info!(?viewport, "Mounted scene");
    }

    /// Resize the viewport.
    #[instrument(skip(self))]
    pub fn resize(&mut self, viewport: Viewport) {
        if viewport == self.viewport {
            return;
        }

        self.viewport = viewport;
        self.tree.resize(self.tree_width());
        self.snow.resize(viewport.width, viewport.height);
    }

    /// Run every layer whose frame callback is due, after bringing the snow in line with the
    /// settings.
    pub fn run_frame(&mut self, scheduler: &mut FrameScheduler) {
        if !self.mounted {
            return;
        }

        self.tree.on_frame(scheduler, &self.settings);
        self.sync_snow(scheduler);
        self.snow.on_frame(scheduler);
    }

    /// Unmount every layer. Nothing more will be painted.
    #[instrument(skip_all)]
    pub fn unmount(&mut self, scheduler: &mut FrameScheduler) {
        self.tree.unmount(scheduler);
        self.snow.unmount(scheduler);
        self.mounted = false;

        info!("Unmounted scene");
    }

    /// The current settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The current settings, mutably. Changes are picked up on the next frame.
    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// The viewport.
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// The tree layer.
    pub fn tree(&self) -> &TreeLayer<S> {
        &self.tree
    }

    /// The snow layer.
    pub fn snow(&self) -> &SnowLayer<S> {
        &self.snow
    }

    /// The width of the tree's canvas, which is never wider than its maximum.
    fn tree_width(&self) -> u32 {
        self.viewport
            .width
            .min(self.tree.dimensions().max_canvas_width)
    }

    /// Mount or unmount the snow to match the settings.
    fn sync_snow(&mut self, scheduler: &mut FrameScheduler) {
        match (self.settings.snow_enabled, self.snow.is_mounted()) {
            (true, false) => {
                debug!("Snow switched on");
                self.snow
                    .mount(scheduler, self.viewport.width, self.viewport.height);
            }
            (false, true) => {
                debug!("Snow switched off");
                self.snow.unmount(scheduler);
            }
            _ => {}
        }
    }
}
