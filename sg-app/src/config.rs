//! This module handles the config file for the binary.

use serde::{Deserialize, Serialize};
use sg_frame::Colour;
use sg_gesture::GestureConfig;
use sg_scene::{SceneConfig, Settings, Viewport};
use std::{fs, path::Path, path::PathBuf};
use tracing::{debug, instrument, warn};

/// The surfaces to paint the scene onto.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SurfaceKind {
    /// Rasterise every layer and composite them into PNG frames.
    #[default]
    Raster,

    /// Paint nothing and just log every draw call.
    Debug,
}

/// Where the gesture bridge gets its video from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CameraSource {
    /// Blank frames with an advancing clock. Only useful with a replayed classifier.
    #[default]
    Synthetic,

    /// A real webcam. Needs the `webcam` feature.
    Webcam {
        /// The index of the camera.
        index: u32,
    },
}

/// The config for the gesture bridge.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GestureSetup {
    /// A RON file of recorded classifier results, played back one per video frame.
    pub script: PathBuf,

    /// Where the video comes from.
    #[serde(default)]
    pub camera: CameraSource,

    /// The config for the bridge itself.
    #[serde(default)]
    pub bridge: GestureConfig,
}

/// The whole config for the binary.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// The size of the viewport.
    pub viewport: Viewport,

    /// The number of frames to render. If this is `None`, then render until Ctrl-C.
    pub frames: Option<u32>,

    /// The number of frames per second.
    pub fps: u32,

    /// Whether to wait between frames to run at `fps` in real time.
    pub realtime: bool,

    /// The surfaces to paint onto.
    pub surface: SurfaceKind,

    /// The directory to save PNG frames into. Only used with [`SurfaceKind::Raster`].
    pub output_dir: Option<PathBuf>,

    /// The colour behind everything.
    pub background: Colour,

    /// The settings that the scene starts with.
    pub settings: Settings,

    /// The config for the tree and the snow.
    pub scene: SceneConfig,

    /// The gesture bridge, if it should run at all.
    pub gesture: Option<GestureSetup>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            frames: Some(300),
            fps: 60,
            realtime: false,
            surface: SurfaceKind::Raster,
            output_dir: Some(PathBuf::from("frames")),
            background: Colour::rgb(0x0b, 0x10, 0x26),
            settings: Settings::default(),
            scene: SceneConfig::default(),
            gesture: None,
        }
    }
}

impl AppConfig {
    /// Load the config from the given file, or use the default if the file is missing or
    /// invalid. The default is also saved to the file for future editing.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();

        let write_and_return_default = || -> Self {
            let default = Self::default();
            default.save_to_file(path);
            default
        };

        let Ok(text) = fs::read_to_string(path) else {
            debug!("No config file, using the default");
            return write_and_return_default();
        };

        ron::from_str(&text).unwrap_or_else(|error| {
            warn!(%error, "Invalid config file, replacing it with the default");
            write_and_return_default()
        })
    }

    /// Save the config to the given file.
    pub fn save_to_file(&self, path: impl AsRef<Path>) {
        let text = match ron::ser::to_string_pretty(
            self,
            ron::ser::PrettyConfig::default().struct_names(true),
        ) {
            Ok(text) => text,
            Err(error) => {
                warn!(%error, "Unable to serialize config");
                return;
            }
        };

        if let Err(error) = fs::write(path.as_ref(), text) {
            warn!(%error, path = %path.as_ref().display(), "Unable to save config");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("snowglobe-config-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir.join(name)
    }

    #[test]
    fn missing_file_writes_default_test() {
        let path = temp_path("missing.ron");
        let _ = fs::remove_file(&path);

        assert_eq!(AppConfig::from_file(&path), AppConfig::default());
        assert!(path.exists());
        assert_eq!(AppConfig::from_file(&path), AppConfig::default());
    }

    #[test]
    fn invalid_file_is_replaced_test() {
        let path = temp_path("invalid.ron");
        fs::write(&path, "this is not ron").unwrap();

        assert_eq!(AppConfig::from_file(&path), AppConfig::default());
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("AppConfig("));
    }

    #[test]
    fn partial_file_test() {
        let path = temp_path("partial.ron");
        fs::write(
            &path,
            r#"(
                frames: None,
                realtime: true,
                surface: Debug,
                gesture: Some((script: "gestures.ron", camera: Webcam(index: 2))),
            )"#,
        )
        .unwrap();

        let config = AppConfig::from_file(&path);
        assert_eq!(config.frames, None);
        assert!(config.realtime);
        assert_eq!(config.surface, SurfaceKind::Debug);
        assert_eq!(config.fps, 60);

        let gesture = config.gesture.unwrap();
        assert_eq!(gesture.script, PathBuf::from("gestures.ron"));
        assert_eq!(gesture.camera, CameraSource::Webcam { index: 2 });
        assert_eq!(gesture.bridge, GestureConfig::default());
    }

    #[test]
    fn serialized_names_test() {
        insta::assert_ron_snapshot!(SurfaceKind::default(), @"Raster");
        insta::assert_ron_snapshot!(CameraSource::default(), @"Synthetic");
    }
}
