//! This module provides the [`Settings`] that the user (or a hand gesture) can change while the
//! scene is running.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator};

/// How the lights on the tree are coloured.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, Display,
)]
pub enum ColourMode {
    /// Every light is the same warm white.
    #[strum(serialize = "Warm white")]
    WarmWhite,

    /// The lights cycle through red, green, yellow, and blue.
    #[default]
    #[strum(serialize = "Multicolour")]
    MultiColour,

    /// Every light is the same icy blue.
    #[strum(serialize = "Blue ice")]
    BlueIce,
}

impl ColourMode {
    /// The next colour mode, wrapping back round to the first one.
    pub fn next(self) -> Self {
        Self::iter()
            .cycle()
            .skip_while(|&mode| mode != self)
            .nth(1)
            .unwrap_or(self)
    }
}

/// The settings that every layer reads each frame.
///
/// The scene owns these and passes them down, so any change is seen by every layer on its very
/// next frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Whether the lights on the tree are switched on.
    pub lights_on: bool,

    /// How the lights are coloured.
    pub colour_mode: ColourMode,

    /// Whether snow is falling.
    pub snow_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            lights_on: true,
            colour_mode: ColourMode::MultiColour,
            snow_enabled: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_ron_snapshot;

    #[test]
    fn colour_mode_next_test() {
        assert_eq!(ColourMode::WarmWhite.next(), ColourMode::MultiColour);
        assert_eq!(ColourMode::MultiColour.next(), ColourMode::BlueIce);
        assert_eq!(ColourMode::BlueIce.next(), ColourMode::WarmWhite);
    }

    #[test]
    fn colour_mode_names_test() {
        assert_eq!(ColourMode::WarmWhite.to_string(), "Warm white");
        assert_ron_snapshot!(ColourMode::WarmWhite, @"WarmWhite");
        assert_ron_snapshot!(ColourMode::default(), @"MultiColour");
    }

    #[test]
    fn default_settings_test() {
        let settings = Settings::default();
        assert!(settings.lights_on);
        assert!(settings.snow_enabled);
        assert_eq!(settings.colour_mode, ColourMode::MultiColour);
    }
}
