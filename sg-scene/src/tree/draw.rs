//! This module turns each particle into a draw command.

use super::{Particle, ParticleKind};
use crate::settings::{ColourMode, Settings};
use glam::Vec2;
use sg_frame::{Colour, DrawCommand, GradientStop, RadialGradient, Shape};

/// A light is lit while the sine of its blink phase is above this.
const BLINK_THRESHOLD: f32 = -0.2;

/// How quickly the lights blink.
const BLINK_FREQUENCY: f32 = 4.;

/// How quickly the tinsel shimmers.
const SHIMMER_FREQUENCY: f32 = 5.;

/// The colours that the lights cycle through in [`ColourMode::MultiColour`].
const MULTI_COLOURS: [Colour; 4] = [
    Colour::rgb(0xff, 0x00, 0x00),
    Colour::rgb(0x00, 0xff, 0x00),
    Colour::rgb(0xff, 0xff, 0x00),
    Colour::rgb(0x00, 0x00, 0xff),
];

const GOLD: Colour = Colour::rgb(0xff, 0xd7, 0x00);

/// The colour of a light in the given mode. Only [`ColourMode::MultiColour`] uses the index, which
/// is the light's position in the painting order.
pub fn light_colour(mode: ColourMode, index: usize) -> Colour {
    match mode {
        ColourMode::WarmWhite => Colour::rgba(255, 220, 150, 0.9),
        ColourMode::BlueIce => Colour::rgba(200, 240, 255, 0.9),
        ColourMode::MultiColour => MULTI_COLOURS[index % MULTI_COLOURS.len()],
    }
}

/// Work out how to paint the particle at the given index in the painting order, at the given
/// time. Lights which are switched off or between blinks aren't painted at all.
pub fn draw_particle(
    particle: &Particle,
    index: usize,
    time: f32,
    settings: &Settings,
) -> Option<DrawCommand> {
    let Particle { size, .. } = *particle;
    let position = particle.position();

    let command = match particle.kind {
        ParticleKind::TrunkBlock => DrawCommand::solid(
            Shape::Rect {
                origin: position - Vec2::splat(size / 2.),
                size: Vec2::new(size, size * 1.5),
            },
            particle.colour,
        ),
        ParticleKind::Needle => DrawCommand::solid(
            Shape::Line {
                from: position,
                to: position + Vec2::new(-size, size * 2.),
                width: 1.5,
            },
            particle.colour,
        ),
        ParticleKind::Tinsel => {
            let colour = if (time * SHIMMER_FREQUENCY + particle.y()).sin() > 0. {
                Colour::rgb(0xff, 0xff, 0xaa)
            } else {
                Colour::rgb(0xcc, 0xaa, 0x00)
            };
            DrawCommand::solid(
                Shape::Circle {
                    centre: position,
                    radius: size,
                },
                colour,
            )
        }
        ParticleKind::Ornament => DrawCommand::gradient(
            Shape::Circle {
                centre: position,
                radius: size,
            },
            ornament_gradient(position, size),
        ),
        ParticleKind::Light => {
            if !settings.lights_on {
                return None;
            }

            let blink = (time * BLINK_FREQUENCY + particle.blink_offset.unwrap_or(0.)).sin();
            if blink <= BLINK_THRESHOLD {
                return None;
            }

            let colour = light_colour(settings.colour_mode, index);
            DrawCommand::solid(
                Shape::Circle {
                    centre: position,
                    radius: size,
                },
                colour,
            )
            .with_glow(8., colour)
        }
        ParticleKind::Star => DrawCommand::solid(
            Shape::Star {
                centre: position,
                spikes: 5,
                outer_radius: size,
                inner_radius: size / 2.,
            },
            GOLD,
        )
        .with_glow(20., GOLD),
    };

    Some(command)
}

/// The shiny red gradient of an ornament, with its highlight up and to the left.
fn ornament_gradient(centre: Vec2, size: f32) -> RadialGradient {
    RadialGradient {
        inner_centre: centre - Vec2::splat(2.),
        inner_radius: 1.,
        outer_centre: centre,
        outer_radius: size,
        stops: [
            GradientStop {
                offset: 0.,
                colour: Colour::WHITE,
            },
            GradientStop {
                offset: 0.2,
                colour: Colour::rgb(0xff, 0x44, 0x44),
            },
            GradientStop {
                offset: 1.,
                colour: Colour::rgb(0x88, 0x00, 0x00),
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sg_frame::Fill;

    fn particle(kind: ParticleKind, size: f32) -> Particle {
        Particle::new(kind, Vec2::new(100., 300.), 0., Colour::WHITE, size, 0.5)
    }

    fn light(blink_offset: f32) -> Particle {
        let mut light = particle(ParticleKind::Light, 3.);
        light.blink_offset = Some(blink_offset);
        light
    }

    #[test]
    fn lights_off_never_painted_test() {
        let settings = Settings {
            lights_on: false,
            ..Settings::default()
        };

        for offset in [0., 1.3, 25., 77.7, 99.9] {
            for step in 0..200 {
                let time = step as f32 * 0.01;
                assert_eq!(draw_particle(&light(offset), 3, time, &settings), None);
            }
        }
    }

    #[test]
    fn blinking_test() {
        let settings = Settings::default();

        // sin(pi / 2) = 1 is lit and sin(-pi / 2) = -1 isn't
        let lit = light(std::f32::consts::FRAC_PI_2);
        let unlit = light(-std::f32::consts::FRAC_PI_2);

        assert!(draw_particle(&lit, 0, 0., &settings).is_some());
        assert_eq!(draw_particle(&unlit, 0, 0., &settings), None);
    }

    #[test]
    fn warm_white_is_uniform_test() {
        let settings = Settings {
            colour_mode: ColourMode::WarmWhite,
            ..Settings::default()
        };
        let lit = light(std::f32::consts::FRAC_PI_2);

        let colours: Vec<Colour> = (0..12)
            .filter_map(|index| draw_particle(&lit, index, 0., &settings))
            .filter_map(|command| command.solid_colour())
            .collect();

        assert_eq!(colours.len(), 12);
        assert!(colours
            .iter()
            .all(|&colour| colour == Colour::rgba(255, 220, 150, 0.9)));
    }

    #[test]
    fn multi_colour_cycles_by_index_test() {
        assert_eq!(light_colour(ColourMode::MultiColour, 0), MULTI_COLOURS[0]);
        assert_eq!(light_colour(ColourMode::MultiColour, 5), MULTI_COLOURS[1]);
        assert_eq!(light_colour(ColourMode::MultiColour, 7), MULTI_COLOURS[3]);
        assert_eq!(
            light_colour(ColourMode::BlueIce, 7),
            light_colour(ColourMode::BlueIce, 2)
        );
    }

    #[test]
    fn shapes_test() {
        let settings = Settings::default();

        let trunk = draw_particle(&particle(ParticleKind::TrunkBlock, 6.), 0, 0., &settings);
        assert_eq!(
            trunk.map(|command| command.shape),
            Some(Shape::Rect {
                origin: Vec2::new(97., 297.),
                size: Vec2::new(6., 9.),
            })
        );

        let needle = draw_particle(&particle(ParticleKind::Needle, 4.), 0, 0., &settings);
        assert_eq!(
            needle.map(|command| command.shape),
            Some(Shape::Line {
                from: Vec2::new(100., 300.),
                to: Vec2::new(96., 308.),
                width: 1.5,
            })
        );

        let star = draw_particle(&particle(ParticleKind::Star, 25.), 0, 0., &settings).unwrap();
        assert!(matches!(
            star.shape,
            Shape::Star {
                spikes: 5,
                inner_radius,
                ..
            } if inner_radius == 12.5
        ));
        assert_eq!(star.glow.map(|glow| glow.blur), Some(20.));

        let ornament = draw_particle(&particle(ParticleKind::Ornament, 6.), 0, 0., &settings);
        assert!(matches!(
            ornament.map(|command| command.fill),
            Some(Fill::RadialGradient(_))
        ));
    }

    #[test]
    fn tinsel_shimmer_test() {
        let settings = Settings::default();
        let mut bead = particle(ParticleKind::Tinsel, 1.5);

        // sin(y) with y = pi / 2 is bright, and y = 3pi / 2 is dark
        bead.base.y = std::f32::consts::FRAC_PI_2;
        let bright = draw_particle(&bead, 0, 0., &settings).unwrap();
        assert_eq!(bright.solid_colour(), Some(Colour::rgb(0xff, 0xff, 0xaa)));

        bead.base.y = 3. * std::f32::consts::FRAC_PI_2;
        let dark = draw_particle(&bead, 0, 0., &settings).unwrap();
        assert_eq!(dark.solid_colour(), Some(Colour::rgb(0xcc, 0xaa, 0x00)));
    }
}
