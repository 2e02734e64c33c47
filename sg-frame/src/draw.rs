//! This module handles the draw commands that make up a frame.

use crate::Colour;
use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// A shape to paint onto a surface.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    /// An axis-aligned rectangle.
    Rect {
        /// The top left corner.
        origin: Vec2,

        /// The width and height.
        size: Vec2,
    },

    /// A straight stroke between two points.
    Line {
        /// Where the stroke starts.
        from: Vec2,

        /// Where the stroke ends.
        to: Vec2,

        /// The width of the stroke.
        width: f32,
    },

    /// A filled circle.
    Circle {
        /// The centre of the circle.
        centre: Vec2,

        /// The radius of the circle.
        radius: f32,
    },

    /// A filled star polygon. See [`star_vertices`] for the exact vertices.
    Star {
        /// The centre of the star.
        centre: Vec2,

        /// The number of points on the star.
        spikes: u8,

        /// The distance from the centre to the tip of each point.
        outer_radius: f32,

        /// The distance from the centre to each inner corner.
        inner_radius: f32,
    },
}

impl Shape {
    /// The axis-aligned bounding box of the shape, as `(min, max)`.
    pub fn bounds(&self) -> (Vec2, Vec2) {
        match *self {
            Shape::Rect { origin, size } => (origin.min(origin + size), origin.max(origin + size)),
            Shape::Line { from, to, width } => {
                let half = Vec2::splat(width / 2.);
                (from.min(to) - half, from.max(to) + half)
            }
            Shape::Circle { centre, radius } => (centre - radius, centre + radius),
            Shape::Star {
                centre,
                outer_radius,
                inner_radius,
                ..
            } => {
                let radius = outer_radius.max(inner_radius);
                (centre - radius, centre + radius)
            }
        }
    }
}

/// Return the vertices of a star polygon, in drawing order.
///
/// There are `2 * spikes` vertices, alternating between the outer and inner radius. The first
/// vertex is the tip pointing straight up, at `centre - (0, outer_radius)`.
pub fn star_vertices(
    centre: Vec2,
    spikes: u8,
    outer_radius: f32,
    inner_radius: f32,
) -> impl Iterator<Item = Vec2> {
    let step = PI / spikes.max(1) as f32;

    (0..u32::from(spikes) * 2).map(move |i| {
        let angle = 1.5 * PI + i as f32 * step;
        let radius = if i % 2 == 0 {
            outer_radius
        } else {
            inner_radius
        };
        centre + radius * Vec2::new(angle.cos(), angle.sin())
    })
}

/// A single colour stop in a gradient.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    /// Where this stop sits, in [0, 1].
    pub offset: f32,

    /// The colour at this stop.
    pub colour: Colour,
}

/// A gradient between two circles, like the 2D canvas `createRadialGradient()`.
///
/// The stops must be sorted by offset.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RadialGradient {
    /// The centre of the starting circle.
    pub inner_centre: Vec2,

    /// The radius of the starting circle.
    pub inner_radius: f32,

    /// The centre of the ending circle.
    pub outer_centre: Vec2,

    /// The radius of the ending circle.
    pub outer_radius: f32,

    /// The colour stops.
    pub stops: [GradientStop; 3],
}

impl RadialGradient {
    /// Work out the gradient parameter `t` for a point.
    ///
    /// The gradient is a family of circles interpolated between the inner and outer circle, and
    /// `t` is the largest parameter whose circle passes through the point. Points outside the
    /// range are padded with the nearest end, so the result is always in [0, 1].
    fn parameter_at(&self, point: Vec2) -> f32 {
        let centre_delta = self.outer_centre - self.inner_centre;
        let radius_delta = self.outer_radius - self.inner_radius;
        let offset = point - self.inner_centre;

        // |offset - t * centre_delta|^2 = (inner_radius + t * radius_delta)^2, rearranged into
        // a * t^2 - 2 * b * t + c = 0
        let a = centre_delta.length_squared() - radius_delta * radius_delta;
        let b = offset.dot(centre_delta) + self.inner_radius * radius_delta;
        let c = offset.length_squared() - self.inner_radius * self.inner_radius;

        let radius_at = |t: f32| self.inner_radius + t * radius_delta;

        let t = if a.abs() < f32::EPSILON {
            if b.abs() < f32::EPSILON {
                return 0.;
            }
            c / (2. * b)
        } else {
            let discriminant = b * b - a * c;
            if discriminant < 0. {
                return 0.;
            }
            let root = discriminant.sqrt();
            let (high, low) = {
                let t1 = (b + root) / a;
                let t2 = (b - root) / a;
                (t1.max(t2), t1.min(t2))
            };

            if radius_at(high) >= 0. {
                high
            } else if radius_at(low) >= 0. {
                low
            } else {
                return 0.;
            }
        };

        t.clamp(0., 1.)
    }

    /// The colour of the gradient at the given point.
    pub fn colour_at(&self, point: Vec2) -> Colour {
        let t = self.parameter_at(point);
        let [first, .., last] = self.stops;

        if t <= first.offset {
            return first.colour;
        }

        for [from, to] in [
            [self.stops[0], self.stops[1]],
            [self.stops[1], self.stops[2]],
        ] {
            if t <= to.offset {
                let span = to.offset - from.offset;
                let local = if span > 0. {
                    (t - from.offset) / span
                } else {
                    1.
                };
                return from.colour.lerp(to.colour, local);
            }
        }

        last.colour
    }
}

/// How to fill a shape.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Fill {
    /// A single flat colour.
    Solid(Colour),

    /// A radial gradient.
    RadialGradient(RadialGradient),
}

/// A soft glow painted around a shape, like the 2D canvas `shadowBlur` and `shadowColor`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Glow {
    /// How far the glow extends past the edge of the shape.
    pub blur: f32,

    /// The colour of the glow.
    pub colour: Colour,
}

/// A single draw call: a shape, how to fill it, and an optional glow.
///
/// This holds no heap data, so building one per particle per frame never allocates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DrawCommand {
    /// The shape to paint.
    pub shape: Shape,

    /// How to fill the shape. For a [`Shape::Line`], this is the stroke colour.
    pub fill: Fill,

    /// An optional glow around the shape.
    pub glow: Option<Glow>,
}

impl DrawCommand {
    /// Paint the shape in a single colour.
    pub const fn solid(shape: Shape, colour: Colour) -> Self {
        Self {
            shape,
            fill: Fill::Solid(colour),
            glow: None,
        }
    }

    /// Paint the shape with a radial gradient.
    pub const fn gradient(shape: Shape, gradient: RadialGradient) -> Self {
        Self {
            shape,
            fill: Fill::RadialGradient(gradient),
            glow: None,
        }
    }

    /// Add a glow to this draw call.
    pub const fn with_glow(self, blur: f32, colour: Colour) -> Self {
        Self {
            glow: Some(Glow { blur, colour }),
            ..self
        }
    }

    /// The solid colour of this draw call, if it has one.
    pub fn solid_colour(&self) -> Option<Colour> {
        match self.fill {
            Fill::Solid(colour) => Some(colour),
            Fill::RadialGradient(_) => None,
        }
    }
}
