//! This crate provides [`RasterSurface`], a software rasteriser which paints draw commands into an
//! [`RgbaImage`], along with [`composite_over`] to stack finished layers on top of each other and
//! [`save_png`] to export the result.
//!
//! All blending uses straight (non-premultiplied) alpha with the normal "source over" operator.

use glam::Vec2;
use image::{Rgba, RgbaImage};
use sg_frame::{star_vertices, Colour, DrawCommand, Fill, Shape};
use sg_surface_trait::Surface;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, instrument};

/// An error that can occur when exporting a raster surface.
#[derive(Debug, Error)]
pub enum RasterError {
    /// The image couldn't be encoded.
    #[error("failed to encode image: {0}")]
    Image(#[from] image::ImageError),

    /// The image couldn't be written.
    #[error("failed to write image: {0}")]
    Io(#[from] std::io::Error),
}

/// A surface which paints into an in-memory RGBA image.
#[derive(Clone, Debug)]
pub struct RasterSurface {
    /// The pixels painted so far.
    image: RgbaImage,
}

impl RasterSurface {
    /// Create a new transparent surface.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
        }
    }

    /// The pixels painted so far.
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Blend a single colour into a pixel with the given coverage.
    fn blend_pixel(&mut self, x: u32, y: u32, colour: Colour, coverage: f32) {
        let alpha = colour.a * coverage;
        if alpha <= 0. {
            return;
        }

        let pixel = self.image.get_pixel_mut(x, y);
        *pixel = blend(*pixel, colour.rgb_array(), alpha);
    }
}

impl Surface for RasterSurface {
    fn size(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    #[instrument(skip(self))]
    fn resize(&mut self, width: u32, height: u32) {
        debug!(old = ?self.image.dimensions(), "Resizing raster surface");
        self.image = RgbaImage::new(width, height);
    }

    fn clear(&mut self) {
        for pixel in self.image.pixels_mut() {
            *pixel = Rgba([0, 0, 0, 0]);
        }
    }

    fn draw(&mut self, command: &DrawCommand) {
        let geometry = Geometry::new(&command.shape);
        let glow_blur = command.glow.map_or(0., |glow| glow.blur.max(0.));

        let Some((x_range, y_range)) = pixel_bounds(command.shape.bounds(), glow_blur + 1., self.size())
        else {
            return;
        };

        // The glow goes underneath the shape, the same as a canvas shadow
        if let Some(glow) = command.glow.filter(|glow| glow.blur > 0.) {
            for y in y_range.clone() {
                for x in x_range.clone() {
                    let point = pixel_centre(x, y);
                    let distance = geometry.signed_distance(point);
                    let strength = glow_strength(distance, glow.blur);
                    self.blend_pixel(x, y, glow.colour, strength);
                }
            }
        }

        for y in y_range {
            for x in x_range.clone() {
                let point = pixel_centre(x, y);
                let coverage = (0.5 - geometry.signed_distance(point)).clamp(0., 1.);
                if coverage <= 0. {
                    continue;
                }

                let colour = match command.fill {
                    Fill::Solid(colour) => colour,
                    Fill::RadialGradient(gradient) => gradient.colour_at(point),
                };
                self.blend_pixel(x, y, colour, coverage);
            }
        }
    }
}

/// Composite `src` on top of `dst` with its top left corner at `(x, y)` in `dst`. Any part of
/// `src` that falls outside `dst` is ignored.
pub fn composite_over(dst: &mut RgbaImage, src: &RgbaImage, x: i64, y: i64) {
    let (dst_width, dst_height) = (i64::from(dst.width()), i64::from(dst.height()));

    for (sx, sy, &src_pixel) in src.enumerate_pixels() {
        let dx = x + i64::from(sx);
        let dy = y + i64::from(sy);
        if dx < 0 || dy < 0 || dx >= dst_width || dy >= dst_height {
            continue;
        }

        let Rgba([r, g, b, a]) = src_pixel;
        if a == 0 {
            continue;
        }

        let pixel = dst.get_pixel_mut(dx as u32, dy as u32);
        *pixel = blend(*pixel, [r, g, b], f32::from(a) / 255.);
    }
}

/// Save an image as a PNG file, creating its directory if needed.
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn save_png(image: &RgbaImage, path: impl AsRef<Path>) -> Result<(), RasterError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    image.save_with_format(path, image::ImageFormat::Png)?;
    debug!("Saved PNG");
    Ok(())
}

/// Blend a colour with the given alpha over an existing pixel.
fn blend(under: Rgba<u8>, colour: [u8; 3], alpha: f32) -> Rgba<u8> {
    let alpha = alpha.clamp(0., 1.);
    let Rgba([ur, ug, ub, ua]) = under;
    let under_alpha = f32::from(ua) / 255.;

    let out_alpha = alpha + under_alpha * (1. - alpha);
    if out_alpha <= 0. {
        return Rgba([0, 0, 0, 0]);
    }

    let mix = |over: u8, under: u8| -> u8 {
        let value =
            (f32::from(over) * alpha + f32::from(under) * under_alpha * (1. - alpha)) / out_alpha;
        value.round().clamp(0., 255.) as u8
    };

    Rgba([
        mix(colour[0], ur),
        mix(colour[1], ug),
        mix(colour[2], ub),
        (out_alpha * 255.).round() as u8,
    ])
}

/// The centre of the pixel at `(x, y)`.
#[inline]
fn pixel_centre(x: u32, y: u32) -> Vec2 {
    Vec2::new(x as f32 + 0.5, y as f32 + 0.5)
}

/// How strong the glow is at the given signed distance from the edge of a shape.
fn glow_strength(distance: f32, blur: f32) -> f32 {
    if distance <= 0. {
        1.
    } else if distance >= blur {
        0.
    } else {
        let falloff = 1. - distance / blur;
        falloff * falloff
    }
}

/// Clip the bounds of a shape, padded on all sides, to the pixels of the surface.
fn pixel_bounds(
    (min, max): (Vec2, Vec2),
    padding: f32,
    (width, height): (u32, u32),
) -> Option<(std::ops::Range<u32>, std::ops::Range<u32>)> {
    let min = (min - padding).floor().max(Vec2::ZERO);
    let max = (max + padding).ceil().min(Vec2::new(width as f32, height as f32));

    if !(min.x < max.x && min.y < max.y) {
        return None;
    }

    Some((min.x as u32..max.x as u32, min.y as u32..max.y as u32))
}

/// A shape prepared for repeated distance queries.
enum Geometry {
    /// An axis-aligned box, stored as its centre and half extents.
    Rect { centre: Vec2, half: Vec2 },

    /// A line segment with a half width.
    Line { from: Vec2, to: Vec2, half_width: f32 },

    /// A circle.
    Circle { centre: Vec2, radius: f32 },

    /// A closed polygon.
    Polygon(Vec<Vec2>),
}

impl Geometry {
    fn new(shape: &Shape) -> Self {
        match *shape {
            Shape::Rect { origin, size } => Self::Rect {
                centre: origin + size / 2.,
                half: size.abs() / 2.,
            },
            Shape::Line { from, to, width } => Self::Line {
                from,
                to,
                half_width: width / 2.,
            },
            Shape::Circle { centre, radius } => Self::Circle { centre, radius },
            Shape::Star {
                centre,
                spikes,
                outer_radius,
                inner_radius,
            } => Self::Polygon(star_vertices(centre, spikes, outer_radius, inner_radius).collect()),
        }
    }

    /// The distance from the point to the edge of the shape. This is negative inside the shape.
    fn signed_distance(&self, point: Vec2) -> f32 {
        match self {
            Self::Rect { centre, half } => {
                let q = (point - *centre).abs() - *half;
                q.max(Vec2::ZERO).length() + q.x.max(q.y).min(0.)
            }
            Self::Line {
                from,
                to,
                half_width,
            } => distance_to_segment(point, *from, *to) - half_width,
            Self::Circle { centre, radius } => point.distance(*centre) - radius,
            Self::Polygon(vertices) => {
                let edge_distance = vertices
                    .iter()
                    .zip(vertices.iter().cycle().skip(1))
                    .map(|(&a, &b)| distance_to_segment(point, a, b))
                    .fold(f32::INFINITY, f32::min);

                if point_in_polygon(point, vertices) {
                    -edge_distance
                } else {
                    edge_distance
                }
            }
        }
    }
}

/// The shortest distance from the point to the line segment between `a` and `b`.
fn distance_to_segment(point: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let length_squared = ab.length_squared();
    if length_squared <= f32::EPSILON {
        return point.distance(a);
    }

    let t = ((point - a).dot(ab) / length_squared).clamp(0., 1.);
    point.distance(a + t * ab)
}

/// Check if the point is inside the polygon with the even-odd rule.
fn point_in_polygon(point: Vec2, vertices: &[Vec2]) -> bool {
    let mut inside = false;

    for (&a, &b) in vertices.iter().zip(vertices.iter().cycle().skip(1)) {
        if (a.y > point.y) != (b.y > point.y) {
            let crossing_x = a.x + (point.y - a.y) / (b.y - a.y) * (b.x - a.x);
            if point.x < crossing_x {
                inside = !inside;
            }
        }
    }

    inside
}

#[cfg(test)]
mod tests {
    use super::*;
    use sg_frame::{GradientStop, RadialGradient};

    const RED: Colour = Colour::rgb(255, 0, 0);

    fn circle(x: f32, y: f32, radius: f32) -> Shape {
        Shape::Circle {
            centre: Vec2::new(x, y),
            radius,
        }
    }

    #[test]
    fn circle_coverage_test() {
        let mut surface = RasterSurface::new(20, 20);
        surface.draw(&DrawCommand::solid(circle(10., 10., 4.), RED));

        assert_eq!(*surface.image().get_pixel(10, 10), Rgba([255, 0, 0, 255]));
        assert_eq!(*surface.image().get_pixel(0, 0), Rgba([0, 0, 0, 0]));
        assert_eq!(*surface.image().get_pixel(10, 16), Rgba([0, 0, 0, 0]));

        // The edge is anti-aliased
        let edge = surface.image().get_pixel(13, 10)[3];
        assert!(edge > 0 && edge <= 255, "Edge alpha was {edge}");
    }

    #[test]
    fn rect_and_line_test() {
        let mut surface = RasterSurface::new(10, 10);
        surface.draw(&DrawCommand::solid(
            Shape::Rect {
                origin: Vec2::new(2., 2.),
                size: Vec2::new(3., 4.),
            },
            Colour::WHITE,
        ));

        assert_eq!(surface.image().get_pixel(2, 2)[3], 255);
        assert_eq!(surface.image().get_pixel(4, 5)[3], 255);
        assert_eq!(surface.image().get_pixel(5, 2)[3], 0);
        assert_eq!(surface.image().get_pixel(2, 6)[3], 0);

        surface.clear();
        assert!(surface.image().pixels().all(|pixel| pixel[3] == 0));

        surface.draw(&DrawCommand::solid(
            Shape::Line {
                from: Vec2::new(0., 5.5),
                to: Vec2::new(10., 5.5),
                width: 2.,
            },
            RED,
        ));
        assert_eq!(*surface.image().get_pixel(3, 5), Rgba([255, 0, 0, 255]));
        assert_eq!(surface.image().get_pixel(3, 1)[3], 0);
    }

    #[test]
    fn star_test() {
        let mut surface = RasterSurface::new(60, 60);
        surface.draw(&DrawCommand::solid(
            Shape::Star {
                centre: Vec2::new(30., 30.),
                spikes: 5,
                outer_radius: 25.,
                inner_radius: 12.5,
            },
            Colour::rgb(0xff, 0xd7, 0),
        ));

        // The centre and the top tip are filled, but the notch between two tips isn't
        assert_eq!(surface.image().get_pixel(30, 30)[3], 255);
        assert_eq!(surface.image().get_pixel(30, 8)[3], 255);
        assert_eq!(surface.image().get_pixel(30, 54)[3], 0);
    }

    #[test]
    fn glow_test() {
        let mut surface = RasterSurface::new(40, 40);
        surface.draw(
            &DrawCommand::solid(circle(20., 20., 3.), Colour::WHITE).with_glow(8., Colour::WHITE),
        );

        let near = surface.image().get_pixel(26, 20)[3];
        let far = surface.image().get_pixel(29, 20)[3];
        assert!(near > far, "Glow should fade out: {near} <= {far}");
        assert!(far > 0);
        assert_eq!(surface.image().get_pixel(35, 20)[3], 0);
    }

    #[test]
    fn gradient_fill_test() {
        let mut surface = RasterSurface::new(20, 20);
        let gradient = RadialGradient {
            inner_centre: Vec2::new(8., 8.),
            inner_radius: 1.,
            outer_centre: Vec2::new(10., 10.),
            outer_radius: 6.,
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
                    colour: Colour::rgb(0x88, 0, 0),
                },
            ],
        };
        surface.draw(&DrawCommand::gradient(circle(10., 10., 6.), gradient));

        let highlight = surface.image().get_pixel(7, 7);
        let shadow = surface.image().get_pixel(14, 10);
        assert!(highlight[1] > shadow[1], "{highlight:?} vs {shadow:?}");
        assert_eq!(highlight[3], 255);
    }

    #[test]
    fn blend_test() {
        let black = Rgba([0, 0, 0, 255]);
        assert_eq!(blend(black, [255, 255, 255], 0.5), Rgba([128, 128, 128, 255]));
        assert_eq!(blend(Rgba([0, 0, 0, 0]), [10, 20, 30], 0.5), Rgba([10, 20, 30, 128]));
        assert_eq!(blend(black, [255, 255, 255], 0.), black);
    }

    #[test]
    fn composite_over_test() {
        let mut dst = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255]));
        let src = RgbaImage::from_pixel(2, 2, Rgba([255, 255, 255, 255]));

        composite_over(&mut dst, &src, 3, -1);

        assert_eq!(*dst.get_pixel(3, 0), Rgba([255, 255, 255, 255]));
        assert_eq!(*dst.get_pixel(2, 0), Rgba([0, 0, 0, 255]));
        assert_eq!(*dst.get_pixel(3, 1), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn empty_surface_test() {
        let mut surface = RasterSurface::new(0, 0);
        assert!(surface.is_available());

        // Drawing onto nothing is fine
        surface.draw(&DrawCommand::solid(circle(4., 4., 2.), RED));

        surface.resize(10, 6);
        assert_eq!(surface.size(), (10, 6));
        assert_eq!(*surface.image().get_pixel(9, 5), Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn save_png_test() {
        let mut surface = RasterSurface::new(8, 8);
        surface.draw(&DrawCommand::solid(circle(4., 4., 2.), RED));

        let path = std::env::temp_dir()
            .join(format!("sg-raster-{}", std::process::id()))
            .join("frames")
            .join("frame.png");
        save_png(surface.image(), &path).unwrap();

        let loaded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(loaded, *surface.image());
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn save_png_error_test() {
        let file = std::env::temp_dir().join(format!("sg-raster-file-{}", std::process::id()));
        std::fs::write(&file, "not a directory").unwrap();

        let result = save_png(&RgbaImage::new(2, 2), file.join("frame.png"));
        assert!(matches!(result, Err(RasterError::Io(_))));
        let _ = std::fs::remove_file(&file);
    }
}
