//! This module composites the separate layer surfaces into a single frame.

use image::{Rgba, RgbaImage};
use sg_frame::Colour;
use sg_scene::Viewport;
use sg_surface_raster::composite_over;

/// The gap between the bottom of the tree canvas and the bottom of the viewport.
pub const TREE_BOTTOM_MARGIN: i64 = 40;

/// The gap between the gesture overlay and the top right corner of the viewport.
pub const OVERLAY_MARGIN: i64 = 16;

/// The images of every layer, bottom to top.
#[derive(Clone, Copy, Debug)]
pub struct Layers<'a> {
    /// The tree canvas.
    pub tree: &'a RgbaImage,

    /// The snow, covering the whole viewport.
    pub snow: &'a RgbaImage,

    /// The hand skeleton, if the gesture bridge is running.
    pub overlay: Option<&'a RgbaImage>,
}

/// Composite all the layers over a flat background.
///
/// The tree is centred horizontally and sits just above the bottom edge. The snow falls in front
/// of it, and the gesture overlay goes in the top right corner.
pub fn compose(viewport: Viewport, background: Colour, layers: Layers<'_>) -> RgbaImage {
    let Colour { r, g, b, a } = background;
    let alpha = (a.clamp(0., 1.) * 255.).round() as u8;
    let mut frame = RgbaImage::from_pixel(viewport.width, viewport.height, Rgba([r, g, b, alpha]));

    let width = i64::from(viewport.width);
    let height = i64::from(viewport.height);

    let tree_x = (width - i64::from(layers.tree.width())) / 2;
    let tree_y = height - i64::from(layers.tree.height()) - TREE_BOTTOM_MARGIN;
    composite_over(&mut frame, layers.tree, tree_x, tree_y);

    composite_over(&mut frame, layers.snow, 0, 0);

    if let Some(overlay) = layers.overlay {
        let overlay_x = width - i64::from(overlay.width()) - OVERLAY_MARGIN;
        composite_over(&mut frame, overlay, overlay_x, OVERLAY_MARGIN);
    }

    frame
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const GREEN: Rgba<u8> = Rgba([0, 255, 0, 255]);
    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);
    const BACKGROUND: Colour = Colour::rgb(10, 20, 30);

    #[test]
    fn layer_positions_test() {
        let viewport = Viewport {
            width: 200,
            height: 150,
        };
        let tree = RgbaImage::from_pixel(100, 50, RED);
        let snow = RgbaImage::new(200, 150);
        let overlay = RgbaImage::from_pixel(32, 24, GREEN);

        let frame = compose(
            viewport,
            BACKGROUND,
            Layers {
                tree: &tree,
                snow: &snow,
                overlay: Some(&overlay),
            },
        );

        assert_eq!(frame.dimensions(), (200, 150));

        // Tree spans x in [50, 150) and y in [60, 110)
        assert_eq!(*frame.get_pixel(50, 60), RED);
        assert_eq!(*frame.get_pixel(149, 109), RED);
        assert_eq!(*frame.get_pixel(49, 60), Rgba([10, 20, 30, 255]));
        assert_eq!(*frame.get_pixel(100, 110), Rgba([10, 20, 30, 255]));

        // Overlay spans x in [152, 184) and y in [16, 40)
        assert_eq!(*frame.get_pixel(152, 16), GREEN);
        assert_eq!(*frame.get_pixel(183, 39), GREEN);
        assert_eq!(*frame.get_pixel(184, 16), Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn snow_in_front_of_tree_test() {
        let viewport = Viewport {
            width: 100,
            height: 100,
        };
        let tree = RgbaImage::from_pixel(100, 60, RED);
        let mut snow = RgbaImage::new(100, 100);
        snow.put_pixel(50, 50, BLUE);

        let frame = compose(
            viewport,
            BACKGROUND,
            Layers {
                tree: &tree,
                snow: &snow,
                overlay: None,
            },
        );

        assert_eq!(*frame.get_pixel(50, 50), BLUE);
        assert_eq!(*frame.get_pixel(51, 50), RED);
    }
}
