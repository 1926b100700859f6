//! Headless drawing surface that produces buffers for the drawing entry point.

use image::{GrayImage, Luma};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut};

use super::{CANVAS_SIZE, DIGIT_SIZE};

/// Brush radius in pixels on a 280x280 canvas.
pub const DEFAULT_BRUSH_RADIUS: i32 = 8;

const INK: Luma<u8> = Luma([0]);
const PAPER: Luma<u8> = Luma([255]);

/// A square white canvas painted with a round black brush.
#[derive(Debug, Clone)]
pub struct Canvas {
    image: GrayImage,
    brush_radius: i32,
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new(CANVAS_SIZE, DEFAULT_BRUSH_RADIUS)
    }
}

impl Canvas {
    /// Create a blank canvas of `size`x`size` pixels.
    #[must_use]
    pub fn new(size: u32, brush_radius: i32) -> Self {
        Self {
            image: GrayImage::from_pixel(size, size, PAPER),
            brush_radius: brush_radius.max(1),
        }
    }

    /// Paint a single brush dab centred on `(x, y)`.
    pub fn stroke_at(&mut self, x: i32, y: i32) {
        draw_filled_circle_mut(&mut self.image, (x, y), self.brush_radius, INK);
    }

    /// Paint a continuous stroke from `from` to `to`.
    ///
    /// Dabs are placed at most half a brush radius apart so fast pointer
    /// motion still leaves an unbroken line.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    pub fn stroke_between(&mut self, from: (i32, i32), to: (i32, i32)) {
        let dx = (to.0 - from.0) as f32;
        let dy = (to.1 - from.1) as f32;
        let spacing = (self.brush_radius as f32 / 2.0).max(1.0);
        let steps = (dx.hypot(dy) / spacing).ceil().max(1.0) as u32;

        for step in 0..=steps {
            let t = step as f32 / steps as f32;
            let x = dx.mul_add(t, from.0 as f32).round() as i32;
            let y = dy.mul_add(t, from.1 as f32).round() as i32;
            self.stroke_at(x, y);
        }
    }

    /// Reset every pixel to white.
    pub fn clear(&mut self) {
        self.image.pixels_mut().for_each(|p| *p = PAPER);
    }

    /// Whether nothing has been drawn.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.image.pixels().all(|p| *p == PAPER)
    }

    /// The current pixel buffer, black ink on white.
    #[must_use]
    pub const fn buffer(&self) -> &GrayImage {
        &self.image
    }

    /// Brush radius in pixels.
    #[must_use]
    pub const fn brush_radius(&self) -> i32 {
        self.brush_radius
    }
}

/// Render a simple "7" on a blank 28x28 white image.
///
/// Three 2-pixel-wide strokes: the top bar, the diagonal, and a short foot.
/// Used by the `demo` command and as a known non-blank input in tests.
#[must_use]
pub fn sample_seven() -> GrayImage {
    let mut img = GrayImage::from_pixel(DIGIT_SIZE, DIGIT_SIZE, PAPER);
    let strokes = [
        ((5.0, 5.0), (20.0, 5.0)),
        ((20.0, 5.0), (15.0, 20.0)),
        ((10.0, 20.0), (15.0, 20.0)),
    ];

    for (start, end) in strokes {
        for offset in [0.0, 1.0] {
            draw_line_segment_mut(
                &mut img,
                (start.0, start.1 + offset),
                (end.0, end.1 + offset),
                INK,
            );
            draw_line_segment_mut(
                &mut img,
                (start.0 + offset, start.1),
                (end.0 + offset, end.1),
                INK,
            );
        }
    }

    img
}
