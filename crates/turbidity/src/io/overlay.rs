use std::path::Path;

use font8x8::{UnicodeFonts, BASIC_FONTS};
use image::{DynamicImage, GrayImage, ImageFormat, Rgb, RgbImage};
use imageproc::{
    drawing::{draw_filled_rect_mut, draw_line_segment_mut},
    rect::Rect,
};
use crate::{error::Result, types::AnalysisResult};

pub const BOUNDARY_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

/// One color per status line: particles, risk, purification, threshold
pub const STATUS_COLORS: [Rgb<u8>; 4] = [
    Rgb([255, 0, 0]),
    Rgb([0, 0, 255]),
    Rgb([0, 255, 0]),
    Rgb([255, 255, 0]),
];

const STATUS_ORIGIN: (i32, i32) = (10, 10);
const STATUS_LINE_SPACING: i32 = 40;
const STATUS_SCALE: u32 = 2;
const GLYPH_SIZE: i32 = 8;

/// Draw a closed pixel contour onto `canvas`, clipping anything out of bounds
pub fn draw_contour(canvas: &mut RgbImage, contour: &[[u32; 2]], color: Rgb<u8>) {
    for pair in contour.windows(2) {
        let [x0, y0] = pair[0];
        let [x1, y1] = pair[1];
        draw_line_segment_mut(canvas, (x0 as f32, y0 as f32), (x1 as f32, y1 as f32), color);
    }
    for &[x, y] in contour {
        if let Some(pixel) = canvas.get_pixel_mut_checked(x, y) {
            *pixel = color;
        }
    }
}

/// Draw `text` with an 8x8 bitmap font, each font pixel blown up to a
/// `scale`-sized square. Characters without a glyph leave a gap.
pub fn draw_text(canvas: &mut RgbImage, origin: (i32, i32), scale: u32, text: &str, color: Rgb<u8>) {
    let scale = scale.max(1);
    let step = scale as i32;
    let (mut pen_x, top) = origin;

    for ch in text.chars() {
        if let Some(glyph) = BASIC_FONTS.get(ch) {
            for (row, bits) in glyph.iter().enumerate() {
                for col in 0..GLYPH_SIZE {
                    if bits & (1 << col) != 0 {
                        let cell = Rect::at(pen_x + col * step, top + row as i32 * step).of_size(scale, scale);
                        draw_filled_rect_mut(canvas, cell, color);
                    }
                }
            }
        }
        pen_x += GLYPH_SIZE * step;
    }
}

impl AnalysisResult {
    /// Copy `frame` to RGB, outline every surviving region and write the
    /// status lines in the top-left corner
    pub fn render_overlay(&self, frame: &GrayImage) -> RgbImage {
        if frame.dimensions() != (self.image_width, self.image_height) {
            tracing::warn!(
                frame = ?frame.dimensions(),
                analyzed = ?(self.image_width, self.image_height),
                "overlay frame size differs from the analyzed frame"
            );
        }

        let mut canvas = DynamicImage::ImageLuma8(frame.clone()).to_rgb8();
        for region in &self.regions {
            draw_contour(&mut canvas, &region.boundary, BOUNDARY_COLOR);
        }

        let (x, y) = STATUS_ORIGIN;
        for (i, (line, color)) in self.status_lines().iter().zip(STATUS_COLORS).enumerate() {
            draw_text(&mut canvas, (x, y + i as i32 * STATUS_LINE_SPACING), STATUS_SCALE, line, color);
        }
        canvas
    }

    /// Save the annotated frame as a lossless PNG
    pub fn save_overlay<P: AsRef<Path>>(&self, frame: &GrayImage, path: P) -> Result<()> {
        let canvas = self.render_overlay(frame);
        canvas.save_with_format(path.as_ref(), ImageFormat::Png)?;
        tracing::debug!(path = %path.as_ref().display(), "saved annotated frame");
        Ok(())
    }
}
