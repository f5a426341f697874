//! Frame annotation: detection boxes and confidence captions.
//!
//! Accepted detections are drawn as hollow rectangles in the requirement's
//! configured color, with a `"label: 0.93"` caption just above the box.
//! Rendering is best-effort: a missing caption font degrades to boxes-only
//! and is reported once at startup, never per frame.

use std::path::Path;

use ab_glyph::{FontVec, PxScale};
use anyhow::{Context, Result};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;

use crate::detect::Detection;

const CAPTION_SCALE: f32 = 16.0;
/// Vertical gap between the caption baseline and the box's top edge.
const CAPTION_OFFSET: i32 = 10;
const BORDER_THICKNESS: u32 = 2;

/// Draws detection boxes and captions onto frames.
pub struct Annotator {
    font: Option<FontVec>,
}

impl Annotator {
    /// Boxes-only annotator (no caption font).
    pub fn new() -> Self {
        Self { font: None }
    }

    /// Load a caption font from a TTF/OTF file.
    pub fn with_font_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read caption font {}", path.display()))?;
        let font = FontVec::try_from_vec(bytes)
            .map_err(|_| anyhow::anyhow!("{} is not a usable font file", path.display()))?;
        Ok(Self { font: Some(font) })
    }

    /// Build from an optional configured font path, degrading to boxes-only
    /// with a single warning when the font cannot be loaded.
    pub fn from_font_config(path: Option<&Path>) -> Self {
        match path {
            Some(path) => match Self::with_font_path(path) {
                Ok(annotator) => annotator,
                Err(err) => {
                    log::warn!("captions disabled: {}", err);
                    Self::new()
                }
            },
            None => {
                log::warn!("no caption font configured; drawing boxes without captions");
                Self::new()
            }
        }
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Draw one accepted detection onto the frame in `color`.
    ///
    /// Coordinates are clamped to the frame; a box fully outside the frame
    /// draws nothing.
    pub fn draw_detection(&self, frame: &mut RgbImage, detection: &Detection, color: [u8; 3]) {
        let (fw, fh) = (frame.width() as i32, frame.height() as i32);
        let x1 = (detection.bbox.x1 as i32).clamp(0, fw - 1);
        let y1 = (detection.bbox.y1 as i32).clamp(0, fh - 1);
        let x2 = (detection.bbox.x2 as i32).clamp(0, fw - 1);
        let y2 = (detection.bbox.y2 as i32).clamp(0, fh - 1);
        if x2 <= x1 || y2 <= y1 {
            return;
        }

        let rgb = Rgb(color);
        // Nested rectangles give a 2px border; imageproc draws 1px outlines.
        // Both corners are inclusive.
        for inset in 0..BORDER_THICKNESS as i32 {
            let w = (x2 - x1 + 1) - 2 * inset;
            let h = (y2 - y1 + 1) - 2 * inset;
            if w <= 0 || h <= 0 {
                break;
            }
            let rect = Rect::at(x1 + inset, y1 + inset).of_size(w as u32, h as u32);
            draw_hollow_rect_mut(frame, rect, rgb);
        }

        if let Some(font) = &self.font {
            let caption = format!("{}: {:.2}", detection.label, detection.confidence);
            let ty = (y1 - CAPTION_OFFSET - CAPTION_SCALE as i32).max(0);
            draw_text_mut(
                frame,
                rgb,
                x1,
                ty,
                PxScale::from(CAPTION_SCALE),
                font,
                &caption,
            );
        }
    }
}

impl Default for Annotator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::BoundingBox;

    fn black_frame() -> RgbImage {
        RgbImage::new(64, 64)
    }

    #[test]
    fn draws_box_outline_in_color() {
        let mut frame = black_frame();
        let det = Detection::new("helmet", 0.9, BoundingBox::new(10.0, 10.0, 40.0, 40.0));
        Annotator::new().draw_detection(&mut frame, &det, [0, 255, 0]);

        // Top-left corner of the outline takes the requirement color.
        assert_eq!(frame.get_pixel(10, 10), &Rgb([0, 255, 0]));
        // Interior stays untouched.
        assert_eq!(frame.get_pixel(25, 25), &Rgb([0, 0, 0]));
    }

    #[test]
    fn box_outside_frame_draws_nothing() {
        let mut frame = black_frame();
        let det = Detection::new("vest", 0.8, BoundingBox::new(100.0, 100.0, 200.0, 200.0));
        Annotator::new().draw_detection(&mut frame, &det, [0, 255, 0]);

        assert!(frame.pixels().all(|p| *p == Rgb([0, 0, 0])));
    }

    #[test]
    fn missing_font_degrades_to_boxes_only() {
        let annotator = Annotator::from_font_config(Some(Path::new("/nonexistent/font.ttf")));
        assert!(!annotator.has_font());
    }
}
