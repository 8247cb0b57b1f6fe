//! Annotated copies of processed images.

use crate::constants::render::{
    BOX_COLOR, BOX_THICKNESS, LABEL_PADDING, LABEL_SCALE, LABEL_TEXT_COLOR, SYSTEM_FONTS,
};
use crate::decode::{BoundingBox, Detection};
use crate::error::{Error, Result};
use ab_glyph::FontVec;
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Draws detection boxes onto copies of processed images.
///
/// Each box gets a `label confidence` caption when a font is loaded;
/// without one only the outlines are drawn.
pub struct Annotator {
    font: Option<FontVec>,
}

impl Annotator {
    /// Outlines only.
    pub const fn plain() -> Self {
        Self { font: None }
    }

    /// Load the caption font from `path`.
    pub fn with_font_path(path: &Path) -> Result<Self> {
        let data = fs::read(path).map_err(|e| Error::FontLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let font = FontVec::try_from_vec(data).map_err(|e| Error::FontLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(Self { font: Some(font) })
    }

    /// Use the first common system font that loads, or none.
    pub fn with_system_font() -> Self {
        for path in SYSTEM_FONTS {
            if let Ok(annotator) = Self::with_font_path(Path::new(path)) {
                info!("Loaded label font: {path}");
                return annotator;
            }
        }
        debug!("No system font found, box labels will be skipped");
        Self::plain()
    }

    /// Whether captions are drawn.
    pub const fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Draw every detection onto a copy of `image`.
    pub fn annotate(&self, image: &DynamicImage, detections: &[Detection]) -> RgbImage {
        let mut canvas = image.to_rgb8();
        for d in detections {
            draw_box(&mut canvas, d.bbox, Rgb(BOX_COLOR), BOX_THICKNESS);
        }
        if let Some(font) = &self.font {
            for d in detections {
                draw_caption(&mut canvas, d, font);
            }
        }
        canvas
    }

    /// Write the annotated copy to `dest`.
    ///
    /// If the annotated image cannot be encoded, the original bytes are copied
    /// instead so the processed path always resolves to an image.
    pub fn write_processed(
        &self,
        image: &DynamicImage,
        original: &[u8],
        detections: &[Detection],
        dest: &Path,
    ) -> Result<()> {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }

        match self.annotate(image, detections).save(dest) {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!(
                    "Could not save annotated copy {}: {e}; copying original",
                    dest.display()
                );
                fs::write(dest, original).map_err(|source| Error::ResultWrite {
                    path: dest.to_path_buf(),
                    source,
                })
            }
        }
    }
}

fn draw_box(img: &mut RgbImage, bbox: BoundingBox, color: Rgb<u8>, thickness: u32) {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return;
    }

    // Boxes may touch the far edge (x2 == width); draw on the last pixel.
    let x0 = bbox.x1.min(w - 1);
    let y0 = bbox.y1.min(h - 1);
    let x1 = bbox.x2.min(w - 1);
    let y1 = bbox.y2.min(h - 1);

    for t in 0..thickness {
        let (xx0, yy0) = (x0 + t, y0 + t);
        let (xx1, yy1) = (x1.saturating_sub(t), y1.saturating_sub(t));
        if xx0 > xx1 || yy0 > yy1 {
            break;
        }
        for x in xx0..=xx1 {
            img.put_pixel(x, yy0, color);
            img.put_pixel(x, yy1, color);
        }
        for y in yy0..=yy1 {
            img.put_pixel(xx0, y, color);
            img.put_pixel(xx1, y, color);
        }
    }
}

/// Caption band above the box, or just inside its top edge when there is no
/// room above.
#[allow(clippy::cast_possible_wrap)]
fn draw_caption(img: &mut RgbImage, detection: &Detection, font: &FontVec) {
    let text = format!("{} {:.2}", detection.label, detection.confidence);
    let (text_w, text_h) = text_size(LABEL_SCALE, font, &text);
    let band_w = text_w + 2 * LABEL_PADDING;
    let band_h = text_h + 2 * LABEL_PADDING;

    let bbox = detection.bbox;
    let top = bbox.y1.checked_sub(band_h).unwrap_or(bbox.y1);

    let (x, y) = (bbox.x1 as i32, top as i32);
    draw_filled_rect_mut(img, Rect::at(x, y).of_size(band_w, band_h), Rgb(BOX_COLOR));
    draw_text_mut(
        img,
        Rgb(LABEL_TEXT_COLOR),
        x + LABEL_PADDING as i32,
        y + LABEL_PADDING as i32,
        LABEL_SCALE,
        font,
        &text,
    );
}
