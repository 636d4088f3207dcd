//! Image decoding and OCR preprocessing.
//!
//! Raster formats decode through the `image` crate; SVG rasterises through
//! `resvg` first, scaled up so thin glyph strokes survive. Preprocessing is
//! tiered (see [`EnhanceLevel`]): web images carry text at sizes tesseract
//! misreads raw, so the default tier upscales and boosts contrast; the
//! aggressive tier additionally binarises for low-contrast scans.

use std::path::Path;

use crate::config::{EnhanceLevel, ExtractConfig};
use crate::error::ImageError;
use crate::image::ocr;
use image::imageops::FilterType;
use image::{DynamicImage, RgbaImage};
use imageproc::contrast::{threshold, ThresholdType};
use imageproc::filter::{gaussian_blur_f32, median_filter};
use tracing::{debug, warn};

/// Upscale factor for the `Scaled` and `Binarized` tiers.
const SCALE_FACTOR: u32 = 6;
/// Contrast boost applied after grayscale conversion.
const CONTRAST_BOOST: f32 = 25.0;
/// SVGs rasterise with their longer side scaled to this many pixels.
const RASTER_TARGET: f32 = 1000.0;

/// Decode, preprocess and OCR one local image file.
///
/// Never fails: any error in the chain is logged at warning level and
/// yields empty text, so a single broken image cannot abort a document.
pub(crate) fn extract_text(path: &Path, config: &ExtractConfig) -> String {
    match try_extract_text(path, config) {
        Ok(text) => text,
        Err(e) => {
            warn!("image text extraction failed for '{}': {e}", path.display());
            String::new()
        }
    }
}

fn try_extract_text(path: &Path, config: &ExtractConfig) -> Result<String, ImageError> {
    let bitmap = load_bitmap(path)?;
    let Some(prepared) = enhance(&bitmap, config.enhance_level) else {
        debug!("image '{}' has a zero dimension; skipping OCR", path.display());
        return Ok(String::new());
    };
    ocr::recognize(&prepared, config)
}

/// Decode an image file to a bitmap, rasterising SVG when needed.
pub(crate) fn load_bitmap(path: &Path) -> Result<DynamicImage, ImageError> {
    if !path.is_file() {
        return Err(ImageError::Missing { path: path.to_path_buf() });
    }
    let is_svg = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("svg"));
    if is_svg {
        rasterize_svg(path)
    } else {
        image::open(path).map_err(|e| ImageError::Decode {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })
    }
}

/// Rasterise an SVG file, scaling its longer side up to [`RASTER_TARGET`]
/// pixels. Small vector logos rendered at natural size give tesseract
/// nothing to work with.
fn rasterize_svg(path: &Path) -> Result<DynamicImage, ImageError> {
    let svg_err = |detail: String| ImageError::SvgRender {
        path: path.to_path_buf(),
        detail,
    };

    let data = std::fs::read(path)?;
    let mut options = resvg::usvg::Options::default();
    options.fontdb_mut().load_system_fonts();
    let tree = resvg::usvg::Tree::from_data(&data, &options)
        .map_err(|e| svg_err(e.to_string()))?;

    let size = tree.size();
    if size.width() <= 0.0 || size.height() <= 0.0 {
        return Err(svg_err("SVG has no intrinsic size".into()));
    }
    let scale = (RASTER_TARGET / size.width().max(size.height())).max(1.0);
    let width = (size.width() * scale).ceil() as u32;
    let height = (size.height() * scale).ceil() as u32;

    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| svg_err(format!("cannot allocate {width}x{height} pixmap")))?;
    resvg::render(
        &tree,
        resvg::tiny_skia::Transform::from_scale(scale, scale),
        &mut pixmap.as_mut(),
    );

    let raster = RgbaImage::from_raw(width, height, pixmap.take())
        .ok_or_else(|| svg_err("pixmap buffer size mismatch".into()))?;
    debug!("rasterised SVG '{}' at {width}x{height}", path.display());
    Ok(DynamicImage::ImageRgba8(raster))
}

/// Apply the configured preprocessing tier.
///
/// Returns `None` for degenerate (zero-dimension) bitmaps.
pub(crate) fn enhance(img: &DynamicImage, level: EnhanceLevel) -> Option<DynamicImage> {
    let (w, h) = (img.width(), img.height());
    if w == 0 || h == 0 {
        return None;
    }
    if level == EnhanceLevel::Off {
        return Some(img.clone());
    }

    let scaled = img.resize_exact(w * SCALE_FACTOR, h * SCALE_FACTOR, FilterType::Lanczos3);
    let gray = scaled.to_luma8();
    let contrasted = image::imageops::contrast(&gray, CONTRAST_BOOST);
    if level == EnhanceLevel::Scaled {
        return Some(DynamicImage::ImageLuma8(contrasted));
    }

    let blurred = gaussian_blur_f32(&contrasted, 0.8);
    let binary = threshold(&blurred, 127, ThresholdType::Binary);
    let denoised = median_filter(&binary, 1, 1);
    Some(DynamicImage::ImageLuma8(denoised))
}
