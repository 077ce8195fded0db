//! Raster image export (PNG / JPEG).

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, RgbaImage};
use log::debug;

use super::layout::{Band, TextMeasure, TreeLayout};
use crate::error::{ZipTreeError, ZipTreeResult};

/// Largest width or height of an exported image, in pixels.
pub const MAX_IMAGE_DIMENSION: u32 = 4096;

/// Upper bound on the raster scale relative to the natural layout.
pub const MAX_SCALE: f32 = 2.0;

pub const DEFAULT_JPEG_QUALITY: u8 = 85;

/// Draws a measured layout into pixels.
pub trait Rasterizer: TextMeasure + Send + Sync {
    /// Draw the part of `layout` at `scale` that falls inside `band`.
    ///
    /// The image is as wide as [`TreeLayout::canvas_size`]`(scale)` and
    /// `band.height` tall; canvas row `band.source_y` is image row 0.
    fn rasterize(&self, layout: &TreeLayout, scale: f32, band: Band) -> ZipTreeResult<RgbaImage>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Png,
    Jpg,
}

impl ImageKind {
    pub fn format(self) -> ImageFormat {
        match self {
            ImageKind::Png => ImageFormat::Png,
            ImageKind::Jpg => ImageFormat::Jpeg,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ImageOptions {
    pub max_dimension: u32,
    /// JPEG quality, 1-100.
    pub jpeg_quality: u8,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            max_dimension: MAX_IMAGE_DIMENSION,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

/// Scale that keeps the larger side within `max_dimension`, capped at 2x.
pub fn raster_scale(width: f32, height: f32, max_dimension: u32) -> f32 {
    let largest = width.max(height);
    if largest <= 0.0 {
        return MAX_SCALE;
    }
    (max_dimension.max(1) as f32 / largest).min(MAX_SCALE)
}

/// Size after shrinking so neither side exceeds `max_dimension`, keeping
/// the aspect ratio. Sizes already within bounds are returned unchanged.
pub fn fit_within(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    let max_dimension = max_dimension.max(1);
    if width <= max_dimension && height <= max_dimension {
        return (width, height);
    }
    let (w, h, max) = (width as u64, height as u64, max_dimension as u64);
    if width > height {
        (max_dimension, ((h * max) / w).max(1) as u32)
    } else {
        (((w * max) / h).max(1) as u32, max_dimension)
    }
}

/// Rasterize `layout` and encode it as `kind`, verifying the result decodes.
pub fn export_image(
    rasterizer: &dyn Rasterizer,
    layout: &TreeLayout,
    kind: ImageKind,
    options: &ImageOptions,
) -> ZipTreeResult<Vec<u8>> {
    let scale = raster_scale(layout.width, layout.height, options.max_dimension);
    debug!(
        "Rasterizing {:.0}x{:.0} layout at scale {:.3}",
        layout.width, layout.height, scale
    );

    let mut canvas = rasterizer.rasterize(layout, scale, layout.full_band(scale))?;

    let (w, h) = fit_within(canvas.width(), canvas.height(), options.max_dimension);
    if (w, h) != canvas.dimensions() {
        debug!(
            "Resizing {}x{} canvas to {}x{}",
            canvas.width(),
            canvas.height(),
            w,
            h
        );
        canvas = imageops::resize(&canvas, w, h, FilterType::Lanczos3);
    }

    let bytes = encode(canvas, kind, options.jpeg_quality)?;
    verify(&bytes, kind.format())?;
    Ok(bytes)
}

pub(crate) fn encode(canvas: RgbaImage, kind: ImageKind, jpeg_quality: u8) -> ZipTreeResult<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    let result = match kind {
        ImageKind::Png => {
            let encoder =
                PngEncoder::new_with_quality(&mut buf, CompressionType::Default, PngFilter::Adaptive);
            canvas.write_with_encoder(encoder)
        }
        ImageKind::Jpg => {
            let rgb = DynamicImage::ImageRgba8(canvas).to_rgb8();
            let encoder = JpegEncoder::new_with_quality(&mut buf, jpeg_quality.clamp(1, 100));
            rgb.write_with_encoder(encoder)
        }
    };
    result.map_err(|e| ZipTreeError::RasterizationFailed(format!("encoding failed: {e}")))?;
    Ok(buf.into_inner())
}

/// The bytes must be non-empty and decode as `format`.
pub(crate) fn verify(bytes: &[u8], format: ImageFormat) -> ZipTreeResult<()> {
    if bytes.is_empty() {
        return Err(ZipTreeError::RasterizationFailed(
            "generated image is empty".into(),
        ));
    }
    image::load_from_memory_with_format(bytes, format)
        .map(|_| ())
        .map_err(|e| ZipTreeError::RasterizationFailed(format!("generated image is corrupted: {e}")))
}
