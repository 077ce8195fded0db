//! Built-in rasterizer drawing with a TrueType font.

use std::path::{Path, PathBuf};

use ab_glyph::{Font, FontVec, PxScale, ScaleFont, point};
use image::{Rgba, RgbaImage};
use log::debug;

use super::layout::{
    Band, FONT_PX, ICON_SIZE, LayoutRow, ROW_HEIGHT, TextMeasure, TreeLayout,
};
use super::raster::Rasterizer;
use crate::error::{ZipTreeError, ZipTreeResult};
use crate::render::Connector;

const BACKGROUND: Rgba<u8> = Rgba([0xf8, 0xf9, 0xfa, 0xff]);
const GUIDE: Rgba<u8> = Rgba([0xad, 0xb5, 0xbd, 0xff]);
const FOLDER_ICON: Rgba<u8> = Rgba([0xf0, 0xad, 0x4e, 0xff]);
const FILE_ICON: Rgba<u8> = Rgba([0x8a, 0x9b, 0xa8, 0xff]);
const FOLDER_TEXT: Rgba<u8> = Rgba([0x1f, 0x4e, 0x79, 0xff]);
const FILE_TEXT: Rgba<u8> = Rgba([0x34, 0x3a, 0x40, 0xff]);

/// Fonts tried in order when none is configured.
const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSansMono.ttf",
    "/usr/share/fonts/TTF/DejaVuSansMono.ttf",
    "/usr/share/fonts/dejavu/DejaVuSansMono.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationMono-Regular.ttf",
    "/usr/share/fonts/liberation-mono/LiberationMono-Regular.ttf",
    "/usr/share/fonts/truetype/noto/NotoSansMono-Regular.ttf",
    "/System/Library/Fonts/Menlo.ttc",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\consola.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

pub struct FontRasterizer {
    font: FontVec,
}

impl FontRasterizer {
    /// Load `path`, or the first usable system font when `path` is `None`.
    pub fn load(path: Option<&Path>) -> ZipTreeResult<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => SYSTEM_FONTS
                .iter()
                .map(PathBuf::from)
                .filter(|p| p.is_file())
                .find_map(|p| Self::from_file(&p).ok())
                .ok_or_else(|| {
                    ZipTreeError::ExportLibraryUnavailable(
                        "no usable system font found; pass one with --font".into(),
                    )
                }),
        }
    }

    pub fn from_file(path: &Path) -> ZipTreeResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            ZipTreeError::ExportLibraryUnavailable(format!(
                "cannot read font {}: {e}",
                path.display()
            ))
        })?;
        let rasterizer = Self::from_bytes(bytes)?;
        debug!("Loaded font {}", path.display());
        Ok(rasterizer)
    }

    pub fn from_bytes(bytes: Vec<u8>) -> ZipTreeResult<Self> {
        let font = FontVec::try_from_vec(bytes).map_err(|e| {
            ZipTreeError::ExportLibraryUnavailable(format!("invalid font: {e}"))
        })?;
        Ok(Self { font })
    }

    fn draw_row(&self, canvas: &mut RgbaImage, row: &LayoutRow, pen: Pen) {
        let line = &row.line;
        let middle = row.middle();
        // At least one device pixel wide.
        let stroke = pen.scale.max(1.0) / pen.scale;

        // Continuing guides of the ancestors.
        for (level, &continues) in line.guides.iter().enumerate() {
            if continues {
                let x = LayoutRow::guide_x(level + 1);
                fill_rect(canvas, pen, x, row.top, stroke, ROW_HEIGHT, GUIDE);
            }
        }

        // Own connector: down to the middle (or through for a tee), then across.
        if let Some(connector) = line.connector {
            let x = LayoutRow::guide_x(line.depth);
            let height = match connector {
                Connector::Tee => ROW_HEIGHT,
                Connector::Elbow => ROW_HEIGHT / 2.0,
            };
            fill_rect(canvas, pen, x, row.top, stroke, height, GUIDE);
            fill_rect(canvas, pen, x, middle, row.icon_x - x - 2.0, stroke, GUIDE);
        }

        let (icon, text) = if line.is_directory {
            (FOLDER_ICON, FOLDER_TEXT)
        } else {
            (FILE_ICON, FILE_TEXT)
        };
        fill_rect(
            canvas,
            pen,
            row.icon_x,
            middle - ICON_SIZE / 2.0,
            ICON_SIZE,
            ICON_SIZE,
            icon,
        );

        let px = FONT_PX * pen.scale;
        let scaled = self.font.as_scaled(PxScale::from(px));
        let baseline = pen.y(middle) + (scaled.ascent() + scaled.descent()) / 2.0;
        self.draw_text(canvas, &line.name, pen.x(row.text_x), baseline, px, text);
    }

    fn draw_text(&self, canvas: &mut RgbaImage, text: &str, x: f32, baseline: f32, px: f32, color: Rgba<u8>) {
        let scaled = self.font.as_scaled(PxScale::from(px));
        let mut caret = x;
        let mut previous = None;

        for c in text.chars() {
            let id = scaled.glyph_id(c);
            if let Some(prev) = previous {
                caret += scaled.kern(prev, id);
            }
            let glyph = id.with_scale_and_position(px, point(caret, baseline));
            caret += scaled.h_advance(id);
            previous = Some(id);

            let Some(outlined) = self.font.outline_glyph(glyph) else {
                continue;
            };
            let bounds = outlined.px_bounds();
            outlined.draw(|gx, gy, coverage| {
                let x = bounds.min.x as i64 + gx as i64;
                let y = bounds.min.y as i64 + gy as i64;
                if x < 0 || y < 0 || x >= canvas.width() as i64 || y >= canvas.height() as i64 {
                    return;
                }
                blend(canvas.get_pixel_mut(x as u32, y as u32), color, coverage);
            });
        }
    }
}

/// Maps layout units onto a band canvas whose row 0 is canvas row `origin_y`.
#[derive(Debug, Clone, Copy)]
struct Pen {
    scale: f32,
    origin_y: f32,
}

impl Pen {
    fn x(self, x: f32) -> f32 {
        x * self.scale
    }

    fn y(self, y: f32) -> f32 {
        y * self.scale - self.origin_y
    }
}

impl TextMeasure for FontRasterizer {
    fn text_width(&self, text: &str, px: f32) -> f32 {
        let scaled = self.font.as_scaled(PxScale::from(px));
        let mut width = 0.0;
        let mut previous = None;
        for c in text.chars() {
            let id = scaled.glyph_id(c);
            if let Some(prev) = previous {
                width += scaled.kern(prev, id);
            }
            width += scaled.h_advance(id);
            previous = Some(id);
        }
        width
    }
}

impl Rasterizer for FontRasterizer {
    fn rasterize(&self, layout: &TreeLayout, scale: f32, band: Band) -> ZipTreeResult<RgbaImage> {
        if !(scale.is_finite() && scale > 0.0) {
            return Err(ZipTreeError::RasterizationFailed(format!(
                "invalid scale {scale}"
            )));
        }
        let (width, _) = layout.canvas_size(scale);
        let mut canvas = RgbaImage::from_pixel(width, band.height, BACKGROUND);
        let pen = Pen {
            scale,
            origin_y: band.source_y as f32,
        };

        // Only rows that reach into the band, in layout units.
        let top = band.source_y as f32 / scale;
        let bottom = band.end() as f32 / scale;
        for row in layout
            .rows
            .iter()
            .filter(|row| row.top < bottom && row.top + ROW_HEIGHT > top)
        {
            self.draw_row(&mut canvas, row, pen);
        }
        Ok(canvas)
    }
}

/// Fill a rectangle given in layout units, clipped to the canvas.
fn fill_rect(
    canvas: &mut RgbaImage,
    pen: Pen,
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    color: Rgba<u8>,
) {
    if width <= 0.0 || height <= 0.0 {
        return;
    }
    let x0 = pen.x(x).floor().max(0.0) as u32;
    let y0 = pen.y(y).floor().max(0.0) as u32;
    let x1 = (pen.x(x + width).ceil().max(0.0) as u32).min(canvas.width());
    let y1 = (pen.y(y + height).ceil().max(0.0) as u32).min(canvas.height());
    for py in y0..y1 {
        for px in x0..x1 {
            canvas.put_pixel(px, py, color);
        }
    }
}

fn blend(pixel: &mut Rgba<u8>, color: Rgba<u8>, coverage: f32) {
    let alpha = coverage.clamp(0.0, 1.0);
    for i in 0..3 {
        let mixed = pixel.0[i] as f32 * (1.0 - alpha) + color.0[i] as f32 * alpha;
        pixel.0[i] = mixed.round() as u8;
    }
}
