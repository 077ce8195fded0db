//! Paginated PDF export.
//!
//! All geometry is computed here; `lopdf` only receives finished pages with
//! image bands and their placement.

use std::io::Write;

use flate2::Compression;
use flate2::write::ZlibEncoder;
use image::{DynamicImage, RgbaImage};
use log::debug;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, dictionary};

use super::layout::{Band, TreeLayout};
use super::raster::Rasterizer;
use crate::error::{ZipTreeError, ZipTreeResult};

/// Millimetres per CSS pixel (96 dpi).
pub const PX_TO_MM: f32 = 0.264583;

const PT_PER_MM: f32 = 72.0 / 25.4;
const TITLE_SIZE: i64 = 16;
/// Title baseline sits this far above the top margin.
const TITLE_OFFSET_MM: f32 = 5.0;

pub const DEFAULT_TITLE: &str = "Project Tree Structure";

/// Tallest canvas a PDF is planned on, in pixels. Taller trees are drawn
/// at a lower scale, down to 1.
pub const MAX_PDF_CANVAS_HEIGHT: u32 = 60_000;

/// Physical page in millimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width_mm: f32,
    pub height_mm: f32,
    pub margin_mm: f32,
}

impl PageGeometry {
    pub const A4: PageGeometry = PageGeometry {
        width_mm: 210.0,
        height_mm: 297.0,
        margin_mm: 15.0,
    };

    pub fn usable_width(&self) -> f32 {
        self.width_mm - 2.0 * self.margin_mm
    }

    pub fn usable_height(&self) -> f32 {
        self.height_mm - 2.0 * self.margin_mm
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::A4
    }
}

/// Rectangle on a page, in millimetres from the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x_mm: f32,
    pub y_mm: f32,
    pub width_mm: f32,
    pub height_mm: f32,
}

/// One output page: which band of the canvas goes where.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PagePlan {
    pub band: Band,
    pub placement: Placement,
}

/// Canvas scale for a layout of `width` x `height` natural pixels.
///
/// Twice the fit-to-width factor, kept between 1 and 2 so narrow content is
/// sharp and wide content is not oversampled. The canvas is kept within
/// [`MAX_PDF_CANVAS_HEIGHT`] unless that would need a scale below 1.
pub fn canvas_scale(geometry: &PageGeometry, width: f32, height: f32) -> f32 {
    let width_mm = width * PX_TO_MM;
    let height_mm = height * PX_TO_MM;
    let fit = if height_mm <= geometry.usable_height() {
        fit_factor(geometry, width_mm, height_mm)
    } else {
        (geometry.usable_width() / width_mm).min(1.0)
    };
    let height_cap = MAX_PDF_CANVAS_HEIGHT as f32 / height;
    (fit * 2.0).clamp(1.0, 2.0).min(height_cap).max(1.0)
}

fn fit_factor(geometry: &PageGeometry, width_mm: f32, height_mm: f32) -> f32 {
    (geometry.usable_width() / width_mm)
        .min(geometry.usable_height() / height_mm)
        .min(1.0)
}

/// Cut `[0, height)` into consecutive bands of at most `band_height` rows.
pub fn slice_bands(height: u32, band_height: u32) -> Vec<Band> {
    let band_height = band_height.max(1);
    let mut bands = Vec::with_capacity(height.div_ceil(band_height) as usize);
    let mut y = 0;
    while y < height {
        let h = band_height.min(height - y);
        bands.push(Band {
            source_y: y,
            height: h,
        });
        y += h;
    }
    bands
}

/// Lay a `canvas_width` x `canvas_height` canvas rendered at `scale` onto pages.
///
/// Content that fits the usable height goes on one page, scaled to fit and
/// centred horizontally. Taller content is sliced into bands one usable
/// page height tall; bands wider than the usable width are scaled down.
pub fn paginate(
    geometry: &PageGeometry,
    canvas_width: u32,
    canvas_height: u32,
    scale: f32,
) -> Vec<PagePlan> {
    let mm_per_px = PX_TO_MM / scale;
    let width_mm = canvas_width as f32 * mm_per_px;
    let height_mm = canvas_height as f32 * mm_per_px;

    if height_mm <= geometry.usable_height() {
        let fit = fit_factor(geometry, width_mm, height_mm);
        let (w, h) = (width_mm * fit, height_mm * fit);
        return vec![PagePlan {
            band: Band {
                source_y: 0,
                height: canvas_height,
            },
            placement: Placement {
                x_mm: (geometry.width_mm - w) / 2.0,
                y_mm: geometry.margin_mm,
                width_mm: w,
                height_mm: h,
            },
        }];
    }

    let band_px = (geometry.usable_height() / mm_per_px).floor() as u32;
    slice_bands(canvas_height, band_px)
        .into_iter()
        .map(|band| {
            let mut w = width_mm;
            let mut h = band.height as f32 * mm_per_px;
            if w > geometry.usable_width() {
                let shrink = geometry.usable_width() / w;
                w = geometry.usable_width();
                h *= shrink;
            }
            PagePlan {
                band,
                placement: Placement {
                    x_mm: geometry.margin_mm,
                    y_mm: geometry.margin_mm,
                    width_mm: w,
                    height_mm: h,
                },
            }
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct PdfOptions {
    pub geometry: PageGeometry,
    pub title: String,
}

impl Default for PdfOptions {
    fn default() -> Self {
        Self {
            geometry: PageGeometry::A4,
            title: DEFAULT_TITLE.to_string(),
        }
    }
}

/// Paginate `layout`, rasterize it one page band at a time and write a
/// verified PDF. At most one band is held in memory.
pub fn export_pdf(
    rasterizer: &dyn Rasterizer,
    layout: &TreeLayout,
    options: &PdfOptions,
) -> ZipTreeResult<Vec<u8>> {
    let scale = canvas_scale(&options.geometry, layout.width, layout.height);
    let (width, height) = layout.canvas_size(scale);
    let plans = paginate(&options.geometry, width, height, scale);
    debug!(
        "PDF: {}x{} canvas at scale {:.2} over {} page(s)",
        width,
        height,
        scale,
        plans.len()
    );

    let mut writer = PdfWriter::new(options.geometry);
    for (index, plan) in plans.iter().enumerate() {
        let band = rasterizer.rasterize(layout, scale, plan.band)?;
        if band.dimensions() != (width, plan.band.height) {
            return Err(ZipTreeError::RasterizationFailed(format!(
                "band at row {} is {}x{}, expected {}x{}",
                plan.band.source_y,
                band.width(),
                band.height(),
                width,
                plan.band.height
            )));
        }
        let title = (index == 0).then_some(options.title.as_str());
        writer.add_page(band, &plan.placement, title)?;
    }

    let bytes = writer.finish()?;
    verify_pdf(&bytes, plans.len())?;
    Ok(bytes)
}

/// Composites image bands onto pages.
struct PdfWriter {
    doc: Document,
    pages_id: ObjectId,
    font_id: ObjectId,
    page_ids: Vec<ObjectId>,
    geometry: PageGeometry,
}

impl PdfWriter {
    fn new(geometry: PageGeometry) -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        Self {
            doc,
            pages_id,
            font_id,
            page_ids: Vec::new(),
            geometry,
        }
    }

    fn add_page(
        &mut self,
        band: RgbaImage,
        placement: &Placement,
        title: Option<&str>,
    ) -> ZipTreeResult<()> {
        let image_id = self.add_image(band)?;
        let page_height_pt = self.geometry.height_mm * PT_PER_MM;

        let x = placement.x_mm * PT_PER_MM;
        let y = page_height_pt - (placement.y_mm + placement.height_mm) * PT_PER_MM;
        let w = placement.width_mm * PT_PER_MM;
        let h = placement.height_mm * PT_PER_MM;

        let mut operations = vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![w.into(), 0.into(), 0.into(), h.into(), x.into(), y.into()],
            ),
            Operation::new("Do", vec!["Im0".into()]),
            Operation::new("Q", vec![]),
        ];

        if let Some(title) = title {
            let tx = self.geometry.margin_mm * PT_PER_MM;
            let ty = page_height_pt - (self.geometry.margin_mm - TITLE_OFFSET_MM) * PT_PER_MM;
            operations.extend([
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), TITLE_SIZE.into()]),
                Operation::new("Td", vec![tx.into(), ty.into()]),
                Operation::new("Tj", vec![Object::string_literal(title)]),
                Operation::new("ET", vec![]),
            ]);
        }

        let content = Content { operations }
            .encode()
            .map_err(|e| ZipTreeError::RasterizationFailed(format!("PDF content: {e}")))?;
        let content_id = self.doc.add_object(Stream::new(dictionary! {}, content));

        let resources_id = self.doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => self.font_id },
            "XObject" => dictionary! { "Im0" => image_id },
        });

        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        self.page_ids.push(page_id);
        Ok(())
    }

    fn add_image(&mut self, band: RgbaImage) -> ZipTreeResult<ObjectId> {
        let rgb = DynamicImage::ImageRgba8(band).into_rgb8();

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(rgb.as_raw())
            .map_err(|e| ZipTreeError::RasterizationFailed(format!("PDF image: {e}")))?;
        let compressed = encoder
            .finish()
            .map_err(|e| ZipTreeError::RasterizationFailed(format!("PDF image: {e}")))?;

        let stream = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => rgb.width() as i64,
                "Height" => rgb.height() as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "FlateDecode",
            },
            compressed,
        );
        Ok(self.doc.add_object(stream))
    }

    fn finish(mut self) -> ZipTreeResult<Vec<u8>> {
        let width_pt = self.geometry.width_mm * PT_PER_MM;
        let height_pt = self.geometry.height_mm * PT_PER_MM;
        let count = self.page_ids.len() as i64;
        let kids: Vec<Object> = self.page_ids.iter().map(|&id| id.into()).collect();

        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => vec![0.into(), 0.into(), width_pt.into(), height_pt.into()],
        };
        self.doc
            .objects
            .insert(self.pages_id, Object::Dictionary(pages));

        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);
        self.doc.compress();

        let mut bytes = Vec::new();
        self.doc
            .save_to(&mut bytes)
            .map_err(|e| ZipTreeError::RasterizationFailed(format!("PDF write: {e}")))?;
        Ok(bytes)
    }
}

/// The document must be non-empty, parse, and have the expected page count.
fn verify_pdf(bytes: &[u8], expected_pages: usize) -> ZipTreeResult<()> {
    if bytes.is_empty() {
        return Err(ZipTreeError::RasterizationFailed(
            "generated PDF is empty".into(),
        ));
    }
    let doc = Document::load_mem(bytes).map_err(|e| {
        ZipTreeError::RasterizationFailed(format!("generated PDF is corrupted: {e}"))
    })?;
    let pages = doc.get_pages().len();
    if pages != expected_pages {
        return Err(ZipTreeError::RasterizationFailed(format!(
            "generated PDF has {pages} pages, expected {expected_pages}"
        )));
    }
    Ok(())
}
