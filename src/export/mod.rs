//! Turning a sorted tree into downloadable artifacts.
//!
//! - [`layout`]: natural pixel geometry of the rendered lines
//! - [`raster`]: the [`Rasterizer`] seam plus PNG/JPEG encoding and checks
//! - [`font`]: the built-in TrueType rasterizer
//! - [`pdf`]: page slicing math and the PDF writer
//!
//! Text and JSON need no rasterizer. Every binary artifact is decoded again
//! before it is returned, so callers never receive a corrupt file.

pub mod font;
pub mod layout;
pub mod pdf;
pub mod raster;

use std::sync::Arc;

use clap::ValueEnum;

pub use font::FontRasterizer;
pub use layout::{Band, TextMeasure, TreeLayout};
pub use pdf::{PageGeometry, PdfOptions};
pub use raster::{ImageKind, ImageOptions, Rasterizer};

use crate::error::{ZipTreeError, ZipTreeResult};
use crate::render::{Indicators, render, render_text};
use crate::tree::TreeNode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Txt,
    Json,
    Png,
    #[value(alias = "jpeg")]
    Jpg,
    Pdf,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Txt => "txt",
            ExportFormat::Json => "json",
            ExportFormat::Png => "png",
            ExportFormat::Jpg => "jpg",
            ExportFormat::Pdf => "pdf",
        }
    }

    pub fn needs_rasterizer(self) -> bool {
        matches!(
            self,
            ExportFormat::Png | ExportFormat::Jpg | ExportFormat::Pdf
        )
    }
}

/// A verified export result.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub format: ExportFormat,
    pub bytes: Vec<u8>,
}

impl Artifact {
    /// `<root name>-tree.<ext>`
    pub fn file_name(&self, root_name: &str) -> String {
        format!("{}-tree.{}", root_name, self.format.extension())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    pub indicators: Indicators,
    pub image: ImageOptions,
    pub pdf: PdfOptions,
}

/// Produces artifacts for a tree. Cheap to clone and safe to move onto a
/// blocking worker.
#[derive(Clone)]
pub struct Exporter {
    rasterizer: Option<Arc<dyn Rasterizer>>,
    options: ExportOptions,
}

impl Exporter {
    /// An exporter limited to text and JSON.
    pub fn text_only(options: ExportOptions) -> Self {
        Self {
            rasterizer: None,
            options,
        }
    }

    pub fn new(rasterizer: Arc<dyn Rasterizer>, options: ExportOptions) -> Self {
        Self {
            rasterizer: Some(rasterizer),
            options,
        }
    }

    pub fn export(&self, root: &TreeNode, format: ExportFormat) -> ZipTreeResult<Artifact> {
        let bytes = match format {
            ExportFormat::Txt => render_text(root, self.options.indicators).into_bytes(),
            // A TreeNode holds only strings, bools and vectors, so encoding
            // cannot fail; a failure here would be a serde_json bug.
            ExportFormat::Json => serde_json::to_vec_pretty(root).map_err(|e| {
                ZipTreeError::ExportLibraryUnavailable(format!("serde_json could not encode the tree: {e}"))
            })?,
            ExportFormat::Png | ExportFormat::Jpg | ExportFormat::Pdf => {
                let rasterizer = self.rasterizer.as_deref().ok_or_else(|| {
                    ZipTreeError::ExportLibraryUnavailable(format!(
                        "{} export needs a rasterizer",
                        format.extension()
                    ))
                })?;
                let layout = TreeLayout::measure(&render(root), rasterizer);
                match format {
                    ExportFormat::Png => {
                        raster::export_image(rasterizer, &layout, ImageKind::Png, &self.options.image)?
                    }
                    ExportFormat::Jpg => {
                        raster::export_image(rasterizer, &layout, ImageKind::Jpg, &self.options.image)?
                    }
                    _ => pdf::export_pdf(rasterizer, &layout, &self.options.pdf)?,
                }
            }
        };

        Ok(Artifact { format, bytes })
    }
}
