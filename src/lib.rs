//! # ziptree
//!
//! Render the directory tree of a ZIP archive.
//!
//! Only the central directory is read, so remote archives served with HTTP
//! Range support are listed without downloading the file data. The listing
//! is normalized into a sorted tree (directories first, locale-aware name
//! order) that can be exported as text, JSON, PNG/JPEG or a paginated PDF.
//!
//! ## Pipeline
//!
//! - [`zip::ZipListing`]: raw entry paths from the central directory
//! - [`tree::build_tree`]: normalization, de-duplication and sorting
//! - [`render::render`]: one [`render::TreeLine`] per node
//! - [`export::Exporter`]: verified artifacts
//! - [`session::Session`]: one load/export flow that drops superseded work
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use ziptree::{ExportFormat, ExportOptions, Exporter, LocalFileReader, Session};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let reader = Arc::new(LocalFileReader::new("project.zip".as_ref())?);
//!
//!     let session = Session::new();
//!     let Some(tree) = session.load(reader, "project").await? else {
//!         return Ok(());
//!     };
//!
//!     let exporter = Exporter::text_only(ExportOptions::default());
//!     if let Some(artifact) = session.export(&tree, &exporter, ExportFormat::Txt).await? {
//!         print!("{}", String::from_utf8_lossy(&artifact.bytes));
//!     }
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod error;
pub mod export;
pub mod io;
pub mod render;
pub mod session;
pub mod tree;
pub mod zip;

pub use cli::Cli;
pub use error::{ZipTreeError, ZipTreeResult};
pub use export::{
    Artifact, ExportFormat, ExportOptions, Exporter, FontRasterizer, Rasterizer, TextMeasure,
};
pub use io::{HttpRangeReader, LocalFileReader, ReadAt};
pub use render::{Indicators, TreeLine};
pub use session::{LoadedTree, Session};
pub use tree::{TreeNode, build_tree};
pub use zip::{ZipFileEntry, ZipListing};
