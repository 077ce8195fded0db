//! ZIP archive listing.
//!
//! This module reads the file listing of a ZIP archive, supporting both the
//! standard format and ZIP64 extensions for large archives. No entry data is
//! ever decompressed: the tree only needs names.
//!
//! ## Architecture
//!
//! - [`structures`]: Data structures representing ZIP format elements (EOCD, entries)
//! - [`parser`]: Low-level parsing of ZIP structures from raw bytes
//! - [`listing`]: High-level listing API used by the session
//!
//! ## ZIP Format Overview
//!
//! A ZIP file consists of:
//! 1. Local file headers and compressed data for each file
//! 2. Central Directory with metadata for all files
//! 3. End of Central Directory (EOCD) record at the end
//!
//! The EOCD is read first (from the end of the file), then the Central
//! Directory, so listing never reads the whole archive.
//!
//! ## Limitations
//!
//! - No multi-disk archive support
//! - Names that are not UTF-8 are decoded lossily

mod listing;
mod parser;
mod structures;

pub use listing::ZipListing;
pub use parser::ZipParser;
pub use structures::*;
