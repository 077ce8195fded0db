use std::sync::Arc;

use crate::io::ReadAt;
use anyhow::Result;
use log::debug;

use super::parser::ZipParser;
use super::structures::ZipFileEntry;

/// Lists the entries of a ZIP archive without touching file data.
pub struct ZipListing<R: ReadAt> {
    parser: ZipParser<R>,
}

impl<R: ReadAt> ZipListing<R> {
    pub fn new(reader: Arc<R>) -> Self {
        Self {
            parser: ZipParser::new(reader),
        }
    }

    /// All entries in archive storage order.
    pub async fn entries(&self) -> Result<Vec<ZipFileEntry>> {
        let entries = self.parser.list_files().await?;

        let directories = entries.iter().filter(|e| e.is_directory).count();
        // Sizes are unchecked archive data; a crafted listing must not overflow.
        let total_size = entries
            .iter()
            .fold(0u64, |total, e| total.saturating_add(e.uncompressed_size));
        debug!(
            "Listed {} entries ({} directory markers, {} bytes uncompressed)",
            entries.len(),
            directories,
            total_size
        );

        Ok(entries)
    }

    /// `(entry path, directory marker)` pairs in archive storage order.
    pub async fn entry_paths(&self) -> Result<Vec<(String, bool)>> {
        Ok(self
            .entries()
            .await?
            .into_iter()
            .map(|e| (e.file_name, e.is_directory))
            .collect())
    }
}
