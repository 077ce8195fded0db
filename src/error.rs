use thiserror::Error;

/// Failures surfaced to the user while turning an archive into a tree artifact.
///
/// Construction errors are raised before anything is rendered, so a caller
/// never sees a partially built tree. Export errors are raised before any
/// bytes are handed back, so a caller never sees a corrupt artifact.
#[derive(Error, Debug)]
pub enum ZipTreeError {
    /// The archive could not be read or its central directory is corrupt.
    #[error("archive is unreadable: {0}")]
    ArchiveUnreadable(String),

    /// The archive is valid but lists no entries at all.
    #[error("archive is empty")]
    EmptyArchive,

    /// Encoding produced empty or undecodable output. Retrying may succeed.
    #[error("rasterization failed: {0}")]
    RasterizationFailed(String),

    /// A collaborator required for export (such as a font) could not be set up.
    #[error("export library unavailable: {0}")]
    ExportLibraryUnavailable(String),
}

pub type ZipTreeResult<T> = Result<T, ZipTreeError>;

impl ZipTreeError {
    /// Whether the same request may succeed if issued again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ZipTreeError::RasterizationFailed(_))
    }
}
