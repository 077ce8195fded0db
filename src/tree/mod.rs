//! Reconstruction of the directory hierarchy implied by an archive listing.
//!
//! ```text
//! raw entry names ──normalize──▶ segments ──TreeBuilder──▶ TreeNode ──sort_tree──▶ sorted tree
//! ```
//!
//! The tree is built in one pass over the listing and sorted once. It is
//! read-only afterwards.

mod builder;
mod node;
pub mod path;
mod sort;

pub use builder::TreeBuilder;
pub use node::{Descendants, TreeNode};
pub use path::{NormalizedPath, normalize};
pub use sort::{collate, sort_tree};

use log::debug;

use crate::error::{ZipTreeError, ZipTreeResult};

/// Build and sort the tree for one archive listing.
///
/// `entries` are `(entry path, directory marker)` pairs in archive order.
/// A listing with no entries at all is [`ZipTreeError::EmptyArchive`].
/// Entries that normalize to nothing are skipped.
pub fn build_tree<I, S>(root_name: &str, entries: I) -> ZipTreeResult<TreeNode>
where
    I: IntoIterator<Item = (S, bool)>,
    S: AsRef<str>,
{
    let mut builder = TreeBuilder::new(root_name);
    let mut seen = 0usize;
    let mut skipped = 0usize;

    for (raw, marker) in entries {
        seen += 1;
        match normalize(raw.as_ref()) {
            Some(path) => builder.insert(&path.segments, path.is_directory || marker),
            None => skipped += 1,
        }
    }

    if seen == 0 {
        return Err(ZipTreeError::EmptyArchive);
    }

    debug!(
        "Built {} nodes from {} entries ({} skipped)",
        builder.len(),
        seen,
        skipped
    );

    let mut root = builder.finish();
    sort_tree(&mut root);
    Ok(root)
}
