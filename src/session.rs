//! One interactive flow: load an archive, export its tree, repeat.
//!
//! Loading a new archive supersedes the previous tree. Work still running
//! against a superseded tree finishes, but its result is dropped instead of
//! being shown or merged.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use log::debug;

use crate::error::{ZipTreeError, ZipTreeResult};
use crate::export::{Artifact, ExportFormat, Exporter};
use crate::io::ReadAt;
use crate::tree::{TreeNode, build_tree};
use crate::zip::ZipListing;

/// A fully built, sorted tree. Read-only for the rest of its life.
pub struct LoadedTree {
    generation: u64,
    root: TreeNode,
    /// Serializes exports of this tree.
    export_gate: tokio::sync::Mutex<()>,
}

impl LoadedTree {
    pub fn root(&self) -> &TreeNode {
        &self.root
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Default)]
pub struct Session {
    generation: AtomicU64,
    current: Mutex<Option<Arc<LoadedTree>>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the archive listing and build its tree.
    ///
    /// Starting a load supersedes the current tree. Returns `Ok(None)` if
    /// another load started before this one finished. On error the session
    /// is left without a tree; nothing partial ever becomes visible.
    pub async fn load<R: ReadAt + 'static>(
        &self,
        reader: Arc<R>,
        root_name: &str,
    ) -> ZipTreeResult<Option<Arc<LoadedTree>>> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let built = match ZipListing::new(reader).entry_paths().await {
            Ok(entries) => build_tree(root_name, entries),
            Err(e) => Err(ZipTreeError::ArchiveUnreadable(format!("{e:#}"))),
        };
        self.settle(generation, built)
    }

    /// Build a tree from an already available listing.
    pub fn load_entries<I, S>(
        &self,
        root_name: &str,
        entries: I,
    ) -> ZipTreeResult<Option<Arc<LoadedTree>>>
    where
        I: IntoIterator<Item = (S, bool)>,
        S: AsRef<str>,
    {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.settle(generation, build_tree(root_name, entries))
    }

    fn settle(
        &self,
        generation: u64,
        built: ZipTreeResult<TreeNode>,
    ) -> ZipTreeResult<Option<Arc<LoadedTree>>> {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        if self.is_stale(generation) {
            debug!("Discarding load #{}, superseded by a newer load", generation);
            return built.map(|_| None);
        }

        let root = match built {
            Ok(root) => root,
            Err(e) => {
                *current = None;
                return Err(e);
            }
        };

        let (dirs, files) = root.counts();
        debug!(
            "Tree #{} ready: {} directories, {} files",
            generation, dirs, files
        );

        let tree = Arc::new(LoadedTree {
            generation,
            root,
            export_gate: tokio::sync::Mutex::new(()),
        });
        *current = Some(tree.clone());
        Ok(Some(tree))
    }

    /// The most recently installed tree.
    pub fn current(&self) -> Option<Arc<LoadedTree>> {
        self.current
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn is_stale(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) != generation
    }

    /// Export `tree` on a blocking worker.
    ///
    /// At most one export per tree runs at a time. Returns `Ok(None)` if the
    /// tree was superseded while the export ran.
    pub async fn export(
        &self,
        tree: &Arc<LoadedTree>,
        exporter: &Exporter,
        format: ExportFormat,
    ) -> ZipTreeResult<Option<Artifact>> {
        let _gate = tree.export_gate.lock().await;

        if self.is_stale(tree.generation) {
            debug!("Skipping {:?} export of superseded tree #{}", format, tree.generation);
            return Ok(None);
        }

        let snapshot = Arc::clone(tree);
        let exporter = exporter.clone();
        let artifact = tokio::task::spawn_blocking(move || exporter.export(&snapshot.root, format))
            .await
            .map_err(|e| ZipTreeError::RasterizationFailed(format!("export task failed: {e}")))??;

        if self.is_stale(tree.generation) {
            debug!("Dropping {:?} export of superseded tree #{}", format, tree.generation);
            return Ok(None);
        }

        Ok(Some(artifact))
    }
}
