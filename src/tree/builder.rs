use std::collections::HashMap;

use super::node::TreeNode;

const ROOT: usize = 0;

/// A node while the tree is being assembled. Children are arena indices.
struct Slot {
    name: String,
    path: String,
    is_directory: bool,
    children: Vec<usize>,
}

/// Folds normalized entry paths into a single rooted tree.
///
/// Nodes live in an arena indexed by their full path, so each segment lookup
/// is a hash lookup regardless of how many siblings a directory has. The
/// arena is turned into an owned [`TreeNode`] hierarchy by [`finish`].
///
/// The first classification a path receives wins: a path created as an
/// intermediate directory stays a directory, and a path first seen as a file
/// stays a file even if a later entry lists it with a trailing separator.
///
/// [`finish`]: TreeBuilder::finish
pub struct TreeBuilder {
    slots: Vec<Slot>,
    index: HashMap<String, usize>,
}

impl TreeBuilder {
    pub fn new(root_name: impl Into<String>) -> Self {
        let root = Slot {
            name: root_name.into(),
            path: String::new(),
            is_directory: true,
            children: Vec::new(),
        };
        let mut index = HashMap::new();
        index.insert(String::new(), ROOT);
        Self {
            slots: vec![root],
            index,
        }
    }

    /// Insert one entry, creating any missing intermediate directories.
    ///
    /// Never fails: an empty `segments` slice leaves the tree unchanged.
    pub fn insert<S: AsRef<str>>(&mut self, segments: &[S], is_directory_entry: bool) {
        let mut current = ROOT;
        let mut path = String::new();

        for (i, segment) in segments.iter().enumerate() {
            let segment = segment.as_ref();
            if !path.is_empty() {
                path.push('/');
            }
            path.push_str(segment);

            current = match self.index.get(&path) {
                Some(&id) => id,
                None => {
                    let is_last = i + 1 == segments.len();
                    self.add_child(current, segment, &path, !is_last || is_directory_entry)
                }
            };
        }
    }

    fn add_child(&mut self, parent: usize, name: &str, path: &str, is_directory: bool) -> usize {
        let id = self.slots.len();
        self.slots.push(Slot {
            name: name.to_owned(),
            path: path.to_owned(),
            is_directory,
            children: Vec::new(),
        });
        self.slots[parent].children.push(id);
        self.index.insert(path.to_owned(), id);
        id
    }

    /// Number of nodes, the root included.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True while only the root exists.
    pub fn is_empty(&self) -> bool {
        self.slots.len() == 1
    }

    /// Consume the arena and return the owned tree, children in insertion order.
    pub fn finish(mut self) -> TreeNode {
        self.take(ROOT)
    }

    fn take(&mut self, id: usize) -> TreeNode {
        let slot = &mut self.slots[id];
        let name = std::mem::take(&mut slot.name);
        let path = std::mem::take(&mut slot.path);
        let is_directory = slot.is_directory;
        let child_ids = std::mem::take(&mut slot.children);

        let children = child_ids.into_iter().map(|child| self.take(child)).collect();

        TreeNode {
            name,
            path,
            is_directory,
            children,
        }
    }
}
