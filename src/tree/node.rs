use serde::Serialize;

/// One path component of the archive hierarchy.
///
/// Children are owned exclusively by their parent, so the structure is a
/// strict rooted tree. The synthetic root has an empty `path`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    pub name: String,
    pub path: String,
    pub is_directory: bool,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    /// An empty root directory displayed as `name`.
    pub fn root(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: String::new(),
            is_directory: true,
            children: Vec::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.path.is_empty()
    }

    /// Look up a descendant by its full normalized path.
    pub fn find(&self, path: &str) -> Option<&TreeNode> {
        if path.is_empty() {
            return Some(self);
        }

        let mut current = self;
        for segment in path.split('/') {
            current = current.children.iter().find(|c| c.name == segment)?;
        }
        Some(current)
    }

    /// Pre-order iterator over this node and all its descendants.
    pub fn iter(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }

    /// Number of (directories, files) below this node, excluding itself.
    pub fn counts(&self) -> (usize, usize) {
        self.iter()
            .skip(1)
            .fold((0, 0), |(dirs, files), node| {
                if node.is_directory {
                    (dirs + 1, files)
                } else {
                    (dirs, files + 1)
                }
            })
    }
}

pub struct Descendants<'a> {
    stack: Vec<&'a TreeNode>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a TreeNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(name: &str, path: &str, is_directory: bool) -> TreeNode {
        TreeNode {
            name: name.into(),
            path: path.into(),
            is_directory,
            children: Vec::new(),
        }
    }

    fn sample() -> TreeNode {
        let mut src = leaf("src", "src", true);
        src.children.push(leaf("main.rs", "src/main.rs", false));
        let mut root = TreeNode::root("demo");
        root.children.push(src);
        root.children.push(leaf("README.md", "README.md", false));
        root
    }

    #[test]
    fn find_walks_segments() {
        let root = sample();
        assert_eq!(root.find("").map(|n| n.name.as_str()), Some("demo"));
        assert_eq!(
            root.find("src/main.rs").map(|n| n.path.as_str()),
            Some("src/main.rs")
        );
        assert!(root.find("src/lib.rs").is_none());
    }

    #[test]
    fn iter_is_preorder() {
        let root = sample();
        let names: Vec<_> = root.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, ["demo", "src", "main.rs", "README.md"]);
        assert_eq!(root.counts(), (1, 2));
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let json = serde_json::to_value(leaf("a", "a", true)).unwrap();
        assert_eq!(json["isDirectory"], serde_json::json!(true));
        assert_eq!(json["children"], serde_json::json!([]));
    }
}
