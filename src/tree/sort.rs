use std::cmp::Ordering;

use deunicode::deunicode;

use super::node::TreeNode;

/// Order every node's children: directories first, then by [`collate`].
pub fn sort_tree(node: &mut TreeNode) {
    node.children.sort_by(compare_nodes);
    for child in &mut node.children {
        sort_tree(child);
    }
}

fn compare_nodes(a: &TreeNode, b: &TreeNode) -> Ordering {
    b.is_directory
        .cmp(&a.is_directory)
        .then_with(|| collate(&a.name, &b.name))
}

/// Compare names the way a human-oriented collation does.
///
/// Letters are compared ignoring accents and case first, then accents, then
/// case (lowercase before uppercase), and finally by code point. The result
/// is a total order, so `"a.txt" < "A.txt" < "b.txt"` and `"e" < "é" < "f"`.
///
/// This approximates ICU root collation and differs from it in a few places:
///
/// - Punctuation is not ignored or grouped: it compares by byte value, so
///   `"_a" < "a"` but `"~old" > "zeta"`.
/// - Scripts without Latin letters sort by their romanization, so `"中"`
///   (`zhong`) lands between `"zebra"` and `"zz"`.
/// - Digits compare one character at a time: `"10" < "9"`.
pub fn collate(a: &str, b: &str) -> Ordering {
    deunicode(a)
        .to_lowercase()
        .cmp(&deunicode(b).to_lowercase())
        .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
        .then_with(|| case_key(a).cmp(case_key(b)))
        .then_with(|| a.cmp(b))
}

fn case_key(s: &str) -> impl Iterator<Item = bool> + '_ {
    s.chars().map(char::is_uppercase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{TreeBuilder, path::normalize};
    use pretty_assertions::assert_eq;

    fn built(entries: &[&str]) -> TreeNode {
        let mut builder = TreeBuilder::new("root");
        for raw in entries {
            let p = normalize(raw).unwrap();
            builder.insert(&p.segments, p.is_directory);
        }
        builder.finish()
    }

    fn child_names(node: &TreeNode) -> Vec<&str> {
        node.children.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn directories_before_files() {
        let mut root = built(&["b.txt", "A/", "a.txt"]);
        sort_tree(&mut root);
        assert_eq!(child_names(&root), ["A", "a.txt", "b.txt"]);
        assert!(root.children[0].is_directory);
    }

    #[test]
    fn sorts_recursively() {
        let mut root = built(&["z/y.txt", "z/x/", "z/a.txt"]);
        sort_tree(&mut root);
        assert_eq!(child_names(root.find("z").unwrap()), ["x", "a.txt", "y.txt"]);
    }

    #[test]
    fn collation_is_case_and_accent_aware() {
        let mut names = vec!["b", "B", "A", "é", "a", "f", "e", "Z"];
        names.sort_by(|a, b| collate(a, b));
        assert_eq!(names, ["a", "A", "b", "B", "e", "é", "f", "Z"]);
    }

    #[test]
    fn numbers_sort_before_letters() {
        assert_eq!(collate("10.txt", "a.txt"), Ordering::Less);
        assert_eq!(collate("same", "same"), Ordering::Equal);
    }

    #[test]
    fn differences_from_icu_are_stable() {
        assert_eq!(collate("~old", "zeta"), Ordering::Greater);
        assert_eq!(collate("_a", "a"), Ordering::Less);
        assert_eq!(collate("中", "zebra"), Ordering::Greater);
        assert_eq!(collate("中", "zz"), Ordering::Less);
        assert_eq!(collate("10", "9"), Ordering::Less);
    }

    #[test]
    fn sorting_is_idempotent() {
        let mut root = built(&["c/", "B.txt", "a/", "a/Z", "a/z", "b.txt"]);
        sort_tree(&mut root);
        let once = root.clone();
        sort_tree(&mut root);
        assert_eq!(root, once);
    }
}
