use std::collections::HashSet;

use proptest::prelude::*;
use ziptree::export::pdf::{PageGeometry, paginate, slice_bands};
use ziptree::render::{parse_lines, render, render_text};
use ziptree::tree::{normalize, sort_tree};
use ziptree::{Indicators, TreeNode, build_tree};

fn segment() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("a".to_string()),
        Just("B".to_string()),
        Just("é".to_string()),
        Just("src".to_string()),
        Just("Src".to_string()),
        Just("x.txt".to_string()),
        Just("".to_string()),
    ]
}

/// Raw entry names with doubled, leading and trailing separators.
fn raw_entry() -> impl Strategy<Value = (String, bool)> {
    (
        prop::collection::vec(segment(), 1..5),
        any::<bool>(),
        any::<bool>(),
        any::<bool>(),
    )
        .prop_map(|(segments, leading, trailing, marker)| {
            let mut raw = segments.join("/");
            if leading {
                raw.insert(0, '/');
            }
            if trailing {
                raw.push('/');
            }
            (raw, marker)
        })
}

fn entries() -> impl Strategy<Value = Vec<(String, bool)>> {
    prop::collection::vec(raw_entry(), 1..40)
}

proptest! {
    #[test]
    fn every_entry_is_reachable(entries in entries()) {
        let root = build_tree("root", entries.clone()).unwrap();
        for (raw, _) in &entries {
            if let Some(path) = normalize(raw) {
                let node = root.find(&path.joined());
                prop_assert!(node.is_some(), "missing {}", raw);
                prop_assert_eq!(&node.unwrap().path, &path.joined());
            }
        }
    }

    #[test]
    fn siblings_are_unique_and_paths_compose(entries in entries()) {
        let root = build_tree("root", entries).unwrap();
        for node in root.iter() {
            let mut names = HashSet::new();
            for child in &node.children {
                prop_assert!(names.insert(child.name.as_str()), "duplicate {}", child.name);
                let expected = if node.is_root() {
                    child.name.clone()
                } else {
                    format!("{}/{}", node.path, child.name)
                };
                prop_assert_eq!(&child.path, &expected);
            }
        }
    }

    #[test]
    fn directories_come_first(entries in entries()) {
        let root = build_tree("root", entries).unwrap();
        for node in root.iter() {
            let first_file = node.children.iter().position(|c| !c.is_directory);
            if let Some(first_file) = first_file {
                prop_assert!(node.children[first_file..].iter().all(|c| !c.is_directory));
            }
        }
    }

    #[test]
    fn sorting_is_idempotent(entries in entries()) {
        let root = build_tree("root", entries).unwrap();
        let mut again: TreeNode = root.clone();
        sort_tree(&mut again);
        prop_assert_eq!(root, again);
    }

    #[test]
    fn text_reads_back(entries in entries(), plain in any::<bool>()) {
        let indicators = if plain { Indicators::Plain } else { Indicators::Emoji };
        let root = build_tree("root", entries).unwrap();

        let parsed = parse_lines(&render_text(&root, indicators), indicators).unwrap();
        let lines = render(&root);
        prop_assert_eq!(parsed.len(), lines.len());
        for (parsed, line) in parsed.iter().zip(&lines) {
            prop_assert_eq!(parsed.depth, line.depth);
            prop_assert_eq!(parsed.is_directory, line.is_directory);
            prop_assert_eq!(&parsed.name, &line.name);
        }
    }

    #[test]
    fn bands_cover_the_canvas(height in 0u32..50_000, band in 1u32..5_000) {
        let bands = slice_bands(height, band);
        prop_assert_eq!(bands.len() as u32, height.div_ceil(band));
        let mut y = 0;
        for b in &bands {
            prop_assert_eq!(b.source_y, y);
            prop_assert!(b.height >= 1 && b.height <= band);
            y += b.height;
        }
        prop_assert_eq!(y, height);
    }

    #[test]
    fn pages_stay_inside_margins(
        width in 1u32..4_000,
        height in 1u32..40_000,
        scale in 1.0f32..=2.0,
    ) {
        let geometry = PageGeometry::A4;
        let plans = paginate(&geometry, width, height, scale);
        prop_assert!(!plans.is_empty());

        let covered: u32 = plans.iter().map(|p| p.band.height).sum();
        prop_assert_eq!(covered, height);

        let slack = 0.01;
        for plan in &plans {
            let p = plan.placement;
            prop_assert!(p.x_mm >= geometry.margin_mm - slack);
            prop_assert!(p.y_mm >= geometry.margin_mm - slack);
            prop_assert!(p.x_mm + p.width_mm <= geometry.width_mm - geometry.margin_mm + slack);
            prop_assert!(p.y_mm + p.height_mm <= geometry.height_mm - geometry.margin_mm + slack);
        }
    }
}
