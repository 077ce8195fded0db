/// Separator used by ZIP entry names.
pub const SEPARATOR: char = '/';

/// A raw entry name reduced to its non-empty segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedPath {
    pub segments: Vec<String>,
    /// The raw name ended with the separator.
    pub is_directory: bool,
}

impl NormalizedPath {
    pub fn joined(&self) -> String {
        self.segments.join("/")
    }
}

/// Split a raw entry name into clean segments.
///
/// Empty segments from doubled or leading separators are dropped. Returns
/// `None` when nothing is left, in which case the entry contributes nothing.
pub fn normalize(raw: &str) -> Option<NormalizedPath> {
    let is_directory = raw.ends_with(SEPARATOR);
    let trimmed = raw.strip_suffix(SEPARATOR).unwrap_or(raw);

    let segments: Vec<String> = trimmed
        .split(SEPARATOR)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect();

    if segments.is_empty() {
        return None;
    }

    Some(NormalizedPath {
        segments,
        is_directory,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segments(raw: &str) -> Option<(Vec<String>, bool)> {
        normalize(raw).map(|p| (p.segments, p.is_directory))
    }

    #[test]
    fn plain_file() {
        assert_eq!(
            segments("a/b/c.txt"),
            Some((vec!["a".into(), "b".into(), "c.txt".into()], false))
        );
    }

    #[test]
    fn trailing_separator_marks_directory() {
        assert_eq!(segments("a/b/"), Some((vec!["a".into(), "b".into()], true)));
    }

    #[test]
    fn empty_segments_are_dropped() {
        assert_eq!(
            segments("/a//b"),
            Some((vec!["a".into(), "b".into()], false))
        );
        assert_eq!(segments("a//"), Some((vec!["a".into()], true)));
    }

    #[test]
    fn degenerate_names_are_discarded() {
        assert_eq!(segments(""), None);
        assert_eq!(segments("/"), None);
        assert_eq!(segments("///"), None);
    }

    #[test]
    fn joined_has_no_empty_segments() {
        assert_eq!(normalize("//x///y/").unwrap().joined(), "x/y");
    }
}
