mod common;

use std::sync::Arc;

use pretty_assertions::assert_eq;
use ziptree::{LocalFileReader, Session, ZipListing, ZipTreeError};

use common::{Entry, write_archive};

async fn paths_of(entries: &[Entry<'_>], comment: Option<&str>) -> Vec<(String, bool)> {
    let (_dir, path) = write_archive(entries, comment);
    let reader = Arc::new(LocalFileReader::new(&path).unwrap());
    ZipListing::new(reader).entry_paths().await.unwrap()
}

#[tokio::test]
async fn lists_entries_in_storage_order() {
    let paths = paths_of(
        &[
            Entry::File("b.txt", b"b"),
            Entry::Dir("src/"),
            Entry::File("src/main.rs", b"fn main() {}"),
            Entry::File("a.txt", b""),
        ],
        None,
    )
    .await;

    assert_eq!(
        paths,
        vec![
            ("b.txt".to_string(), false),
            ("src/".to_string(), true),
            ("src/main.rs".to_string(), false),
            ("a.txt".to_string(), false),
        ]
    );
}

#[tokio::test]
async fn archive_comment_does_not_hide_the_directory() {
    let comment = "x".repeat(1000);
    let paths = paths_of(&[Entry::File("only.txt", b"data")], Some(&comment)).await;
    assert_eq!(paths, vec![("only.txt".to_string(), false)]);
}

#[tokio::test]
async fn empty_archive_is_reported() {
    let (_dir, path) = write_archive(&[], None);
    let reader = Arc::new(LocalFileReader::new(&path).unwrap());

    let session = Session::new();
    let result = session.load(reader, "fixture").await;
    assert!(matches!(result, Err(ZipTreeError::EmptyArchive)));
}

#[tokio::test]
async fn garbage_is_unreadable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.zip");
    std::fs::write(&path, vec![0x42u8; 4096]).unwrap();
    let reader = Arc::new(LocalFileReader::new(&path).unwrap());

    let session = Session::new();
    let result = session.load(reader, "broken").await;
    assert!(matches!(result, Err(ZipTreeError::ArchiveUnreadable(_))));
}

#[tokio::test]
async fn truncated_archive_is_unreadable() {
    let (_dir, path) = write_archive(
        &[Entry::Dir("a/"), Entry::File("a/b.txt", b"hello")],
        None,
    );
    let bytes = std::fs::read(&path).unwrap();
    std::fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();
    let reader = Arc::new(LocalFileReader::new(&path).unwrap());

    let result = Session::new().load(reader, "fixture").await;
    assert!(matches!(result, Err(ZipTreeError::ArchiveUnreadable(_))));
}

#[tokio::test]
async fn tiny_file_is_unreadable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tiny.zip");
    std::fs::write(&path, b"PK").unwrap();
    let reader = Arc::new(LocalFileReader::new(&path).unwrap());

    let result = Session::new().load(reader, "tiny").await;
    assert!(matches!(result, Err(ZipTreeError::ArchiveUnreadable(_))));
}
