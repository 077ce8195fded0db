#![allow(dead_code)]

use std::io::Write;
use std::path::PathBuf;

use image::{Rgba, RgbaImage};
use tempfile::TempDir;
use zip::CompressionMethod;
use zip::write::{SimpleFileOptions, ZipWriter};

use ziptree::export::layout::{Band, TextMeasure, TreeLayout};
use ziptree::{Rasterizer, ZipTreeResult};

/// One entry of a test archive. Names ending in `/` become directory entries.
pub enum Entry<'a> {
    Dir(&'a str),
    File(&'a str, &'a [u8]),
}

/// Write a stored (uncompressed) archive holding `entries` in order.
pub fn write_archive(entries: &[Entry<'_>], comment: Option<&str>) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fixture.zip");
    let file = std::fs::File::create(&path).unwrap();

    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    for entry in entries {
        match entry {
            Entry::Dir(name) => writer.add_directory(*name, options).unwrap(),
            Entry::File(name, data) => {
                writer.start_file(*name, options).unwrap();
                writer.write_all(data).unwrap();
            }
        }
    }
    if let Some(comment) = comment {
        writer.set_comment(comment);
    }
    writer.finish().unwrap();

    (dir, path)
}

/// Draws nothing but a plain canvas; every character is 8px wide.
pub struct StubRasterizer;

impl TextMeasure for StubRasterizer {
    fn text_width(&self, text: &str, _px: f32) -> f32 {
        text.chars().count() as f32 * 8.0
    }
}

impl Rasterizer for StubRasterizer {
    fn rasterize(&self, layout: &TreeLayout, scale: f32, band: Band) -> ZipTreeResult<RgbaImage> {
        let (width, _) = layout.canvas_size(scale);
        let mut canvas = RgbaImage::from_pixel(width, band.height, Rgba([255, 255, 255, 255]));
        for row in &layout.rows {
            let y = (row.middle() * scale) as u32;
            if y < band.source_y || y >= band.end() {
                continue;
            }
            let x = ((row.text_x * scale) as u32).min(width - 1);
            canvas.put_pixel(x, y - band.source_y, Rgba([0, 0, 0, 255]));
        }
        Ok(canvas)
    }
}
