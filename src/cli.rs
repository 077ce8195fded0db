use std::path::PathBuf;

use clap::Parser;
use log::LevelFilter;

use crate::export::ExportFormat;
use crate::export::pdf::DEFAULT_TITLE;
use crate::export::raster::{DEFAULT_JPEG_QUALITY, MAX_IMAGE_DIMENSION};

/// Root name used when none can be derived from the archive source.
pub const FALLBACK_ROOT_NAME: &str = "zip-tree";

#[derive(Parser, Debug)]
#[command(name = "ziptree")]
#[command(version)]
#[command(about = "Render the directory tree of a ZIP archive", long_about = None)]
#[command(after_help = "Examples:\n  \
  ziptree project.zip                         print the tree of project.zip\n  \
  ziptree -f png,pdf -d out project.zip       write out/project-tree.png and .pdf\n  \
  ziptree -f json https://example.com/a.zip   tree of a remote ZIP as JSON")]
pub struct Cli {
    /// ZIP file paths or HTTP URLs
    #[arg(value_name = "FILE", required = true)]
    pub files: Vec<String>,

    /// Output formats
    #[arg(
        short = 'f',
        long = "format",
        value_enum,
        value_delimiter = ',',
        default_value = "txt"
    )]
    pub formats: Vec<ExportFormat>,

    /// Write artifacts into DIR
    #[arg(short = 'd', value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Name of the root node (default: archive name without .zip)
    #[arg(long, value_name = "NAME")]
    pub root_name: Option<String>,

    /// Mark directories with a trailing '/' instead of emoji
    #[arg(long)]
    pub plain: bool,

    /// Largest width or height of PNG/JPEG output
    #[arg(long, value_name = "PX", default_value_t = MAX_IMAGE_DIMENSION,
          value_parser = clap::value_parser!(u32).range(1..))]
    pub max_dimension: u32,

    /// JPEG quality (1-100)
    #[arg(long, value_name = "Q", default_value_t = DEFAULT_JPEG_QUALITY,
          value_parser = clap::value_parser!(u8).range(1..=100))]
    pub jpeg_quality: u8,

    /// TrueType font for PNG/JPEG/PDF output
    #[arg(long, value_name = "PATH")]
    pub font: Option<PathBuf>,

    /// PDF title
    #[arg(long, default_value = DEFAULT_TITLE)]
    pub title: String,

    /// More log output (-vv for debug)
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Less log output
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,
}

impl Cli {
    pub fn log_level(&self) -> LevelFilter {
        if self.quiet > 0 {
            return LevelFilter::Error;
        }
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            _ => LevelFilter::Debug,
        }
    }

    pub fn needs_rasterizer(&self) -> bool {
        self.formats.iter().any(|f| f.needs_rasterizer())
    }

    /// Requested formats with duplicates removed, first occurrence kept.
    pub fn unique_formats(&self) -> Vec<ExportFormat> {
        let mut formats = Vec::with_capacity(self.formats.len());
        for &format in &self.formats {
            if !formats.contains(&format) {
                formats.push(format);
            }
        }
        formats
    }

    pub fn root_name_for(&self, source: &str) -> String {
        match &self.root_name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => root_name_for(source),
        }
    }
}

pub fn is_http_url(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Root name derived from an archive path or URL: its last segment with a
/// trailing `.zip` (any case) removed.
pub fn root_name_for(source: &str) -> String {
    let source = if is_http_url(source) {
        source
            .split(['?', '#'])
            .next()
            .unwrap_or(source)
            .trim_end_matches('/')
    } else {
        source
    };

    let last = source.rsplit(['/', '\\']).next().unwrap_or(source);
    let stem = match last.len().checked_sub(4) {
        Some(cut) if last.is_char_boundary(cut) && last[cut..].eq_ignore_ascii_case(".zip") => {
            &last[..cut]
        }
        _ => last,
    };

    if stem.is_empty() {
        FALLBACK_ROOT_NAME.to_string()
    } else {
        stem.to_string()
    }
}
