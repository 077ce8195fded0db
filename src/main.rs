//! Main entry point for the ziptree CLI application.
//!
//! Every FILE is loaded through one session and exported in each requested
//! format. A failing archive is reported and the remaining ones still run.

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;

use ziptree::export::{ImageOptions, PdfOptions};
use ziptree::{
    Artifact, Cli, ExportFormat, ExportOptions, Exporter, FontRasterizer, HttpRangeReader,
    Indicators, LoadedTree, LocalFileReader, ReadAt, Session, ZipTreeResult,
};

/// Attempts per artifact when encoding fails in a retryable way.
const EXPORT_ATTEMPTS: u32 = 2;

/// Application entry point.
///
/// Sets up logging, prepares the exporter once and processes each archive
/// in command-line order.
#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .parse_default_env()
        .init();

    let exporter = match build_exporter(&cli) {
        Ok(exporter) => exporter,
        Err(e) => {
            eprintln!("error: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    let session = Session::new();
    let mut failed = false;
    for source in &cli.files {
        if let Err(e) = process_source(&session, &exporter, &cli, source).await {
            eprintln!("error: {source}: {e:#}");
            failed = true;
        }
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Build the exporter shared by every archive.
///
/// The font is only loaded when an image or PDF format was requested, and a
/// missing font fails before any archive is touched.
fn build_exporter(cli: &Cli) -> Result<Exporter> {
    let options = ExportOptions {
        indicators: if cli.plain {
            Indicators::Plain
        } else {
            Indicators::Emoji
        },
        image: ImageOptions {
            max_dimension: cli.max_dimension,
            jpeg_quality: cli.jpeg_quality,
        },
        pdf: PdfOptions {
            title: cli.title.clone(),
            ..Default::default()
        },
    };

    if !cli.needs_rasterizer() {
        return Ok(Exporter::text_only(options));
    }

    let rasterizer = FontRasterizer::load(cli.font.as_deref())?;
    Ok(Exporter::new(Arc::new(rasterizer), options))
}

/// Open `source` as a local file or remote URL and run it through the session.
async fn process_source(
    session: &Session,
    exporter: &Exporter,
    cli: &Cli,
    source: &str,
) -> Result<()> {
    let root_name = cli.root_name_for(source);

    if ziptree::cli::is_http_url(source) {
        let reader = Arc::new(HttpRangeReader::new(source.to_string()).await?);
        process_archive(session, exporter, cli, reader.clone(), &root_name).await?;
        info!(
            "{}: {} bytes transferred",
            source,
            reader.transferred_bytes()
        );
    } else {
        let reader = Arc::new(LocalFileReader::new(Path::new(source))?);
        process_archive(session, exporter, cli, reader, &root_name).await?;
    }

    Ok(())
}

/// Load one archive and write every requested artifact.
///
/// # Arguments
///
/// * `reader` - Random access to the archive bytes
/// * `root_name` - Name shown for the tree's root node
async fn process_archive<R: ReadAt + 'static>(
    session: &Session,
    exporter: &Exporter,
    cli: &Cli,
    reader: Arc<R>,
    root_name: &str,
) -> Result<()> {
    let Some(tree) = session.load(reader, root_name).await? else {
        debug!("Load of {} was superseded", root_name);
        return Ok(());
    };

    let (dirs, files) = tree.root().counts();
    info!("{}: {} directories, {} files", root_name, dirs, files);

    for format in cli.unique_formats() {
        let Some(artifact) = export_with_retry(session, &tree, exporter, format).await? else {
            debug!("{:?} export of {} was superseded", format, root_name);
            return Ok(());
        };

        if format == ExportFormat::Txt && cli.output_dir.is_none() {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(&artifact.bytes).await?;
            stdout.flush().await?;
            continue;
        }

        let dir = cli.output_dir.clone().unwrap_or_else(|| PathBuf::from("."));
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("cannot create {}", dir.display()))?;

        let path = dir.join(artifact.file_name(root_name));
        tokio::fs::write(&path, &artifact.bytes)
            .await
            .with_context(|| format!("cannot write {}", path.display()))?;
        info!("Wrote {} ({} bytes)", path.display(), artifact.bytes.len());
    }

    Ok(())
}

/// Export once more when the failure is one that retrying can fix.
async fn export_with_retry(
    session: &Session,
    tree: &Arc<LoadedTree>,
    exporter: &Exporter,
    format: ExportFormat,
) -> ZipTreeResult<Option<Artifact>> {
    let mut attempt = 1;
    loop {
        match session.export(tree, exporter, format).await {
            Err(e) if e.is_retryable() && attempt < EXPORT_ATTEMPTS => {
                warn!("{:?} export failed ({}), retrying", format, e);
                attempt += 1;
            }
            result => return result,
        }
    }
}
