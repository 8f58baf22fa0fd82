use anyhow::{Context, Result};
use clap::Parser;
use pcsdl::batch::{create_layout, print_report, run_batch, BatchContext};
use pcsdl::config::Config;
use pcsdl::convert::check_ffmpeg;
use pcsdl::fetch::HttpFetcher;
use pcsdl::interactive::{print_header, run_wizard};
use pcsdl::records::load_rows;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "pcsdl")]
#[command(version, about = "Batch download conference presentation videos and captions")]
#[command(
    long_about = "Download the videos and caption files referenced by a PCS spreadsheet export, normalize their formats with FFmpeg, and file them into per-submission Videos/ and Subtitles/ directories."
)]
struct Cli {
    /// Path to the PCS CSV export
    input: PathBuf,

    /// Number of rows downloaded concurrently
    #[arg(short, long)]
    concurrency: Option<usize>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();
}

/// The destination directory sits next to the input file and carries its stem.
fn destination_root(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default();
    match input.parent() {
        Some(parent) => parent.join(stem),
        None => PathBuf::from(stem),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    if !cli.input.exists() {
        anyhow::bail!("Input file not found: {}", cli.input.display());
    }

    let mut config = Config::load().context("Failed to load configuration")?;
    if let Some(concurrency) = cli.concurrency {
        config.concurrency = concurrency;
    }
    config
        .validate()
        .context("Configuration validation failed")?;

    // Schema problems halt here, before any prompting or network activity.
    let (schema, rows) = load_rows(&cli.input, &config)
        .with_context(|| format!("Failed to read {}", cli.input.display()))?;

    print_header();
    info!("Input: {} ({} rows)", cli.input.display(), rows.len());
    info!("ID column:      {}", config.id_column);
    info!("Video column:   {}", config.video_column);
    info!("Caption column: {}", config.caption_column);

    let dest_root = destination_root(&cli.input);

    let Some(wizard) = run_wizard(&schema, &dest_root)? else {
        // Declining the final confirmation is a clean exit.
        return Ok(());
    };

    if let Err(e) = check_ffmpeg().await {
        warn!("{e}");
        warn!("Files needing format conversion will keep their original format.");
    }

    create_layout(&dest_root).context("Failed to create destination directories")?;

    let cancelled = Arc::new(AtomicBool::new(false));
    {
        let cancelled = cancelled.clone();
        ctrlc::set_handler(move || {
            eprintln!("\nCancellation requested; letting in-flight rows finish...");
            cancelled.store(true, Ordering::Relaxed);
        })
        .context("Failed to install Ctrl-C handler")?;
    }

    let work_dir = tempfile::tempdir().context("Failed to create work directory")?;
    let fetcher = HttpFetcher::new(Duration::from_secs(config.fetch_timeout_secs))
        .context("Failed to build HTTP client")?;

    let ctx = BatchContext {
        options: wizard.options,
        skip: Arc::new(wizard.skip_sets),
        fetcher: Arc::new(fetcher),
        dest_root: dest_root.clone(),
        work_dir: work_dir.path().to_path_buf(),
        concurrency: config.concurrency,
        show_progress: true,
        cancelled,
    };

    let report = run_batch(rows, &ctx).await?;
    print_report(&report, &dest_root);

    Ok(())
}
