use crate::error::Result;
use crate::fetch::Fetcher;
use crate::pipeline::{process_row, ArtifactOutcome, RowOutcome, RunOptions, SkipSets};
use crate::place::Category;
use crate::records::Row;
use futures::stream::{FuturesUnordered, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{info, warn};

/// Everything a batch run needs besides the rows themselves.
pub struct BatchContext {
    pub options: RunOptions,
    pub skip: Arc<SkipSets>,
    pub fetcher: Arc<dyn Fetcher>,
    pub dest_root: PathBuf,
    pub work_dir: PathBuf,
    pub concurrency: usize,
    pub show_progress: bool,
    pub cancelled: Arc<AtomicBool>,
}

/// Tally of everything the batch did, reported at the end of the run.
#[derive(Debug, Default, Clone)]
pub struct BatchReport {
    pub rows_processed: usize,
    pub rows_abandoned: usize,
    pub videos_placed: usize,
    pub captions_placed: usize,
    pub skipped: usize,
    pub fetch_failures: usize,
    pub conversion_fallbacks: usize,
    pub placement_failures: usize,
    pub overwrites: usize,
    pub cancelled: bool,
}

impl BatchReport {
    fn record(&mut self, outcome: &RowOutcome) {
        self.rows_processed += 1;
        self.record_artifact(&outcome.video, Category::Videos);
        self.record_artifact(&outcome.caption, Category::Subtitles);
    }

    fn record_artifact(&mut self, artifact: &ArtifactOutcome, category: Category) {
        match artifact {
            ArtifactOutcome::Placed { replaced, .. } => {
                match category {
                    Category::Videos => self.videos_placed += 1,
                    Category::Subtitles => self.captions_placed += 1,
                }
                if *replaced {
                    self.overwrites += 1;
                }
            }
            ArtifactOutcome::PlacedUnconverted { replaced } => {
                match category {
                    Category::Videos => self.videos_placed += 1,
                    Category::Subtitles => self.captions_placed += 1,
                }
                self.conversion_fallbacks += 1;
                if *replaced {
                    self.overwrites += 1;
                }
            }
            ArtifactOutcome::Skipped => self.skipped += 1,
            ArtifactOutcome::FetchFailed => self.fetch_failures += 1,
            ArtifactOutcome::PlacementFailed => self.placement_failures += 1,
            ArtifactOutcome::Missing => {}
        }
    }
}

/// Create the `Videos/` and `Subtitles/` layout under `dest_root`.
pub fn create_layout(dest_root: &Path) -> Result<()> {
    std::fs::create_dir_all(dest_root.join(Category::Videos.dir_name()))?;
    std::fs::create_dir_all(dest_root.join(Category::Subtitles.dir_name()))?;
    Ok(())
}

/// Dispatch every row to a bounded worker pool and wait for completion.
///
/// Rows race freely; the only barrier is the final join. Cancellation stops
/// rows that have not started yet, while in-flight rows run to completion.
pub async fn run_batch(rows: Vec<Row>, ctx: &BatchContext) -> Result<BatchReport> {
    let total_rows = rows.len();
    let start_time = Instant::now();

    info!(
        "Processing {} rows with {} concurrent workers",
        total_rows, ctx.concurrency
    );

    let progress_bar = if ctx.show_progress {
        let pb = ProgressBar::new(total_rows as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} rows ({eta})")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    let semaphore = Arc::new(Semaphore::new(ctx.concurrency));
    let mut futures = FuturesUnordered::new();

    for row in rows {
        let sem = semaphore.clone();
        let skip = ctx.skip.clone();
        let fetcher = ctx.fetcher.clone();
        let cancelled = ctx.cancelled.clone();
        let dest_root = ctx.dest_root.clone();
        let work_dir = ctx.work_dir.join(format!("row-{}", row.number));
        let options = ctx.options;
        let pb = progress_bar.clone();

        futures.push(async move {
            // Acquire permit (waits if at concurrency limit)
            let _permit = sem.acquire().await.expect("Semaphore closed");

            if cancelled.load(Ordering::Relaxed) {
                if let Some(ref pb) = pb {
                    pb.inc(1);
                }
                return None;
            }

            if let Err(e) = tokio::fs::create_dir_all(&work_dir).await {
                warn!("Could not create work directory for {}: {e}", row.id);
                if let Some(ref pb) = pb {
                    pb.inc(1);
                }
                return None;
            }

            let outcome = process_row(
                &row,
                options,
                &skip,
                fetcher.as_ref(),
                &dest_root,
                &work_dir,
            )
            .await;

            // Scratch files for this row are no longer needed.
            let _ = tokio::fs::remove_dir_all(&work_dir).await;

            if let Some(ref pb) = pb {
                pb.inc(1);
            }
            Some(outcome)
        });
    }

    let mut report = BatchReport::default();
    while let Some(result) = futures.next().await {
        match result {
            Some(outcome) => report.record(&outcome),
            None => report.rows_abandoned += 1,
        }
    }

    if let Some(pb) = progress_bar {
        pb.finish_and_clear();
    }

    report.cancelled = ctx.cancelled.load(Ordering::Relaxed);

    info!(
        "Batch complete: {}/{} rows in {:.1}s",
        report.rows_processed,
        total_rows,
        start_time.elapsed().as_secs_f64()
    );

    Ok(report)
}

/// Print the final tally and the destination directory path.
pub fn print_report(report: &BatchReport, dest_root: &Path) {
    println!();
    println!("═══════════════════════════════════════════════════════════════");
    println!("                       Download Complete                        ");
    println!("═══════════════════════════════════════════════════════════════");
    println!();
    println!("  Rows processed:   {}", report.rows_processed);
    println!("  Videos placed:    {}", report.videos_placed);
    println!("  Captions placed:  {}", report.captions_placed);
    if report.skipped > 0 {
        println!("  Skipped:          {}", report.skipped);
    }
    if report.fetch_failures > 0 {
        println!("  Fetch failures:   {}", report.fetch_failures);
    }
    if report.conversion_fallbacks > 0 {
        println!(
            "  Kept unconverted: {} (conversion failed)",
            report.conversion_fallbacks
        );
    }
    if report.placement_failures > 0 {
        println!("  Placement errors: {}", report.placement_failures);
    }
    if report.overwrites > 0 {
        println!(
            "  Overwrites:       {} (same output name seen more than once?)",
            report.overwrites
        );
    }
    if report.cancelled {
        println!();
        println!(
            "  Cancelled: {} rows were not started",
            report.rows_abandoned
        );
    }
    println!();
    println!("  Files saved in directory: {}", dest_root.display());
    println!();
    println!("═══════════════════════════════════════════════════════════════");
}
