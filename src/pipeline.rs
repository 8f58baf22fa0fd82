use crate::convert::{convert_to_format, MediaFormat};
use crate::fetch::Fetcher;
use crate::naming::output_name;
use crate::place::{place, Category};
use crate::records::Row;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Run-wide options resolved from the interactive prompts.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub skip_existing: bool,
    pub use_doi_names: bool,
    pub convert_to_vtt: bool,
}

/// Output base names already present in the destination.
///
/// Built once before dispatch and shared read-only across workers, so no
/// locking is needed.
#[derive(Debug, Default)]
pub struct SkipSets {
    pub videos: HashSet<String>,
    pub captions: HashSet<String>,
}

impl SkipSets {
    /// Scan `Videos/` and `Subtitles/` under `dest_root` for existing file
    /// stems. Missing subdirectories yield empty sets.
    pub fn scan(dest_root: &Path) -> Self {
        Self {
            videos: scan_stems(&dest_root.join(Category::Videos.dir_name())),
            captions: scan_stems(&dest_root.join(Category::Subtitles.dir_name())),
        }
    }
}

fn scan_stems(dir: &Path) -> HashSet<String> {
    let mut stems = HashSet::new();
    if let Ok(entries) = fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_file() {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    stems.insert(stem.to_string());
                }
            }
        }
    }
    stems
}

/// What happened to one artifact of one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactOutcome {
    /// Fetched, converted as needed, and filed into the destination.
    Placed { replaced: bool, converted: bool },
    /// Conversion failed; the unconverted download was filed instead.
    PlacedUnconverted { replaced: bool },
    /// Already present in the destination, skipped without fetching.
    Skipped,
    /// The fetch failed or the URL cell was blank; no artifact produced.
    FetchFailed,
    /// The move into the destination failed after a successful fetch.
    PlacementFailed,
    /// The export has no column for this artifact.
    Missing,
}

/// Result of processing one row, consumed by the batch tally.
#[derive(Debug, Clone)]
pub struct RowOutcome {
    pub id: String,
    pub video: ArtifactOutcome,
    pub caption: ArtifactOutcome,
}

/// Process one row: fetch, convert, and file the video and caption artifacts.
///
/// The two branches are independent; any failure is contained to its own
/// artifact and logged, never propagated to sibling branches or rows.
pub async fn process_row(
    row: &Row,
    options: RunOptions,
    skip: &SkipSets,
    fetcher: &dyn Fetcher,
    dest_root: &Path,
    work_dir: &Path,
) -> RowOutcome {
    let name = output_name(row, options.use_doi_names);

    let video = if options.skip_existing
        && (skip.videos.contains(&row.id) || skip.videos.contains(&name))
    {
        info!("Skipping {}", row.id);
        ArtifactOutcome::Skipped
    } else {
        info!("Downloading {}", row.id);
        process_artifact(
            &row.video_url,
            &name,
            MediaFormat::Mp4,
            Category::Videos,
            fetcher,
            dest_root,
            work_dir,
        )
        .await
    };

    let caption = match row.caption_url.as_deref() {
        None => ArtifactOutcome::Missing,
        Some(_)
            if options.skip_existing
                && (skip.captions.contains(&row.id) || skip.captions.contains(&name)) =>
        {
            debug!("Skipping captions for {}", row.id);
            ArtifactOutcome::Skipped
        }
        Some(url) => {
            let format = if options.convert_to_vtt {
                MediaFormat::Vtt
            } else {
                MediaFormat::Srt
            };
            process_artifact(
                url,
                &name,
                format,
                Category::Subtitles,
                fetcher,
                dest_root,
                work_dir,
            )
            .await
        }
    };

    RowOutcome {
        id: row.id.clone(),
        video,
        caption,
    }
}

/// Fetch one artifact, convert it to the target format, and file it.
async fn process_artifact(
    url: &str,
    name: &str,
    format: MediaFormat,
    category: Category,
    fetcher: &dyn Fetcher,
    dest_root: &Path,
    work_dir: &Path,
) -> ArtifactOutcome {
    if url.is_empty() {
        debug!("No URL for {name} in {}", category.dir_name());
        return ArtifactOutcome::FetchFailed;
    }

    let downloaded = match fetcher.fetch(url, work_dir).await {
        Ok(path) => path,
        Err(e) => {
            warn!("Fetch failed for {url}: {e}");
            return ArtifactOutcome::FetchFailed;
        }
    };

    let (final_path, converted, conversion_failed) =
        match convert_to_format(&downloaded, format).await {
            Ok(Some(converted_path)) => {
                // The unconverted download is no longer needed.
                if converted_path != downloaded {
                    let _ = fs::remove_file(&downloaded);
                }
                (converted_path, true, false)
            }
            Ok(None) => (downloaded, false, false),
            Err(e) => {
                warn!(
                    "Conversion to {} failed for {}: {e}",
                    format.extension().to_uppercase(),
                    downloaded.display()
                );
                (downloaded, false, true)
            }
        };

    match place(&final_path, name, category, dest_root) {
        Ok(placed) => {
            if conversion_failed {
                ArtifactOutcome::PlacedUnconverted {
                    replaced: placed.replaced,
                }
            } else {
                ArtifactOutcome::Placed {
                    replaced: placed.replaced,
                    converted,
                }
            }
        }
        Err(e) => {
            warn!("Placement failed for {}: {e}", final_path.display());
            ArtifactOutcome::PlacementFailed
        }
    }
}
