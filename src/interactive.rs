use crate::pipeline::{RunOptions, SkipSets};
use crate::records::Schema;
use console::style;
use dialoguer::Confirm;
use std::path::Path;

/// Options the operator settled on, plus the skip sets scanned while
/// answering the prompts.
pub struct WizardOutcome {
    pub options: RunOptions,
    pub skip_sets: SkipSets,
}

pub fn print_header() {
    println!();
    println!(
        "{}",
        style("╔═══════════════════════════════════════════════════╗").cyan()
    );
    println!(
        "{}",
        style("║        pcsdl - PCS media batch downloader         ║").cyan()
    );
    println!(
        "{}",
        style("╚═══════════════════════════════════════════════════╝").cyan()
    );
    println!();
}

fn confirm(prompt: &str, default: bool) -> anyhow::Result<bool> {
    Ok(Confirm::new()
        .with_prompt(prompt)
        .default(default)
        .interact()?)
}

/// Walk the operator through the run prompts.
///
/// Returns `None` when the final confirmation is declined; nothing has been
/// written to disk at that point.
pub fn run_wizard(schema: &Schema, dest_root: &Path) -> anyhow::Result<Option<WizardOutcome>> {
    let mut options = RunOptions::default();
    let mut skip_sets = SkipSets::default();

    if dest_root.exists() {
        options.skip_existing = confirm("Skip already downloaded files?", true)?;
        if options.skip_existing {
            skip_sets = SkipSets::scan(dest_root);
            println!("Already downloaded files will be skipped.");

            let mut downloaded: Vec<&str> =
                skip_sets.videos.iter().map(String::as_str).collect();
            downloaded.sort_unstable();
            println!("Downloaded videos: {:?}", downloaded);
        } else {
            println!("Existing files will be re-downloaded.");
        }
    }

    if !schema.has_captions() {
        println!(
            "{} No caption column found in the input data.",
            style("!").yellow()
        );
        if !confirm("Continue without captions?", false)? {
            anyhow::bail!("Cancelled: caption column missing");
        }
    }

    if schema.has_doi() {
        options.use_doi_names = confirm(
            "Default names are the submission ID. Should file names use DOI if available?",
            false,
        )?;
    } else {
        println!("No DOI column found. File names will use the submission ID.");
    }

    options.convert_to_vtt =
        confirm("Should subtitles be converted to VTT (required for ACM DL)?", false)?;

    print_summary(schema, dest_root, &options);

    if !confirm("Start Downloading?", true)? {
        println!("Cancelled download. Quitting!");
        return Ok(None);
    }

    println!();

    Ok(Some(WizardOutcome { options, skip_sets }))
}

fn print_summary(schema: &Schema, dest_root: &Path, options: &RunOptions) {
    println!("\n{}", style("═══ Summary ═══").bold());
    println!("  Destination:   {}", style(dest_root.display()).cyan());
    println!(
        "  Captions:      {}",
        if schema.has_captions() {
            if options.convert_to_vtt {
                "convert to VTT"
            } else {
                "convert to SRT"
            }
        } else {
            "none (no caption column)"
        }
    );
    println!(
        "  File names:    {}",
        if options.use_doi_names {
            "DOI when available"
        } else {
            "submission ID"
        }
    );
    if options.skip_existing {
        println!("  Existing:      skip");
    }
    println!();
}
