use crate::error::{PcsdlError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Destination category for a placed artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Videos,
    Subtitles,
}

impl Category {
    pub fn dir_name(&self) -> &'static str {
        match self {
            Category::Videos => "Videos",
            Category::Subtitles => "Subtitles",
        }
    }
}

/// A successfully placed artifact.
#[derive(Debug)]
pub struct PlacedFile {
    pub path: PathBuf,
    /// True when an existing file under the same name was overwritten.
    pub replaced: bool,
}

/// Rename `source` to `<output_name>.<ext>` (extension preserved) and move it
/// into the category subdirectory of `dest_root`.
///
/// An existing file under the same name is overwritten; the caller is told via
/// `replaced` so the collision can be tallied.
pub fn place(
    source: &Path,
    output_name: &str,
    category: Category,
    dest_root: &Path,
) -> Result<PlacedFile> {
    let target_dir = dest_root.join(category.dir_name());
    if !target_dir.is_dir() {
        return Err(PcsdlError::Placement(format!(
            "destination directory {} does not exist",
            target_dir.display()
        )));
    }

    let extension = source.extension().and_then(|e| e.to_str()).unwrap_or("");
    let file_name = if extension.is_empty() {
        output_name.to_string()
    } else {
        format!("{output_name}.{extension}")
    };
    let target = target_dir.join(&file_name);

    let replaced = target.exists();
    if replaced {
        warn!("Overwriting existing file {}", target.display());
    }

    move_file(source, &target)?;
    Ok(PlacedFile { path: target, replaced })
}

/// Rename, falling back to copy+remove when source and target live on
/// different filesystems.
fn move_file(source: &Path, target: &Path) -> Result<()> {
    if fs::rename(source, target).is_ok() {
        return Ok(());
    }

    fs::copy(source, target).map_err(|e| {
        PcsdlError::Placement(format!(
            "failed to move {} to {}: {e}",
            source.display(),
            target.display()
        ))
    })?;
    fs::remove_file(source)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn layout() -> TempDir {
        let dest = TempDir::new().unwrap();
        fs::create_dir_all(dest.path().join("Videos")).unwrap();
        fs::create_dir_all(dest.path().join("Subtitles")).unwrap();
        dest
    }

    #[test]
    fn test_place_renames_and_moves() {
        let work = TempDir::new().unwrap();
        let dest = layout();

        let source = work.path().join("raw-upload-17.mp4");
        fs::write(&source, b"video bytes").unwrap();

        let placed = place(&source, "p42", Category::Videos, dest.path()).unwrap();

        assert_eq!(placed.path, dest.path().join("Videos").join("p42.mp4"));
        assert!(!placed.replaced);
        assert!(!source.exists());
        assert_eq!(fs::read(&placed.path).unwrap(), b"video bytes");
    }

    #[test]
    fn test_place_preserves_extension() {
        let work = TempDir::new().unwrap();
        let dest = layout();

        let source = work.path().join("captions.srt");
        fs::write(&source, b"1\n").unwrap();

        let placed = place(&source, "p42", Category::Subtitles, dest.path()).unwrap();
        assert_eq!(placed.path, dest.path().join("Subtitles").join("p42.srt"));
    }

    #[test]
    fn test_place_reports_overwrite() {
        let work = TempDir::new().unwrap();
        let dest = layout();

        let existing = dest.path().join("Videos").join("p42.mp4");
        fs::write(&existing, b"old").unwrap();

        let source = work.path().join("new.mp4");
        fs::write(&source, b"new").unwrap();

        let placed = place(&source, "p42", Category::Videos, dest.path()).unwrap();

        assert!(placed.replaced);
        assert_eq!(fs::read(&existing).unwrap(), b"new");
    }

    #[test]
    fn test_place_fails_without_layout() {
        let work = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();

        let source = work.path().join("a.mp4");
        fs::write(&source, b"x").unwrap();

        let result = place(&source, "p1", Category::Videos, dest.path());
        assert!(matches!(result, Err(PcsdlError::Placement(_))));
        assert!(source.exists());
    }

    #[test]
    fn test_category_dir_names() {
        assert_eq!(Category::Videos.dir_name(), "Videos");
        assert_eq!(Category::Subtitles.dir_name(), "Subtitles");
    }
}
