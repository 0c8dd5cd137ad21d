use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Replaces the feed at `path` with `content`.
///
/// The document is written and synced to a sibling temp file first, then
/// renamed over the destination, so readers polling the feed never see a
/// partial document. On failure the previous feed is left untouched.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let staged = StagedFeed::write(path, content)?;
    staged.publish(path)
}

/// A fully written temp copy of the next feed, deleted on drop unless published.
struct StagedFeed {
    temp_path: PathBuf,
    published: bool,
}

impl StagedFeed {
    fn write(dest: &Path, content: &[u8]) -> Result<Self> {
        let temp_path = staging_path(dest)?;
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_path)
            .with_context(|| {
                format!(
                    "Failed to create temporary file '{}': check directory permissions",
                    temp_path.display()
                )
            })?;
        let staged = Self {
            temp_path,
            published: false,
        };

        let written = file.write_all(content).and_then(|()| file.sync_all());
        drop(file);
        written.with_context(|| {
            format!(
                "Failed to write feed to '{}': disk may be full",
                staged.temp_path.display()
            )
        })?;
        Ok(staged)
    }

    fn publish(mut self, dest: &Path) -> Result<()> {
        #[cfg(windows)]
        if dest.exists() {
            std::fs::remove_file(dest).with_context(|| {
                format!("Failed to remove previous feed '{}'", dest.display())
            })?;
        }

        std::fs::rename(&self.temp_path, dest).with_context(|| {
            format!(
                "Failed to move '{}' into place at '{}'",
                self.temp_path.display(),
                dest.display()
            )
        })?;
        self.published = true;
        Ok(())
    }
}

impl Drop for StagedFeed {
    fn drop(&mut self) {
        if !self.published {
            let _ = std::fs::remove_file(&self.temp_path);
        }
    }
}

/// `.{name}.{pid}-{nanos}.part` next to the destination, so the rename stays
/// on one filesystem.
fn staging_path(dest: &Path) -> Result<PathBuf> {
    let name = dest
        .file_name()
        .with_context(|| format!("Output path '{}' has no file name", dest.display()))?;
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let staged = format!(
        ".{}.{}-{:x}.part",
        name.to_string_lossy(),
        std::process::id(),
        nanos
    );
    Ok(dest.with_file_name(staged))
}
