//! Filesystem utilities for the pipeline boundary.
//!
//! FFmpeg needs plain local files on both ends. These helpers copy a picked
//! source into the work directory and hand out fresh output paths in the
//! media cache. Nothing here deletes files: once a path is returned, the
//! caller owns it.

use std::path::{Path, PathBuf};

use tokio::fs;
use zmingz_models::Slot;

use crate::error::{MediaError, MediaResult};

/// Subdirectory of the work dir holding mirror outputs.
const MEDIA_CACHE_SUBDIR: &str = "media";

/// Extension of a path: the text after the last `.` in the file name, or an
/// empty string when there is none.
pub fn file_extension(path: impl AsRef<Path>) -> String {
    path.as_ref()
        .file_name()
        .map(|name| name.to_string_lossy())
        .and_then(|name| name.rsplit_once('.').map(|(_, ext)| ext.to_string()))
        .unwrap_or_default()
}

/// Ensure `<work_dir>/media` exists and return it.
pub async fn media_cache_dir(work_dir: impl AsRef<Path>) -> MediaResult<PathBuf> {
    let dir = work_dir.as_ref().join(MEDIA_CACHE_SUBDIR);
    fs::create_dir_all(&dir).await.map_err(|e| {
        tracing::error!("Could not create media cache dir {}: {}", dir.display(), e);
        MediaError::from(e)
    })?;
    Ok(dir)
}

/// Copy `source` into the work directory as `input*.<ext>` and return the
/// new path.
///
/// Lets the engine read from a stable local file regardless of where the
/// selection came from.
pub async fn stage_input(
    source: impl AsRef<Path>,
    work_dir: impl AsRef<Path>,
) -> MediaResult<PathBuf> {
    let source = source.as_ref();
    let work_dir = work_dir.as_ref();

    if !source.is_file() {
        return Err(MediaError::FileNotFound(source.to_path_buf()));
    }

    fs::create_dir_all(work_dir).await?;

    let staged = reserve_path(work_dir, "input", &file_extension(source))?;
    fs::copy(source, &staged).await?;

    tracing::debug!(
        "Staged input {} -> {}",
        source.display(),
        staged.display()
    );

    Ok(staged)
}

/// Hands out per-slot output paths in the media cache directory.
///
/// Outputs keep the input's extension so FFmpeg picks a matching muxer.
#[derive(Debug, Clone)]
pub struct OutputAllocator {
    dir: PathBuf,
    extension: String,
}

impl OutputAllocator {
    /// Prepare the media cache under `work_dir` for outputs derived from `input`.
    pub async fn new(work_dir: impl AsRef<Path>, input: impl AsRef<Path>) -> MediaResult<Self> {
        let dir = media_cache_dir(work_dir).await?;
        Ok(Self {
            dir,
            extension: file_extension(input),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create a fresh, empty `output<N>*.<ext>` file for `slot`.
    pub fn allocate(&self, slot: Slot) -> MediaResult<PathBuf> {
        reserve_path(&self.dir, &format!("output{}", slot.number()), &self.extension)
    }

    /// Allocate both slots, indexed by [`Slot::index`].
    pub fn allocate_all(&self) -> MediaResult<[PathBuf; 2]> {
        Ok([self.allocate(Slot::First)?, self.allocate(Slot::Second)?])
    }
}

/// Create a uniquely named empty file and keep it on disk.
fn reserve_path(dir: &Path, prefix: &str, extension: &str) -> MediaResult<PathBuf> {
    let suffix = if extension.is_empty() {
        String::new()
    } else {
        format!(".{}", extension)
    };

    let file = tempfile::Builder::new()
        .prefix(prefix)
        .suffix(&suffix)
        .tempfile_in(dir)?;

    file.into_temp_path()
        .keep()
        .map_err(|e| MediaError::Io(e.error))
}
