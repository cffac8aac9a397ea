//! Worker configuration.

use std::path::PathBuf;

use zmingz_media::{FfmpegEngine, MediaResult};

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Work directory for staged inputs and the media cache
    pub work_dir: PathBuf,
    /// Explicit FFmpeg binary; `None` searches `PATH`
    pub ffmpeg_path: Option<PathBuf>,
    /// Copy the input into the work directory before transforming
    pub stage_input: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            work_dir: default_work_dir(),
            ffmpeg_path: None,
            stage_input: true,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("ZMINGZ_WORK_DIR")
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(default_work_dir),
            ffmpeg_path: std::env::var("ZMINGZ_FFMPEG_PATH")
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
            stage_input: std::env::var("ZMINGZ_STAGE_INPUT")
                .ok()
                .and_then(|s| parse_bool(&s))
                .unwrap_or(true),
        }
    }

    /// Build the FFmpeg engine this config points at.
    pub fn engine(&self) -> MediaResult<FfmpegEngine> {
        match &self.ffmpeg_path {
            Some(path) => Ok(FfmpegEngine::new(path)),
            None => FfmpegEngine::locate(),
        }
    }
}

fn default_work_dir() -> PathBuf {
    std::env::temp_dir().join("zmingz")
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
