//! Transform engines.
//!
//! A [`TransformEngine`] runs one FFmpeg command to completion and reports
//! the engine's raw return code. Classification of that code happens in
//! [`TransformAdapter`](crate::TransformAdapter).

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::adapter::RETURN_CODE_CANCEL;
use crate::command::{check_ffmpeg, FfmpegCommand};
use crate::error::MediaResult;

/// Lines of FFmpeg stderr kept for failure logs.
const STDERR_TAIL_LINES: usize = 20;

/// Something that can execute an FFmpeg command.
#[async_trait]
pub trait TransformEngine: Send + Sync {
    /// Run `command` to completion and return the engine's return code.
    ///
    /// `Err` means the engine could not be started at all.
    async fn execute(&self, command: &FfmpegCommand) -> MediaResult<i32>;
}

/// Engine that spawns the `ffmpeg` binary as a child process.
#[derive(Debug, Clone)]
pub struct FfmpegEngine {
    binary: PathBuf,
}

impl FfmpegEngine {
    /// Use an explicit binary path.
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Locate `ffmpeg` on `PATH`.
    pub fn locate() -> MediaResult<Self> {
        check_ffmpeg().map(Self::new)
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }
}

#[async_trait]
impl TransformEngine for FfmpegEngine {
    async fn execute(&self, command: &FfmpegCommand) -> MediaResult<i32> {
        debug!(
            "Running FFmpeg: {} {}",
            self.binary.display(),
            command.command_line()
        );

        let output = Command::new(&self.binary)
            .args(command.build_args())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await?;

        match output.status.code() {
            Some(code) => {
                if code != 0 {
                    warn!(
                        exit_code = code,
                        output = %command.output().display(),
                        "FFmpeg exited with non-zero status: {}",
                        stderr_tail(&output.stderr)
                    );
                }
                Ok(code)
            }
            None => {
                // No exit code means the process was killed by a signal.
                info!(
                    output = %command.output().display(),
                    "FFmpeg terminated by signal, reporting cancellation"
                );
                Ok(RETURN_CODE_CANCEL)
            }
        }
    }
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}
