//! FFmpeg command builder.

use std::path::{Path, PathBuf};

use crate::error::{MediaError, MediaResult};
use crate::filters::FilterExpression;

/// Builder for FFmpeg commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FfmpegCommand {
    /// Input file path
    input: PathBuf,
    /// Output file path
    output: PathBuf,
    /// Output arguments (after -i)
    output_args: Vec<String>,
    /// Whether to overwrite output
    overwrite: bool,
}

impl FfmpegCommand {
    /// Create a new FFmpeg command. Overwriting the output is on by default.
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            output_args: Vec::new(),
            overwrite: true,
        }
    }

    /// Add an output argument (after -i).
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Set video filter.
    pub fn video_filter(self, filter: impl AsRef<str>) -> Self {
        self.output_arg("-vf").output_arg(filter.as_ref())
    }

    /// Set whether an existing output file is overwritten (`-y`).
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn input(&self) -> &Path {
        &self.input
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Build the command arguments.
    ///
    /// Layout is `-i <input> <output args> [-y] <output>`; each element is
    /// one argv entry, so the filter is not quoted.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(self.output_args.len() + 4);

        args.push("-i".to_string());
        args.push(self.input.to_string_lossy().to_string());

        args.extend(self.output_args.iter().cloned());

        if self.overwrite {
            args.push("-y".to_string());
        }

        args.push(self.output.to_string_lossy().to_string());

        args
    }

    /// Render the arguments as a single command string.
    ///
    /// Arguments containing spaces or filter-graph separators are wrapped in
    /// double quotes, giving `-i <in> -vf "<filter>" -y <out>`.
    pub fn command_line(&self) -> String {
        self.build_args()
            .iter()
            .map(|arg| quote_if_needed(arg))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Build the mirror command for one input/output pair.
pub fn mirror_command(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    filter: FilterExpression,
) -> FfmpegCommand {
    FfmpegCommand::new(input, output).video_filter(filter)
}

fn quote_if_needed(arg: &str) -> String {
    if arg.contains(&[' ', ';', '[', ']', '\t'][..]) {
        format!("\"{}\"", arg)
    } else {
        arg.to_string()
    }
}

/// Check if FFmpeg is available.
pub fn check_ffmpeg() -> MediaResult<PathBuf> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)
}
