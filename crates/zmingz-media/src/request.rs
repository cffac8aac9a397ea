//! Mirror job request.

use std::path::{Path, PathBuf};

use zmingz_models::Slot;

use crate::command::{mirror_command, FfmpegCommand};
use crate::error::{MediaError, MediaResult};
use crate::filters::FilterExpression;

/// Everything one engine invocation needs. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorJobRequest {
    input_path: PathBuf,
    output_path: PathBuf,
    filter: FilterExpression,
    slot: Slot,
}

impl MirrorJobRequest {
    /// Create a request with an explicit filter.
    ///
    /// The input file is not checked for existence; a missing input surfaces
    /// as an engine failure.
    pub fn new(
        input_path: impl AsRef<Path>,
        output_path: impl AsRef<Path>,
        filter: FilterExpression,
        slot: Slot,
    ) -> MediaResult<Self> {
        let input_path = input_path.as_ref();
        let output_path = output_path.as_ref();

        if input_path.as_os_str().is_empty() {
            return Err(MediaError::invalid_request("input path is empty"));
        }
        if output_path.as_os_str().is_empty() {
            return Err(MediaError::invalid_request(format!(
                "output path for slot {} is empty",
                slot
            )));
        }
        if output_path == input_path {
            return Err(MediaError::invalid_request(format!(
                "output path for slot {} is the input path: {}",
                slot,
                input_path.display()
            )));
        }

        Ok(Self {
            input_path: input_path.to_path_buf(),
            output_path: output_path.to_path_buf(),
            filter,
            slot,
        })
    }

    /// Create a request using the filter bound to `slot`.
    pub fn for_slot(
        input_path: impl AsRef<Path>,
        output_path: impl AsRef<Path>,
        slot: Slot,
    ) -> MediaResult<Self> {
        Self::new(input_path, output_path, FilterExpression::for_slot(slot), slot)
    }

    pub fn input_path(&self) -> &Path {
        &self.input_path
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn filter(&self) -> FilterExpression {
        self.filter
    }

    pub fn slot(&self) -> Slot {
        self.slot
    }

    /// The FFmpeg invocation for this request.
    pub fn to_command(&self) -> FfmpegCommand {
        mirror_command(&self.input_path, &self.output_path, self.filter)
    }
}
