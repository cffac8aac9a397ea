//! Output slot numbering.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// One of the two mirror outputs of a run.
///
/// Slots are numbered 1 and 2 on the wire and in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Slot {
    First,
    Second,
}

impl Slot {
    pub const ALL: [Slot; 2] = [Slot::First, Slot::Second];

    /// The 1-based slot number.
    pub fn number(self) -> u8 {
        match self {
            Slot::First => 1,
            Slot::Second => 2,
        }
    }

    /// The 0-based index, for addressing per-slot arrays.
    pub fn index(self) -> usize {
        usize::from(self.number() - 1)
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

impl TryFrom<u8> for Slot {
    type Error = SlotError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Slot::First),
            2 => Ok(Slot::Second),
            other => Err(SlotError(other)),
        }
    }
}

impl From<Slot> for u8 {
    fn from(slot: Slot) -> Self {
        slot.number()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid slot number: {0} (expected 1 or 2)")]
pub struct SlotError(pub u8);
