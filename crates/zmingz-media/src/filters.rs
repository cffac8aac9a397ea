//! FFmpeg mirror filter definitions.
//!
//! Both expressions crop one half of the frame, duplicate it, flip the
//! duplicate horizontally and stack the two side by side. They differ in
//! which half is kept and on which side the unflipped copy lands, so they
//! cannot be collapsed into one parameterised expression.

use std::fmt;

use zmingz_models::Slot;

/// Left half anchored: `[left][flipped-left]`.
pub const VARIANT_A: &str =
    "crop=iw/2:ih:0:0,split[left][tmp];[tmp]hflip[right];[left][right] hstack";

/// Right half anchored: `[flipped-right][right]`.
pub const VARIANT_B: &str =
    "crop=iw/2:ih:iw/2:0,split[left][tmp];[tmp]hflip[right];[right][left] hstack";

/// An immutable filter-graph expression passed to FFmpeg's `-vf`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FilterExpression(&'static str);

impl FilterExpression {
    pub fn as_str(&self) -> &'static str {
        self.0
    }

    /// Expression for a given output slot: slot 1 is variant A, slot 2 is variant B.
    pub fn for_slot(slot: Slot) -> Self {
        match slot {
            Slot::First => variant_a(),
            Slot::Second => variant_b(),
        }
    }
}

impl fmt::Display for FilterExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl AsRef<str> for FilterExpression {
    fn as_ref(&self) -> &str {
        self.0
    }
}

pub fn variant_a() -> FilterExpression {
    FilterExpression(VARIANT_A)
}

pub fn variant_b() -> FilterExpression {
    FilterExpression(VARIANT_B)
}
