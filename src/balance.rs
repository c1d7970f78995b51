use std::{fmt, num::ParseIntError, str::FromStr};

use crate::clamp_unit;

/// The center of the balance range
pub const CENTER: f32 = 0.5;

/// A left/right channel volume pair
///
/// Both channels are always in the range `[0.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Balance {
    /// The left channel volume
    pub left: f32,
    /// The right channel volume
    pub right: f32,
}

impl Default for Balance {
    fn default() -> Self {
        Balance::CENTERED
    }
}

impl Balance {
    /// Both channels at half volume
    pub const CENTERED: Self = Balance {
        left: CENTER,
        right: CENTER,
    };
    /// Create a new balance, clamping both channels to `[0.0, 1.0]`
    pub fn new(left: f32, right: f32) -> Self {
        Balance {
            left: clamp_unit(left),
            right: clamp_unit(right),
        }
    }
    /// Create a balance from a swing around the center
    ///
    /// A swing of `-1.0` is all left, `1.0` is all right.
    /// The resulting channels always sum to `1.0`.
    pub fn from_swing(swing: f32) -> Self {
        let half = swing.clamp(-1.0, 1.0) / 2.0;
        Balance::new(CENTER - half, CENTER + half)
    }
    /// Create a balance from integer percentages, clamping each to `0..=100`
    pub fn from_percent(left: i64, right: i64) -> Self {
        Balance {
            left: left.clamp(0, 100) as f32 / 100.0,
            right: right.clamp(0, 100) as f32 / 100.0,
        }
    }
    /// Get the channels as rounded percentages
    pub fn percent(&self) -> (u8, u8) {
        let p = |x: f32| (x * 100.0).round() as u8;
        (p(self.left), p(self.right))
    }
    /// Get the channels as an array, left first
    pub fn channels(&self) -> [f32; 2] {
        [self.left, self.right]
    }
}

/// An error encountered when parsing a [`Balance`] from `L/R` notation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseBalanceError {
    /// The input did not contain exactly one `/`
    #[error("expected `L/R`, e.g. `40/60`")]
    Format,
    /// One of the sides was not an integer
    #[error("invalid percentage: {0}")]
    Number(#[from] ParseIntError),
}

/// Parses integer percentages in `L/R` notation, e.g. `40/8`
///
/// Out of range percentages are clamped rather than rejected.
impl FromStr for Balance {
    type Err = ParseBalanceError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (left, right) = s.trim().split_once('/').ok_or(ParseBalanceError::Format)?;
        if right.contains('/') {
            return Err(ParseBalanceError::Format);
        }
        Ok(Balance::from_percent(
            left.trim().parse()?,
            right.trim().parse()?,
        ))
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let (left, right) = self.percent();
        write!(f, "{left}/{right}")
    }
}
