use std::fmt;
use std::str::FromStr;

use glam::Vec2;
use thiserror::Error;

/// Width and height of one pixel block, in render-target pixels.
pub type BlockSize = Vec2;

/// Block size used when the caller does not supply one.
pub const DEFAULT_BLOCK_SIZE: f32 = 10.0;

// ---------------------------------------------------------------------------
// Size: the accepted input shapes
// ---------------------------------------------------------------------------

/// A block size in one of the three shapes the filter accepts.
///
/// All three resolve to the same canonical [`BlockSize`], but they are
/// applied differently to the uniform state: `Pair` replaces the uniform
/// buffer wholesale, `Scalar` and `Point` write through the per-axis setters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Size {
    /// Square blocks, `s × s`.
    Scalar(f32),
    /// `[x, y]` as an ordered pair.
    Pair([f32; 2]),
    /// A point-like value with `x`/`y` fields.
    Point(Vec2),
}

impl Size {
    /// Build a `Size` from a dynamically-sized sequence.
    ///
    /// One element is a scalar, two are a pair; any other length is a shape
    /// error.
    pub fn from_slice(values: &[f32]) -> Result<Self, SizeError> {
        match *values {
            [s] => Ok(Size::Scalar(s)),
            [x, y] => Ok(Size::Pair([x, y])),
            _ => Err(SizeError::WrongLength(values.len())),
        }
    }

    pub fn block_size(self) -> BlockSize {
        match self {
            Size::Scalar(s) => Vec2::splat(s),
            Size::Pair([x, y]) => Vec2::new(x, y),
            Size::Point(p) => p,
        }
    }

    /// True when either axis would make the sampling grid degenerate.
    pub fn is_degenerate(self) -> bool {
        is_degenerate(self.block_size())
    }
}

impl Default for Size {
    fn default() -> Self {
        Size::Scalar(DEFAULT_BLOCK_SIZE)
    }
}

/// Zero, negative or non-finite components give an unspecified image.
pub fn is_degenerate(size: BlockSize) -> bool {
    !(size.x.is_finite() && size.y.is_finite() && size.x > 0.0 && size.y > 0.0)
}

impl From<f32> for Size {
    fn from(s: f32) -> Self {
        Size::Scalar(s)
    }
}

impl From<[f32; 2]> for Size {
    fn from(pair: [f32; 2]) -> Self {
        Size::Pair(pair)
    }
}

impl From<(f32, f32)> for Size {
    fn from((x, y): (f32, f32)) -> Self {
        Size::Pair([x, y])
    }
}

impl From<Vec2> for Size {
    fn from(p: Vec2) -> Self {
        Size::Point(p)
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Size::Scalar(s) => write!(f, "{s}"),
            Size::Pair([x, y]) => write!(f, "{x},{y}"),
            Size::Point(p) => write!(f, "({}, {})", p.x, p.y),
        }
    }
}

/// Parses `"12"` as a scalar and `"5,15"` or `"5x15"` as a pair.
impl FromStr for Size {
    type Err = SizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(SizeError::Empty);
        }
        let values = trimmed
            .split([',', 'x', 'X'])
            .map(|part| {
                let part = part.trim();
                part.parse::<f32>()
                    .map_err(|_| SizeError::NotANumber(part.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Size::from_slice(&values)
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SizeError {
    #[error("block size must have 1 or 2 components, got {0}")]
    WrongLength(usize),
    #[error("block size component {0:?} is not a number")]
    NotANumber(String),
    #[error("block size is empty")]
    Empty,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
