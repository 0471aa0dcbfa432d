//! Focus point value type and the coordinate transforms around it.
//!
//! A focus point is stored as two normalized coordinates in `[-1, 1]`:
//!
//! ```text
//!              y =  1 (top)
//!                   │
//!   x = -1 ─────────┼───────── x = 1
//!   (left)          │          (right)
//!              y = -1 (bottom)
//! ```
//!
//! Pixel math works with *offsets* instead: `[0, 1]` measured from the left
//! edge (x) or the **top** edge (y). The y axis therefore flips between the
//! two conventions, which is why every transform takes an [`Axis`].
//!
//! Values outside the nominal ranges are accepted everywhere and extrapolate
//! linearly.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Image axis a transform or crop applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
}

/// Turn a focus coordinate into an offset from the left (x) or top (y) edge.
///
/// ```
/// use focuspoint::focus::{Axis, coord_to_offset};
/// assert_eq!(coord_to_offset(Axis::X, 0.5), 0.75);
/// assert_eq!(coord_to_offset(Axis::Y, -0.5), 0.75);
/// ```
pub fn coord_to_offset(axis: Axis, coord: f64) -> f64 {
    match axis {
        Axis::X => (coord + 1.0) * 0.5,
        Axis::Y => (1.0 - coord) * 0.5,
    }
}

/// Turn a left/top offset back into a focus coordinate.
///
/// Exact inverse of [`coord_to_offset`] up to floating-point rounding.
pub fn offset_to_coord(axis: Axis, offset: f64) -> f64 {
    match axis {
        Axis::X => offset * 2.0 - 1.0,
        Axis::Y => 1.0 - offset * 2.0,
    }
}

/// Where the interesting part of an image sits.
///
/// `Default` is the centre, which reproduces a plain center crop.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FocusPoint {
    /// -1 is far left, 0 is center, 1 is far right.
    #[serde(default)]
    pub x: f64,
    /// -1 is bottom, 0 is center, 1 is top.
    #[serde(default)]
    pub y: f64,
}

impl FocusPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn centered() -> Self {
        Self::default()
    }

    /// Coordinate on the given axis.
    pub fn get(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
        }
    }

    /// Copy of this point with one coordinate replaced.
    pub fn with(self, axis: Axis, coord: f64) -> Self {
        match axis {
            Axis::X => Self { x: coord, ..self },
            Axis::Y => Self { y: coord, ..self },
        }
    }

    /// Horizontal position as a whole percentage from the left edge.
    ///
    /// Suitable for CSS `background-position`: x = 0.5 gives 75.
    pub fn percentage_x(&self) -> i64 {
        (coord_to_offset(Axis::X, self.x) * 100.0).round() as i64
    }

    /// Vertical position as a whole percentage from the top edge.
    ///
    /// y = -0.5 gives 75.
    pub fn percentage_y(&self) -> i64 {
        (coord_to_offset(Axis::Y, self.y) * 100.0).round() as i64
    }

    /// Coarse 3×3 zone this point falls in.
    pub fn area(&self) -> FocusArea {
        FocusArea::of(self)
    }
}

impl fmt::Display for FocusPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum FocusParseError {
    #[error("expected `x,y`, got {0:?}")]
    Format(String),
    #[error("invalid coordinate {0:?}")]
    Coordinate(String),
}

impl FromStr for FocusPoint {
    type Err = FocusParseError;

    /// Parse `"x,y"`, e.g. `"0.5,-0.25"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (x, y) = s
            .split_once(',')
            .ok_or_else(|| FocusParseError::Format(s.to_string()))?;
        let parse = |part: &str| {
            part.trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| FocusParseError::Coordinate(part.trim().to_string()))
        };
        Ok(Self::new(parse(x)?, parse(y)?))
    }
}

/// Horizontal third of a [`FocusArea`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Horizontal {
    Left,
    Center,
    Right,
}

/// Vertical third of a [`FocusArea`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vertical {
    Top,
    Center,
    Bottom,
}

/// Boundary between the center third and the outer thirds.
const THIRD: f64 = 0.333;

/// One cell of a 3×3 grid over the image, e.g. bottom-left.
///
/// Displays as a CSS class name: `focus-left-bottom`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusArea {
    pub horizontal: Horizontal,
    pub vertical: Vertical,
}

impl FocusArea {
    pub fn of(focus: &FocusPoint) -> Self {
        let horizontal = if focus.x > THIRD {
            Horizontal::Right
        } else if focus.x < -THIRD {
            Horizontal::Left
        } else {
            Horizontal::Center
        };
        let vertical = if focus.y > THIRD {
            Vertical::Top
        } else if focus.y < -THIRD {
            Vertical::Bottom
        } else {
            Vertical::Center
        };
        Self {
            horizontal,
            vertical,
        }
    }
}

impl fmt::Display for FocusArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let h = match self.horizontal {
            Horizontal::Left => "left",
            Horizontal::Center => "center",
            Horizontal::Right => "right",
        };
        let v = match self.vertical {
            Vertical::Top => "top",
            Vertical::Center => "center",
            Vertical::Bottom => "bottom",
        };
        write!(f, "focus-{h}-{v}")
    }
}
