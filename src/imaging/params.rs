//! Parameter types for image operations.
//!
//! These types describe *what* to do, not *how* to do it. They are the
//! interface between callers (CLI, batch processing) and the
//! [`operations`](super::operations) module, which turns them into crop plans
//! and backend calls.
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (1–100, default 90). Clamped on construction.
//! - [`FillMode`]: Which fill operation to run and its target size.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// A focus-preserving resize request.
///
/// Serialized with a `mode` tag so job manifests can spell it out:
/// `{ "mode": "fill_max", "width": 800, "height": 600 }`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum FillMode {
    /// Resize and crop to fill the frame, enlarging if needed.
    Fill { width: f64, height: f64 },
    /// Like [`FillMode::Fill`] but never enlarges: the frame shrinks to fit
    /// the original while keeping its aspect ratio.
    FillMax { width: f64, height: f64 },
    /// Crop the width down to `width` if the image is wider, keeping height.
    CropWidth { width: f64 },
    /// Crop the height down to `height` if the image is taller, keeping width.
    CropHeight { height: f64 },
}

impl FillMode {
    /// Operation label used in variant names and cache keys.
    pub fn label(&self) -> &'static str {
        match self {
            FillMode::Fill { .. } => "FocusFill",
            FillMode::FillMax { .. } => "FocusFillMax",
            FillMode::CropWidth { .. } => "FocusCropWidth",
            FillMode::CropHeight { .. } => "FocusCropHeight",
        }
    }

    /// Whether the requested dimensions are usable (finite, at least one
    /// pixel after rounding).
    pub fn is_valid(&self) -> bool {
        let ok = |v: f64| v.is_finite() && v.round() >= 1.0;
        match *self {
            FillMode::Fill { width, height } | FillMode::FillMax { width, height } => {
                ok(width) && ok(height)
            }
            FillMode::CropWidth { width } => ok(width),
            FillMode::CropHeight { height } => ok(height),
        }
    }
}

impl fmt::Display for FillMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            FillMode::Fill { width, height } | FillMode::FillMax { width, height } => {
                write!(f, "{} {}x{}", self.label(), width, height)
            }
            FillMode::CropWidth { width } => write!(f, "{} {}", self.label(), width),
            FillMode::CropHeight { height } => write!(f, "{} {}", self.label(), height),
        }
    }
}
