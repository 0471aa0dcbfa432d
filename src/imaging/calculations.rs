//! Pure calculation functions for focus-point cropping.
//!
//! All functions here are pure and testable without any I/O or images.
//!
//! The planner answers one question: after scaling an image so it covers the
//! target frame, which axis overflows and where should the window sit on that
//! axis so the focus point ends up as close to the frame center as possible
//! without exposing anything past the image edges?

use super::backend::Dimensions;
use crate::focus::{Axis, FocusPoint, coord_to_offset, offset_to_coord};
use serde::{Deserialize, Serialize};

/// Which axis (if any) loses pixels when filling the target frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CropAxis {
    /// Aspect ratios match: scale straight to the target.
    None,
    /// Left and/or right are lost.
    X,
    /// Top and/or bottom are lost.
    Y,
}

impl CropAxis {
    fn of(axis: Axis) -> Self {
        match axis {
            Axis::X => CropAxis::X,
            Axis::Y => CropAxis::Y,
        }
    }
}

/// Computed crop for one (image, target, focus) request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropPlan {
    pub axis: CropAxis,
    /// Pixel offset of the crop window on the cropped axis, measured from the
    /// left (x) or top (y) edge of the scaled image.
    pub offset: u32,
    /// Final output width.
    pub width: u32,
    /// Final output height.
    pub height: u32,
    /// Length of the cropped axis after scaling, before cropping.
    /// Zero when nothing is cropped.
    pub scaled_length: u32,
    /// Focus point relative to the cropped output.
    pub focus: FocusPoint,
}

impl CropPlan {
    /// Length of the output frame on the cropped axis.
    pub fn target_length(&self) -> u32 {
        match self.axis {
            CropAxis::Y => self.height,
            _ => self.width,
        }
    }
}

/// Per-axis inputs of the planner.
struct AxisLengths {
    original: f64,
    target: f64,
}

/// Plan a focus-preserving crop of `original` to `target`.
///
/// Target dimensions are rounded to whole pixels first (they often come out
/// of ratio math upstream). Returns `None` when the original has a zero
/// dimension; callers should then leave the image alone.
///
/// # Examples
/// ```
/// # use focuspoint::imaging::{CropAxis, Dimensions, plan_crop};
/// # use focuspoint::focus::FocusPoint;
/// let plan = plan_crop(
///     Dimensions { width: 1000, height: 500 },
///     (200.0, 200.0),
///     FocusPoint::centered(),
/// )
/// .unwrap();
/// assert_eq!(plan.axis, CropAxis::X);
/// assert_eq!(plan.offset, 100);
/// ```
pub fn plan_crop(original: Dimensions, target: (f64, f64), focus: FocusPoint) -> Option<CropPlan> {
    if original.width == 0 || original.height == 0 {
        return None;
    }

    let target_w = target.0.round();
    let target_h = target.1.round();
    let x = AxisLengths {
        original: original.width as f64,
        target: target_w,
    };
    let y = AxisLengths {
        original: original.height as f64,
        target: target_h,
    };

    let ratio_x = x.original / x.target;
    let ratio_y = y.original / y.target;

    let (axis, lengths, scale) = if ratio_x < ratio_y {
        // Width fits exactly, height overflows
        (Axis::Y, &y, ratio_x)
    } else if ratio_x > ratio_y {
        // Height fits exactly, width overflows
        (Axis::X, &x, ratio_y)
    } else {
        return Some(CropPlan {
            axis: CropAxis::None,
            offset: 0,
            width: target_w as u32,
            height: target_h as u32,
            scaled_length: 0,
            focus,
        });
    };

    let focus_offset = coord_to_offset(axis, focus.get(axis));
    let scaled_length = (lengths.original / scale).floor();
    let focus_pos = (focus_offset * scaled_length).floor();
    let frame_center = (lengths.target / 2.0).floor();

    let mut shift = focus_pos - frame_center;

    // Pull the window back if it would run past the far edge
    let remainder = scaled_length - focus_pos;
    let needed = lengths.target - frame_center;
    if remainder < needed {
        shift -= needed - remainder;
    }
    // ...and never start before the near edge
    let shift = shift.max(0.0);

    let new_offset = (focus_pos - shift) / lengths.target;

    Some(CropPlan {
        axis: CropAxis::of(axis),
        offset: shift as u32,
        width: target_w as u32,
        height: target_h as u32,
        scaled_length: scaled_length as u32,
        focus: focus.with(axis, offset_to_coord(axis, new_offset)),
    })
}

/// Shrink a target so that filling it never enlarges the original.
///
/// When `allow_upscale` is false and the target is larger than the original
/// on its more constraining axis, that axis is pinned to the original length
/// and the other is scaled by the same ratio, keeping the *requested* aspect
/// ratio. The scaled side never rounds below one pixel. Otherwise the
/// target passes through unchanged.
///
/// # Examples
/// ```
/// # use focuspoint::imaging::{Dimensions, apply_upscale_policy};
/// let original = Dimensions { width: 400, height: 300 };
/// assert_eq!(apply_upscale_policy(original, (800.0, 400.0), false), (400.0, 200.0));
/// assert_eq!(apply_upscale_policy(original, (800.0, 400.0), true), (800.0, 400.0));
/// ```
pub fn apply_upscale_policy(
    original: Dimensions,
    target: (f64, f64),
    allow_upscale: bool,
) -> (f64, f64) {
    if allow_upscale {
        return target;
    }

    let (width, height) = target;
    let original_w = original.width as f64;
    let original_h = original.height as f64;
    let width_ratio = original_w / width;
    let height_ratio = original_h / height;

    if width_ratio < 1.0 && width_ratio <= height_ratio {
        (original_w, (height * width_ratio).round().max(1.0))
    } else if height_ratio < 1.0 {
        ((width * height_ratio).round().max(1.0), original_h)
    } else {
        target
    }
}

/// Whether a target rounds to exactly the original size.
pub fn is_same_size(original: Dimensions, target: (f64, f64)) -> bool {
    target.0.round() == original.width as f64 && target.1.round() == original.height as f64
}


// ============================================================================
// Property-Based Tests
// ============================================================================
