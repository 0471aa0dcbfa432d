//! High-level image operations.
//!
//! These functions combine calculations with backend execution.
//! They take a fill request, compute a crop plan, and call the backend.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::{CropAxis, CropPlan, apply_upscale_policy, is_same_size, plan_crop};
use super::params::{FillMode, Quality};
use crate::focus::FocusPoint;
use serde::Serialize;
use std::path::Path;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Get image dimensions using the backend.
pub fn get_dimensions(backend: &impl ImageBackend, path: &Path) -> Result<Dimensions> {
    backend.identify(path)
}

/// What a fill request resolves to for a given original.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FillOutcome {
    /// The original already satisfies the request.
    Unchanged,
    /// Resample according to the plan.
    Resample(CropPlan),
    /// The original has a zero dimension; no plan is possible.
    Unplannable,
}

/// Decide how to satisfy `mode` for an image of size `original`.
///
/// Applies the upscale policy (for [`FillMode::FillMax`]), short-circuits
/// requests that resolve to the original size, then plans the crop.
pub fn plan_fill(original: Dimensions, focus: FocusPoint, mode: FillMode) -> FillOutcome {
    let (target, allow_upscale) = match mode {
        FillMode::Fill { width, height } => ((width, height), true),
        FillMode::FillMax { width, height } => ((width, height), false),
        FillMode::CropWidth { width } => {
            if original.width as f64 <= width {
                return FillOutcome::Unchanged;
            }
            ((width, original.height as f64), true)
        }
        FillMode::CropHeight { height } => {
            if original.height as f64 <= height {
                return FillOutcome::Unchanged;
            }
            ((original.width as f64, height), true)
        }
    };

    let target = apply_upscale_policy(original, target, allow_upscale);
    if is_same_size(original, target) {
        return FillOutcome::Unchanged;
    }

    match plan_crop(original, target, focus) {
        Some(plan) => FillOutcome::Resample(plan),
        None => FillOutcome::Unplannable,
    }
}

/// Drive the backend through a crop plan.
///
/// - x crop: scale to the target height, then cut the target width at the offset
/// - y crop: scale to the target width, then cut the target height at the offset
/// - no crop: scale straight to the target
pub fn apply_crop_plan<B: ImageBackend>(
    backend: &B,
    image: B::Image,
    plan: &CropPlan,
) -> Result<B::Image> {
    match plan.axis {
        CropAxis::X => {
            let scaled = backend.resize_by_height(image, plan.height)?;
            backend.crop(scaled, 0, plan.offset, plan.width, plan.height)
        }
        CropAxis::Y => {
            let scaled = backend.resize_by_width(image, plan.width)?;
            backend.crop(scaled, plan.offset, 0, plan.width, plan.height)
        }
        CropAxis::None => backend.resize(image, plan.width, plan.height),
    }
}

/// A produced fill variant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FillResult {
    pub width: u32,
    pub height: u32,
    /// Focus point relative to the output image.
    pub focus: FocusPoint,
    /// The plan that was executed; `None` when the source was kept as is.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<CropPlan>,
}

/// Fill `mode`'s frame from `source`, keeping `focus` in view, and write the
/// result to `output`.
///
/// When no resampling is needed (or possible) the source is re-encoded at its
/// own size so callers always get an output file.
pub fn focus_fill(
    backend: &impl ImageBackend,
    source: &Path,
    output: &Path,
    focus: FocusPoint,
    mode: FillMode,
    quality: Quality,
) -> Result<FillResult> {
    let original = backend.identify(source)?;
    let outcome = plan_fill(original, focus, mode);
    let image = backend.load(source)?;

    let (image, plan) = match outcome {
        FillOutcome::Resample(plan) => (apply_crop_plan(backend, image, &plan)?, Some(plan)),
        FillOutcome::Unchanged | FillOutcome::Unplannable => (image, None),
    };

    backend.save(&image, output, quality)?;

    let dims = backend.dimensions(&image);
    Ok(FillResult {
        width: dims.width,
        height: dims.height,
        focus: plan.map(|p| p.focus).unwrap_or(focus),
        plan,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};

    fn fill(width: f64, height: f64) -> FillMode {
        FillMode::Fill { width, height }
    }

    fn fill_max(width: f64, height: f64) -> FillMode {
        FillMode::FillMax { width, height }
    }

    #[test]
    fn get_dimensions_calls_backend() {
        let backend = MockBackend::with_source(1920, 1080);

        let dims = get_dimensions(&backend, Path::new("/test.jpg")).unwrap();
        assert_eq!(dims, Dimensions::new(1920, 1080));
    }

    // =========================================================================
    // plan_fill tests
    // =========================================================================

    #[test]
    fn plan_fill_same_size_is_unchanged() {
        let outcome = plan_fill(
            Dimensions::new(400, 300),
            FocusPoint::default(),
            fill(400.0, 300.0),
        );
        assert_eq!(outcome, FillOutcome::Unchanged);
    }

    #[test]
    fn plan_fill_zero_dimension_is_unplannable() {
        let outcome = plan_fill(Dimensions::new(0, 300), FocusPoint::default(), fill(100.0, 100.0));
        assert_eq!(outcome, FillOutcome::Unplannable);
    }

    #[test]
    fn plan_fill_crops_wide_image() {
        let outcome = plan_fill(
            Dimensions::new(1000, 500),
            FocusPoint::default(),
            fill(200.0, 200.0),
        );
        let FillOutcome::Resample(plan) = outcome else {
            panic!("expected a plan, got {outcome:?}");
        };
        assert_eq!(plan.axis, CropAxis::X);
        assert_eq!(plan.offset, 100);
    }

    #[test]
    fn plan_fill_allows_upscale() {
        let outcome = plan_fill(
            Dimensions::new(400, 300),
            FocusPoint::default(),
            fill(800.0, 800.0),
        );
        let FillOutcome::Resample(plan) = outcome else {
            panic!("expected a plan, got {outcome:?}");
        };
        assert_eq!((plan.width, plan.height), (800, 800));
    }

    #[test]
    fn plan_fill_max_sliver_keeps_one_pixel() {
        // Scaling 1000x1 down to a 1px wide original would round to 0px high
        let outcome = plan_fill(
            Dimensions::new(1, 1000),
            FocusPoint::default(),
            fill_max(1000.0, 1.0),
        );
        let FillOutcome::Resample(plan) = outcome else {
            panic!("expected a plan, got {outcome:?}");
        };
        assert_eq!((plan.width, plan.height), (1, 1));
        assert_eq!(plan.axis, CropAxis::Y);
        assert!(plan.offset < plan.scaled_length);
        assert!(plan.focus.x.is_finite() && plan.focus.y.is_finite());
    }

    #[test]
    fn plan_fill_max_never_upscales() {
        // Requested 800x400 from 400x300 → pinned to 400x200
        let outcome = plan_fill(
            Dimensions::new(400, 300),
            FocusPoint::default(),
            fill_max(800.0, 400.0),
        );
        let FillOutcome::Resample(plan) = outcome else {
            panic!("expected a plan, got {outcome:?}");
        };
        assert_eq!((plan.width, plan.height), (400, 200));
        assert_eq!(plan.axis, CropAxis::Y);
    }

    #[test]
    fn plan_fill_max_same_aspect_larger_is_unchanged() {
        let outcome = plan_fill(
            Dimensions::new(400, 300),
            FocusPoint::default(),
            fill_max(800.0, 600.0),
        );
        assert_eq!(outcome, FillOutcome::Unchanged);
    }

    #[test]
    fn plan_crop_width_narrower_image_is_unchanged() {
        let outcome = plan_fill(
            Dimensions::new(300, 600),
            FocusPoint::default(),
            FillMode::CropWidth { width: 300.0 },
        );
        assert_eq!(outcome, FillOutcome::Unchanged);
    }

    #[test]
    fn plan_crop_width_keeps_height() {
        let outcome = plan_fill(
            Dimensions::new(1000, 600),
            FocusPoint::new(1.0, 0.0),
            FillMode::CropWidth { width: 400.0 },
        );
        let FillOutcome::Resample(plan) = outcome else {
            panic!("expected a plan, got {outcome:?}");
        };
        assert_eq!(plan.axis, CropAxis::X);
        assert_eq!((plan.width, plan.height), (400, 600));
        assert_eq!(plan.scaled_length, 1000);
        assert_eq!(plan.offset, 600);
    }

    #[test]
    fn plan_crop_height_keeps_width() {
        let outcome = plan_fill(
            Dimensions::new(600, 1000),
            FocusPoint::new(0.0, 1.0),
            FillMode::CropHeight { height: 400.0 },
        );
        let FillOutcome::Resample(plan) = outcome else {
            panic!("expected a plan, got {outcome:?}");
        };
        assert_eq!(plan.axis, CropAxis::Y);
        assert_eq!((plan.width, plan.height), (600, 400));
        assert_eq!(plan.offset, 0);
    }

    #[test]
    fn plan_crop_height_shorter_image_is_unchanged() {
        let outcome = plan_fill(
            Dimensions::new(600, 300),
            FocusPoint::default(),
            FillMode::CropHeight { height: 400.0 },
        );
        assert_eq!(outcome, FillOutcome::Unchanged);
    }

    // =========================================================================
    // apply_crop_plan tests
    // =========================================================================

    #[test]
    fn apply_x_plan_resizes_by_height_then_crops_left() {
        let backend = MockBackend::new();
        let plan = plan_crop(
            Dimensions::new(1000, 500),
            (200.0, 200.0),
            FocusPoint::new(0.5, 0.0),
        )
        .unwrap();

        let out = apply_crop_plan(&backend, Dimensions::new(1000, 500), &plan).unwrap();
        assert_eq!(out, Dimensions::new(200, 200));
        assert_eq!(
            backend.get_operations(),
            vec![
                RecordedOp::ResizeByHeight(200),
                RecordedOp::Crop {
                    top: 0,
                    left: 200,
                    width: 200,
                    height: 200
                },
            ]
        );
    }

    #[test]
    fn apply_y_plan_resizes_by_width_then_crops_top() {
        let backend = MockBackend::new();
        let plan = plan_crop(
            Dimensions::new(500, 1000),
            (200.0, 200.0),
            FocusPoint::new(0.0, -1.0),
        )
        .unwrap();

        apply_crop_plan(&backend, Dimensions::new(500, 1000), &plan).unwrap();
        assert_eq!(
            backend.get_operations(),
            vec![
                RecordedOp::ResizeByWidth(200),
                RecordedOp::Crop {
                    top: 200,
                    left: 0,
                    width: 200,
                    height: 200
                },
            ]
        );
    }

    #[test]
    fn apply_uncropped_plan_resizes_directly() {
        let backend = MockBackend::new();
        let plan = plan_crop(Dimensions::new(800, 600), (400.0, 300.0), FocusPoint::default())
            .unwrap();

        apply_crop_plan(&backend, Dimensions::new(800, 600), &plan).unwrap();
        assert_eq!(
            backend.get_operations(),
            vec![RecordedOp::Resize {
                width: 400,
                height: 300
            }]
        );
    }

    // =========================================================================
    // focus_fill tests
    // =========================================================================

    #[test]
    fn focus_fill_executes_plan_and_saves() {
        let backend = MockBackend::with_source(1000, 500);

        let result = focus_fill(
            &backend,
            Path::new("/source.jpg"),
            Path::new("/out/source.jpg"),
            FocusPoint::new(1.0, 0.5),
            fill(200.0, 200.0),
            Quality::new(85),
        )
        .unwrap();

        assert_eq!((result.width, result.height), (200, 200));
        assert_eq!(result.focus, FocusPoint::new(1.0, 0.5));
        assert_eq!(result.plan.map(|p| p.offset), Some(200));

        let ops = backend.manipulations();
        assert_eq!(ops.len(), 3);
        assert_eq!(ops[0], RecordedOp::ResizeByHeight(200));
        assert!(matches!(
            &ops[2],
            RecordedOp::Save { path, width: 200, height: 200, quality: 85 } if path == "/out/source.jpg"
        ));
    }

    #[test]
    fn focus_fill_unchanged_re_encodes_original() {
        let backend = MockBackend::with_source(400, 300);
        let focus = FocusPoint::new(-0.4, 0.2);

        let result = focus_fill(
            &backend,
            Path::new("/source.jpg"),
            Path::new("/out.jpg"),
            focus,
            fill_max(1600.0, 1200.0),
            Quality::default(),
        )
        .unwrap();

        assert_eq!((result.width, result.height), (400, 300));
        assert_eq!(result.focus, focus);
        assert_eq!(result.plan, None);
        assert_eq!(
            backend.manipulations(),
            vec![RecordedOp::Save {
                path: "/out.jpg".to_string(),
                width: 400,
                height: 300,
                quality: 90
            }]
        );
    }

    #[test]
    fn focus_fill_propagates_identify_error() {
        let backend = MockBackend::new();
        let result = focus_fill(
            &backend,
            Path::new("/missing.jpg"),
            Path::new("/out.jpg"),
            FocusPoint::default(),
            fill(100.0, 100.0),
            Quality::default(),
        );
        assert!(result.is_err());
        assert!(backend.manipulations().is_empty());
    }
}
