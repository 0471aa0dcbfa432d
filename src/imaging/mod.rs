//! Image processing: focus-preserving fills, pure Rust.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::image_dimensions` |
//! | **Plan** | [`plan_crop`] (pure math, no pixels) |
//! | **Resize** | Lanczos3 `resize_exact` |
//! | **Crop** | `crop_imm` |
//! | **Encode** | JPEG / AVIF with quality, PNG / TIFF / WebP lossless |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for crop planning (unit testable)
//! - **Parameters**: Data structures describing fill requests
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
pub mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{CropAxis, CropPlan, apply_upscale_policy, is_same_size, plan_crop};
pub use operations::{
    FillOutcome, FillResult, apply_crop_plan, focus_fill, get_dimensions, plan_fill,
};
pub use params::{FillMode, Quality};
pub use rust_backend::{RustBackend, is_supported_input, supported_input_extensions};
