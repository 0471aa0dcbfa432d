//! # focuspoint
//!
//! Focus-point aware cropping. Given an image, a target frame and a focus
//! point, resize the image to cover the frame and cut away the overflow
//! so the focus point stays in view, as close to the frame center as the
//! image edges allow.
//!
//! # Coordinates
//!
//! Focus points live in a normalized square: `x` runs from -1 (left edge) to
//! 1 (right edge), `y` from -1 (bottom edge) to 1 (top edge), and `(0, 0)` is
//! the center. The y axis points *up*, unlike pixel rows. See [`focus`].
//!
//! # Pipeline
//!
//! ```text
//! focus point + target  →  CropPlan       (pure math, imaging::calculations)
//! CropPlan + source     →  output image   (backend calls, imaging::operations)
//! jobs.json             →  out/           (batch, cached, parallel: process)
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`focus`] | Focus point type, coordinate ↔ offset transforms, coarse focus areas |
//! | [`imaging`] | Crop planner, upscale policy, fill operations, image backend |
//! | [`naming`] | Variant file names carrying operation, size and focus |
//! | [`cache`] | Content-addressed cache of rendered variants |
//! | [`config`] | `config.toml` loading, merging and validation |
//! | [`process`] | Batch processing of JSON job manifests |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Planning Is Pure
//!
//! [`imaging::plan_crop`] touches no pixels and performs no I/O. Everything
//! geometric (which axis to crop, by how much, where the focus ends up) is
//! decided there and is property-tested; backends only execute the plan.
//!
//! ## Pure-Rust Imaging
//!
//! The [`imaging`] module uses the `image` crate for decoding, Lanczos3
//! resampling and encoding, so the binary has no system dependencies.

pub mod cache;
pub mod config;
pub mod focus;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod process;
