//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait is the only place pixels are touched. It
//! exposes the handful of manipulations a crop plan translates into:
//! resize-by-width, resize-by-height, exact resize and rectangular crop,
//! plus identify/load/save around them.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate. Tests use the recording `MockBackend` in this module, whose
//! "images" are just their dimensions.

use super::params::Quality;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Pixel dimensions of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Trait for image processing backends.
///
/// Manipulations take the image by value and hand back the result, so a
/// backend is free to reuse buffers. `Sync` so one backend can serve a rayon
/// pool.
pub trait ImageBackend: Sync {
    /// In-memory image handle.
    type Image;

    /// Get image dimensions without decoding pixels where possible.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Decode an image from disk.
    fn load(&self, path: &Path) -> Result<Self::Image, BackendError>;

    /// Dimensions of an in-memory image.
    fn dimensions(&self, image: &Self::Image) -> Dimensions;

    /// Scale to `width`, height follows the aspect ratio.
    fn resize_by_width(&self, image: Self::Image, width: u32) -> Result<Self::Image, BackendError>;

    /// Scale to `height`, width follows the aspect ratio.
    fn resize_by_height(&self, image: Self::Image, height: u32)
    -> Result<Self::Image, BackendError>;

    /// Scale to exactly `width` x `height`.
    fn resize(&self, image: Self::Image, width: u32, height: u32)
    -> Result<Self::Image, BackendError>;

    /// Cut out the `width` x `height` rectangle whose top-left corner is at
    /// (`left`, `top`).
    fn crop(
        &self,
        image: Self::Image,
        top: u32,
        left: u32,
        width: u32,
        height: u32,
    ) -> Result<Self::Image, BackendError>;

    /// Encode to `path`, format chosen by extension.
    fn save(&self, image: &Self::Image, path: &Path, quality: Quality) -> Result<(), BackendError>;
}
