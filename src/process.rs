//! Batch processing of focus-point fill jobs.
//!
//! Takes a JSON job manifest listing source images, their focus points and
//! the variants to produce, and renders every variant into an output
//! directory.
//!
//! ## Job Manifest
//!
//! ```json
//! {
//!   "images": [
//!     {
//!       "source": "landscapes/dawn.jpg",
//!       "focus": { "x": 0.5, "y": -0.2 },
//!       "variants": [
//!         { "mode": "fill", "width": 400, "height": 300 },
//!         { "mode": "crop_width", "width": 640 }
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! Relative sources resolve against the manifest's directory. `focus`
//! defaults to the center.
//!
//! ## Output Structure
//!
//! ```text
//! out/
//! ├── manifest.json                                 # What was produced, see OutputManifest
//! ├── .cache-manifest.json                          # Cache state for the next run
//! └── landscapes/
//!     ├── dawn.FocusFill400x300-75-60.jpg
//!     └── dawn.FocusCropWidth640-75-60.jpg
//! ```
//!
//! Only plain directory names of a relative source are mirrored, so a
//! source like `../dawn.jpg` still writes inside the output directory. Jobs
//! whose variants would share an output path are rejected up front.
//!
//! ## Parallel Processing
//!
//! Images are processed in parallel on the global rayon pool. Progress is
//! reported per image as a [`ProcessEvent`] over an optional channel.

use crate::cache::{self, CacheLookup, CacheManifest, CacheStats};
use crate::config::Config;
use crate::focus::FocusPoint;
use crate::imaging::{
    BackendError, CropAxis, Dimensions, FillMode, FillOutcome, ImageBackend, RustBackend,
    focus_fill, get_dimensions, is_supported_input, plan_fill,
};
use crate::naming::variant_name;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;
use std::sync::mpsc::Sender;
use thiserror::Error;

/// Name of the output manifest written into the output directory.
pub const OUTPUT_MANIFEST: &str = "manifest.json";

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Image processing failed: {0}")]
    Imaging(#[from] BackendError),
    #[error("Source image not found: {0}")]
    SourceNotFound(PathBuf),
    #[error("Invalid variant for {source_path}: {variant}")]
    InvalidVariant {
        source_path: String,
        variant: String,
    },
    #[error("Two jobs write the same output: {0}")]
    DuplicateOutput(String),
}

/// Input manifest: what to produce.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobManifest {
    pub images: Vec<ImageJob>,
}

/// One source image and the variants to cut from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageJob {
    pub source: String,
    #[serde(default)]
    pub focus: FocusPoint,
    pub variants: Vec<FillMode>,
}

/// Output manifest: what was produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputManifest {
    pub images: Vec<OutputImage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputImage {
    pub source: String,
    /// Original dimensions.
    pub dimensions: Dimensions,
    pub focus: FocusPoint,
    /// Coarse focus region, e.g. `focus-left-top`.
    pub area: String,
    pub variants: Vec<OutputVariant>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputVariant {
    /// Path relative to the output directory.
    pub path: String,
    pub request: FillMode,
    pub width: u32,
    pub height: u32,
    pub crop: CropAxis,
    pub offset: u32,
    /// Focus point relative to the variant.
    pub focus: FocusPoint,
}

/// Cache outcome for a single variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantStatus {
    /// Existing output reused in place.
    Cached,
    /// Existing output copied from another path.
    Copied,
    /// Rendered through the backend.
    Rendered,
}

impl From<&CacheLookup> for VariantStatus {
    fn from(lookup: &CacheLookup) -> Self {
        match lookup {
            CacheLookup::Hit => VariantStatus::Cached,
            CacheLookup::Copy(_) => VariantStatus::Copied,
            CacheLookup::Miss => VariantStatus::Rendered,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariantInfo {
    /// Output path relative to the output directory.
    pub label: String,
    pub status: VariantStatus,
}

/// Progress events emitted while processing.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessEvent {
    Started {
        image_count: usize,
    },
    ImageProcessed {
        /// 1-based position in the job manifest.
        index: usize,
        source: String,
        dimensions: Dimensions,
        focus: FocusPoint,
        variants: Vec<VariantInfo>,
    },
}

/// Result of a processing run.
#[derive(Debug)]
pub struct ProcessResult {
    pub manifest: OutputManifest,
    pub cache_stats: CacheStats,
}

/// Run the jobs in `jobs_path` with the [`RustBackend`].
pub fn process(
    jobs_path: &Path,
    output_dir: &Path,
    config: &Config,
    use_cache: bool,
    progress: Option<Sender<ProcessEvent>>,
) -> Result<ProcessResult, ProcessError> {
    let backend = RustBackend::new();
    process_with_backend(&backend, jobs_path, output_dir, config, use_cache, progress)
}

/// Run the jobs in `jobs_path` with a specific backend (allows testing with mock).
pub fn process_with_backend(
    backend: &impl ImageBackend,
    jobs_path: &Path,
    output_dir: &Path,
    config: &Config,
    use_cache: bool,
    progress: Option<Sender<ProcessEvent>>,
) -> Result<ProcessResult, ProcessError> {
    let content = std::fs::read_to_string(jobs_path)?;
    let jobs: JobManifest = serde_json::from_str(&content)?;
    let source_root = jobs_path.parent().unwrap_or(Path::new("."));

    // Fail before any work if a job is unusable
    let mut outputs = HashSet::new();
    for job in &jobs.images {
        let source = source_root.join(&job.source);
        if !source.exists() {
            return Err(ProcessError::SourceNotFound(source));
        }
        if let Some(bad) = job.variants.iter().find(|v| !v.is_valid()) {
            return Err(ProcessError::InvalidVariant {
                source_path: job.source.clone(),
                variant: bad.to_string(),
            });
        }
        for mode in &job.variants {
            let path = variant_path(job, mode, &config.output.format);
            if !outputs.insert(path.clone()) {
                return Err(ProcessError::DuplicateOutput(path));
            }
        }
    }

    std::fs::create_dir_all(output_dir)?;

    let cache = Mutex::new(if use_cache {
        CacheManifest::load(output_dir)
    } else {
        CacheManifest::empty()
    });
    let stats = Mutex::new(CacheStats::default());

    if let Some(tx) = &progress {
        tx.send(ProcessEvent::Started {
            image_count: jobs.images.len(),
        })
        .ok();
    }

    let ctx = RunContext {
        backend,
        source_root,
        output_dir,
        config,
        cache: &cache,
        stats: &stats,
    };

    let images = jobs
        .images
        .par_iter()
        .enumerate()
        .map(|(i, job)| -> Result<OutputImage, ProcessError> {
            let (image, infos) = ctx.process_image(job)?;
            if let Some(tx) = &progress {
                tx.send(ProcessEvent::ImageProcessed {
                    index: i + 1,
                    source: image.source.clone(),
                    dimensions: image.dimensions,
                    focus: image.focus,
                    variants: infos,
                })
                .ok();
            }
            Ok(image)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let manifest = OutputManifest { images };
    let json = serde_json::to_string_pretty(&manifest)?;
    std::fs::write(output_dir.join(OUTPUT_MANIFEST), json)?;

    let cache = cache.into_inner().unwrap_or_else(|e| e.into_inner());
    cache.save(output_dir)?;

    Ok(ProcessResult {
        manifest,
        cache_stats: stats.into_inner().unwrap_or_else(|e| e.into_inner()),
    })
}

/// Shared, read-mostly state of one run.
struct RunContext<'a, B> {
    backend: &'a B,
    source_root: &'a Path,
    output_dir: &'a Path,
    config: &'a Config,
    cache: &'a Mutex<CacheManifest>,
    stats: &'a Mutex<CacheStats>,
}

impl<B: ImageBackend> RunContext<'_, B> {
    fn process_image(&self, job: &ImageJob) -> Result<(OutputImage, Vec<VariantInfo>), ProcessError> {
        let source = self.source_root.join(&job.source);
        let dimensions = get_dimensions(self.backend, &source)?;
        let source_hash = cache::hash_file(&source)?;
        let quality = self.config.output.quality();
        let format = &self.config.output.format;

        let mut variants = Vec::with_capacity(job.variants.len());
        let mut infos = Vec::with_capacity(job.variants.len());

        for mode in &job.variants {
            let rel_path = variant_path(job, mode, format);
            let output = self.output_dir.join(&rel_path);
            let params_hash = cache::hash_fill_params(mode, &job.focus, quality.value(), format);

            let lookup = self
                .lock_cache()
                .lookup(&source_hash, &params_hash, &rel_path, self.output_dir);

            if let Some(parent) = output.parent() {
                std::fs::create_dir_all(parent)?;
            }
            match &lookup {
                CacheLookup::Hit => {}
                CacheLookup::Copy(stored) => {
                    std::fs::copy(self.output_dir.join(stored), &output)?;
                }
                CacheLookup::Miss => {
                    focus_fill(self.backend, &source, &output, job.focus, *mode, quality)?;
                }
            }

            self.lock_cache()
                .insert(rel_path.clone(), source_hash.clone(), params_hash);
            self.stats
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .record(&lookup);

            variants.push(describe_variant(rel_path.clone(), dimensions, job.focus, *mode));
            infos.push(VariantInfo {
                label: rel_path,
                status: VariantStatus::from(&lookup),
            });
        }

        let image = OutputImage {
            source: job.source.clone(),
            dimensions,
            focus: job.focus,
            area: job.focus.area().to_string(),
            variants,
        };
        Ok((image, infos))
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, CacheManifest> {
        self.cache.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Record for a variant, derived from its plan so cached and rendered
/// variants are described identically.
fn describe_variant(
    path: String,
    original: Dimensions,
    focus: FocusPoint,
    request: FillMode,
) -> OutputVariant {
    match plan_fill(original, focus, request) {
        FillOutcome::Resample(plan) => OutputVariant {
            path,
            request,
            width: plan.width,
            height: plan.height,
            crop: plan.axis,
            offset: plan.offset,
            focus: plan.focus,
        },
        FillOutcome::Unchanged | FillOutcome::Unplannable => OutputVariant {
            path,
            request,
            width: original.width,
            height: original.height,
            crop: CropAxis::None,
            offset: 0,
            focus,
        },
    }
}

/// Output path of one variant of `job`, relative to the output directory.
fn variant_path(job: &ImageJob, mode: &FillMode, format: &str) -> String {
    let stem = Path::new(&job.source)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| job.source.clone());
    let file_name = format!("{}.{}", variant_name(&stem, mode, &job.focus), format);
    output_relative_path(&job.source, &file_name)
}

/// Output path for `file_name` relative to the output directory. Relative
/// sources keep their directory so equal stems in different folders never
/// collide. Only plain directory names are kept, so `..` never leaves the
/// output directory.
fn output_relative_path(source: &str, file_name: &str) -> String {
    let source = Path::new(source);
    let mut path = PathBuf::new();
    if source.is_relative()
        && let Some(dir) = source.parent()
    {
        path.extend(dir.components().filter(|c| matches!(c, Component::Normal(_))));
    }
    path.push(file_name);
    path.to_string_lossy().into_owned()
}

/// Build a job manifest for every supported image under `dir`.
///
/// Sources are relative to `dir`, focus points are centered and each image
/// gets `variants`. Hidden files and directories are skipped.
pub fn init_jobs(dir: &Path, variants: &[FillMode]) -> Result<JobManifest, ProcessError> {
    let mut images = Vec::new();

    let walker = walkdir::WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'));

    for entry in walker {
        let entry = entry.map_err(|e| ProcessError::Io(e.into()))?;
        if !entry.file_type().is_file() || !is_supported_input(entry.path()) {
            continue;
        }
        let rel = entry.path().strip_prefix(dir).unwrap_or(entry.path());
        images.push(ImageJob {
            source: rel.to_string_lossy().into_owned(),
            focus: FocusPoint::centered(),
            variants: variants.to_vec(),
        });
    }

    Ok(JobManifest { images })
}
