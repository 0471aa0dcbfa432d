//! Output cache for incremental batch runs.
//!
//! Resampling and encoding dominate a batch run. This module lets the
//! process stage skip a variant when neither the source image nor the fill
//! request changed since the last run.
//!
//! ## Cache keys
//!
//! Lookups are by content, not by output path:
//!
//! - **`source_hash`**: SHA-256 of the source file contents. Content-based
//!   rather than mtime-based so it survives `git checkout`. Computed once per
//!   source and shared by all its variants.
//!
//! - **`params_hash`**: SHA-256 of the fill request: mode label, target
//!   width and height, focus percentages, quality and output format.
//!   Changing any of them re-renders the variant.
//!
//! A hit needs a matching entry *and* the recorded output still on disk. A
//! hit stored under another path (the source was renamed, say) is reported
//! as [`CacheLookup::Copy`] so the caller can copy instead of re-encoding.
//!
//! ## Storage
//!
//! The manifest is JSON at `<output_dir>/.cache-manifest.json`, next to the
//! variants it describes. `--no-cache` starts from [`CacheManifest::empty`].

use crate::focus::FocusPoint;
use crate::imaging::FillMode;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Name of the cache manifest file within the output directory.
const MANIFEST_FILENAME: &str = ".cache-manifest.json";

/// Bump to invalidate every existing cache when key computation changes.
const MANIFEST_VERSION: u32 = 2;

/// A single cached output file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheEntry {
    pub source_hash: String,
    pub params_hash: String,
}

/// Result of a cache lookup for one variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup {
    /// The expected output already holds the right content.
    Hit,
    /// The right content exists under another (relative) path.
    Copy(String),
    Miss,
}

/// On-disk cache manifest mapping output paths to their cache entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheManifest {
    pub version: u32,
    pub entries: HashMap<String, CacheEntry>,
    /// `"{source_hash}:{params_hash}"` → output path. Rebuilt on load.
    #[serde(skip)]
    content_index: HashMap<String, String>,
}

fn content_key(source_hash: &str, params_hash: &str) -> String {
    format!("{}:{}", source_hash, params_hash)
}

impl CacheManifest {
    /// Create an empty manifest (used for `--no-cache` or a first run).
    pub fn empty() -> Self {
        Self {
            version: MANIFEST_VERSION,
            entries: HashMap::new(),
            content_index: HashMap::new(),
        }
    }

    /// Load from the output directory. Missing, corrupt or outdated
    /// manifests all yield an empty one.
    pub fn load(output_dir: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(manifest_path(output_dir)) else {
            return Self::empty();
        };
        let mut manifest: Self = match serde_json::from_str(&content) {
            Ok(m) => m,
            Err(_) => return Self::empty(),
        };
        if manifest.version != MANIFEST_VERSION {
            return Self::empty();
        }
        manifest.content_index = manifest
            .entries
            .iter()
            .map(|(path, entry)| {
                (
                    content_key(&entry.source_hash, &entry.params_hash),
                    path.clone(),
                )
            })
            .collect();
        manifest
    }

    /// Save to the output directory.
    pub fn save(&self, output_dir: &Path) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(manifest_path(output_dir), json)
    }

    /// Look up the variant that should end up at `output_path` (relative to
    /// `output_dir`).
    pub fn lookup(
        &self,
        source_hash: &str,
        params_hash: &str,
        output_path: &str,
        output_dir: &Path,
    ) -> CacheLookup {
        let Some(stored) = self
            .content_index
            .get(&content_key(source_hash, params_hash))
        else {
            return CacheLookup::Miss;
        };
        if !output_dir.join(stored).exists() {
            return CacheLookup::Miss;
        }
        if stored == output_path {
            CacheLookup::Hit
        } else {
            CacheLookup::Copy(stored.clone())
        }
    }

    /// Record that `output_path` holds the given content.
    ///
    /// An entry for the same content under another path is dropped, so a
    /// renamed source does not leave stale entries behind.
    pub fn insert(&mut self, output_path: String, source_hash: String, params_hash: String) {
        let key = content_key(&source_hash, &params_hash);

        if let Some(old_path) = self.content_index.get(&key)
            && *old_path != output_path
        {
            self.entries.remove(old_path.as_str());
        }

        self.content_index.insert(key, output_path.clone());
        self.entries.insert(
            output_path,
            CacheEntry {
                source_hash,
                params_hash,
            },
        );
    }
}

/// SHA-256 hash of a file's contents, returned as a hex string.
pub fn hash_file(path: &Path) -> io::Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(format!("{:x}", Sha256::digest(&bytes)))
}

/// SHA-256 hash of a fill request encoded as `format` (a file extension).
pub fn hash_fill_params(
    mode: &FillMode,
    focus: &FocusPoint,
    quality: u32,
    format: &str,
) -> String {
    let (width, height) = match *mode {
        FillMode::Fill { width, height } | FillMode::FillMax { width, height } => {
            (width, height)
        }
        FillMode::CropWidth { width } => (width, 0.0),
        FillMode::CropHeight { height } => (0.0, height),
    };

    let mut hasher = Sha256::new();
    hasher.update(mode.label().as_bytes());
    hasher.update(b"\0");
    hasher.update((width.round() as i64).to_le_bytes());
    hasher.update((height.round() as i64).to_le_bytes());
    hasher.update(focus.percentage_x().to_le_bytes());
    hasher.update(focus.percentage_y().to_le_bytes());
    hasher.update(quality.to_le_bytes());
    hasher.update(format.to_ascii_lowercase().as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Summary of cache performance for a run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u32,
    pub copies: u32,
    pub misses: u32,
}

impl CacheStats {
    pub fn record(&mut self, lookup: &CacheLookup) {
        match lookup {
            CacheLookup::Hit => self.hits += 1,
            CacheLookup::Copy(_) => self.copies += 1,
            CacheLookup::Miss => self.misses += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.hits + self.copies + self.misses
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.hits, self.copies) {
            (0, 0) => write!(f, "{} rendered", self.misses),
            (hits, 0) => write!(
                f,
                "{} cached, {} rendered ({} total)",
                hits,
                self.misses,
                self.total()
            ),
            (hits, copies) => write!(
                f,
                "{} cached, {} copied, {} rendered ({} total)",
                hits,
                copies,
                self.misses,
                self.total()
            ),
        }
    }
}

/// Resolve the cache manifest path for an output directory.
pub fn manifest_path(output_dir: &Path) -> PathBuf {
    output_dir.join(MANIFEST_FILENAME)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn fill(width: f64, height: f64) -> FillMode {
        FillMode::Fill { width, height }
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    #[test]
    fn empty_manifest_misses() {
        let tmp = TempDir::new().unwrap();
        let m = CacheManifest::empty();
        assert_eq!(m.version, MANIFEST_VERSION);
        assert_eq!(m.lookup("s", "p", "out.jpg", tmp.path()), CacheLookup::Miss);
    }

    #[test]
    fn lookup_hit_at_same_path() {
        let tmp = TempDir::new().unwrap();
        let mut m = CacheManifest::empty();
        m.insert("dawn.FocusFill400x300-50-50.jpg".into(), "src".into(), "prm".into());
        fs::write(tmp.path().join("dawn.FocusFill400x300-50-50.jpg"), "data").unwrap();

        assert_eq!(
            m.lookup("src", "prm", "dawn.FocusFill400x300-50-50.jpg", tmp.path()),
            CacheLookup::Hit
        );
    }

    #[test]
    fn lookup_copy_from_other_path() {
        let tmp = TempDir::new().unwrap();
        let mut m = CacheManifest::empty();
        m.insert("old.FocusFill400x300-50-50.jpg".into(), "src".into(), "prm".into());
        fs::write(tmp.path().join("old.FocusFill400x300-50-50.jpg"), "data").unwrap();

        assert_eq!(
            m.lookup("src", "prm", "new.FocusFill400x300-50-50.jpg", tmp.path()),
            CacheLookup::Copy("old.FocusFill400x300-50-50.jpg".to_string())
        );
    }

    #[test]
    fn lookup_miss_when_output_deleted() {
        let tmp = TempDir::new().unwrap();
        let mut m = CacheManifest::empty();
        m.insert("gone.jpg".into(), "h".into(), "p".into());
        assert_eq!(m.lookup("h", "p", "gone.jpg", tmp.path()), CacheLookup::Miss);
    }

    #[test]
    fn lookup_miss_on_changed_params() {
        let tmp = TempDir::new().unwrap();
        let mut m = CacheManifest::empty();
        m.insert("out.jpg".into(), "hash".into(), "params_a".into());
        fs::write(tmp.path().join("out.jpg"), "data").unwrap();

        assert_eq!(
            m.lookup("hash", "params_b", "out.jpg", tmp.path()),
            CacheLookup::Miss
        );
    }

    #[test]
    fn insert_removes_stale_entry_on_path_change() {
        let mut m = CacheManifest::empty();
        m.insert("old.jpg".into(), "src".into(), "prm".into());
        m.insert("new.jpg".into(), "src".into(), "prm".into());

        assert!(!m.entries.contains_key("old.jpg"));
        assert!(m.entries.contains_key("new.jpg"));
    }

    // =========================================================================
    // Save / Load
    // =========================================================================

    #[test]
    fn save_and_load_rebuilds_index() {
        let tmp = TempDir::new().unwrap();
        let mut m = CacheManifest::empty();
        m.insert("x.jpg".into(), "s1".into(), "p1".into());
        m.insert("y.jpg".into(), "s2".into(), "p2".into());
        m.save(tmp.path()).unwrap();
        fs::write(tmp.path().join("y.jpg"), "data").unwrap();

        let loaded = CacheManifest::load(tmp.path());
        assert_eq!(loaded.entries.len(), 2);
        assert_eq!(
            loaded.entries["x.jpg"],
            CacheEntry {
                source_hash: "s1".into(),
                params_hash: "p1".into()
            }
        );
        assert_eq!(loaded.lookup("s2", "p2", "y.jpg", tmp.path()), CacheLookup::Hit);
    }

    #[test]
    fn load_missing_file_returns_empty() {
        let tmp = TempDir::new().unwrap();
        assert!(CacheManifest::load(tmp.path()).entries.is_empty());
    }

    #[test]
    fn load_corrupt_json_returns_empty() {
        let tmp = TempDir::new().unwrap();
        fs::write(manifest_path(tmp.path()), "not json").unwrap();
        assert!(CacheManifest::load(tmp.path()).entries.is_empty());
    }

    #[test]
    fn load_wrong_version_returns_empty() {
        let tmp = TempDir::new().unwrap();
        let json = format!(
            r#"{{"version": {}, "entries": {{"a": {{"source_hash":"h","params_hash":"p"}}}}}}"#,
            MANIFEST_VERSION + 1
        );
        fs::write(manifest_path(tmp.path()), json).unwrap();
        assert!(CacheManifest::load(tmp.path()).entries.is_empty());
    }

    // =========================================================================
    // Hash functions
    // =========================================================================

    #[test]
    fn hash_file_changes_with_content() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("test.bin");

        fs::write(&path, b"version 1").unwrap();
        let h1 = hash_file(&path).unwrap();
        assert_eq!(h1, hash_file(&path).unwrap());
        assert_eq!(h1.len(), 64);

        fs::write(&path, b"version 2").unwrap();
        assert_ne!(h1, hash_file(&path).unwrap());
    }

    #[test]
    fn hash_fill_params_deterministic() {
        let focus = FocusPoint::new(0.2, -0.4);
        assert_eq!(
            hash_fill_params(&fill(400.0, 300.0), &focus, 90, "jpg"),
            hash_fill_params(&fill(400.0, 300.0), &focus, 90, "jpg")
        );
    }

    #[test]
    fn hash_fill_params_varies_with_each_input() {
        let focus = FocusPoint::centered();
        let base = hash_fill_params(&fill(400.0, 300.0), &focus, 90, "jpg");

        assert_ne!(base, hash_fill_params(&fill(401.0, 300.0), &focus, 90, "jpg"));
        assert_ne!(base, hash_fill_params(&fill(400.0, 301.0), &focus, 90, "jpg"));
        assert_ne!(base, hash_fill_params(&fill(400.0, 300.0), &focus, 85, "jpg"));
        assert_ne!(
            base,
            hash_fill_params(&fill(400.0, 300.0), &FocusPoint::new(0.5, 0.0), 90, "jpg")
        );
        assert_ne!(
            base,
            hash_fill_params(
                &FillMode::FillMax {
                    width: 400.0,
                    height: 300.0
                },
                &focus,
                90,
                "jpg"
            )
        );
        assert_ne!(base, hash_fill_params(&fill(400.0, 300.0), &focus, 90, "png"));
    }

    #[test]
    fn hash_fill_params_format_is_case_insensitive() {
        let focus = FocusPoint::centered();
        assert_eq!(
            hash_fill_params(&fill(400.0, 300.0), &focus, 90, "JPG"),
            hash_fill_params(&fill(400.0, 300.0), &focus, 90, "jpg")
        );
    }

    #[test]
    fn hash_fill_params_ignores_sub_percent_focus_changes() {
        assert_eq!(
            hash_fill_params(&fill(10.0, 10.0), &FocusPoint::new(0.001, 0.0), 90, "jpg"),
            hash_fill_params(&fill(10.0, 10.0), &FocusPoint::new(0.0, 0.0), 90, "jpg")
        );
    }

    // =========================================================================
    // CacheStats
    // =========================================================================

    #[test]
    fn cache_stats_counts_lookups() {
        let mut s = CacheStats::default();
        s.record(&CacheLookup::Hit);
        s.record(&CacheLookup::Miss);
        s.record(&CacheLookup::Copy("a".into()));
        assert_eq!((s.hits, s.copies, s.misses), (1, 1, 1));
        assert_eq!(s.total(), 3);
    }

    #[test]
    fn cache_stats_display() {
        let only_misses = CacheStats {
            misses: 3,
            ..Default::default()
        };
        assert_eq!(only_misses.to_string(), "3 rendered");

        let with_hits = CacheStats {
            hits: 5,
            misses: 2,
            ..Default::default()
        };
        assert_eq!(with_hits.to_string(), "5 cached, 2 rendered (7 total)");

        let with_copies = CacheStats {
            hits: 3,
            copies: 2,
            misses: 1,
        };
        assert_eq!(
            with_copies.to_string(),
            "3 cached, 2 copied, 1 rendered (6 total)"
        );
    }
}
