// src/watch/fingerprint.rs

use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::Context;
use blake3::Hasher;
use tracing::debug;

use crate::errors::{Result, Rp5Error};
use crate::watch::patterns::TrackedFiles;

/// Snapshot of the tracked sources used to decide whether to restart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    /// Newest modification time across all tracked files.
    pub modified: SystemTime,
    /// Aggregate blake3 digest of the tracked contents, when hashing is on.
    pub hash: Option<String>,
}

impl Fingerprint {
    pub fn new(modified: SystemTime) -> Self {
        Self {
            modified,
            hash: None,
        }
    }

    pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = Some(hash.into());
        self
    }

    /// Whether `self` should trigger a restart relative to `recorded`.
    ///
    /// Only a strictly newer modification time counts. When both sides carry
    /// a content hash, an unchanged hash is ignored as well.
    pub fn is_newer_than(&self, recorded: &Fingerprint) -> bool {
        if self.modified <= recorded.modified {
            return false;
        }
        match (&self.hash, &recorded.hash) {
            (Some(new), Some(old)) => new != old,
            _ => true,
        }
    }
}

/// Probe the tracked files and build a fingerprint.
///
/// Fails with `SketchNotFound` if the sketch itself is missing (e.g. in the
/// middle of an editor's rename-based save).
pub fn probe(tracked: &TrackedFiles, use_hash: bool) -> Result<Fingerprint> {
    let sketch = tracked.sketch();
    let mut newest = fs::metadata(sketch)
        .and_then(|m| m.modified())
        .map_err(|_| Rp5Error::SketchNotFound(sketch.to_path_buf()))?;

    let files = tracked.collect()?;
    for file in &files {
        // Files may disappear between listing and stat; skip them.
        if let Ok(modified) = fs::metadata(file).and_then(|m| m.modified()) {
            newest = newest.max(modified);
        }
    }

    let hash = if use_hash {
        Some(compute_hash_for_paths(&files)?)
    } else {
        None
    };

    Ok(Fingerprint {
        modified: newest,
        hash,
    })
}

/// Compute the hash of a single file.
pub fn compute_file_hash(path: &Path) -> Result<String> {
    let mut hasher = Hasher::new();
    let mut file =
        File::open(path).with_context(|| format!("opening file for hashing: {:?}", path))?;
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}

/// Compute a deterministic hash over the given files' paths and contents.
///
/// Order of `paths` does not matter; they are sorted before hashing.
pub fn compute_hash_for_paths<I, P>(paths: I) -> Result<String>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut hasher = Hasher::new();

    let mut paths_vec: Vec<PathBuf> = paths
        .into_iter()
        .map(|p| p.as_ref().to_path_buf())
        .collect();
    paths_vec.sort();

    for path in paths_vec {
        if path.is_file() {
            let file_hash = compute_file_hash(&path)?;
            hasher.update(path.to_string_lossy().as_bytes());
            hasher.update(file_hash.as_bytes());
        }
    }

    let hash = hasher.finalize().to_hex().to_string();
    debug!(hash = %hash, "computed aggregate hash");
    Ok(hash)
}
