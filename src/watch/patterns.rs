// src/watch/patterns.rs

//! Which files a watch session tracks.
//!
//! The sketch itself is always tracked. With `watch_dir = true`, files under
//! the sketch's directory matching the configured globs (by default
//! `**/*.rb` and `**/*.glsl`) are tracked too. Hidden files and directories
//! are skipped.

use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::Context;
use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::config::WatchSettings;
use crate::errors::{Result, Rp5Error};

#[derive(Debug, Clone)]
pub struct TrackedFiles {
    sketch: PathBuf,
    root: PathBuf,
    globs: Option<GlobSet>,
}

impl TrackedFiles {
    /// Build the tracked set for `sketch_path`.
    ///
    /// Fails with `SketchNotFound` if the sketch does not exist.
    pub fn new(sketch_path: &Path, settings: &WatchSettings) -> Result<Self> {
        let sketch = sketch_path
            .canonicalize()
            .map_err(|_| Rp5Error::SketchNotFound(sketch_path.to_path_buf()))?;
        if !sketch.is_file() {
            return Err(Rp5Error::SketchNotFound(sketch_path.to_path_buf()));
        }

        let root = sketch
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        let globs = if settings.watch_dir {
            Some(build_globset(&settings.patterns)?)
        } else {
            None
        };

        Ok(Self {
            sketch,
            root,
            globs,
        })
    }

    /// Canonical path of the sketch file.
    pub fn sketch(&self) -> &Path {
        &self.sketch
    }

    /// Directory the sketch lives in.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn watches_dir(&self) -> bool {
        self.globs.is_some()
    }

    /// Whether a change to `path` concerns this session.
    pub fn is_tracked(&self, path: &Path) -> bool {
        if path == self.sketch {
            return true;
        }
        let Some(globs) = &self.globs else {
            return false;
        };
        match path.strip_prefix(&self.root) {
            Ok(rel) => !is_hidden(rel) && globs.is_match(rel),
            Err(_) => false,
        }
    }

    /// All tracked files currently on disk, sketch first.
    pub fn collect(&self) -> Result<Vec<PathBuf>> {
        let mut files = vec![self.sketch.clone()];
        if self.globs.is_some() {
            self.walk(&self.root, &mut files)?;
        }
        Ok(files)
    }

    fn walk(&self, dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
        let entries =
            fs::read_dir(dir).with_context(|| format!("reading directory {:?}", dir))?;
        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            // `file_type` does not follow symlinks, which keeps the walk finite.
            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                let hidden = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with('.'));
                if !hidden {
                    self.walk(&path, out)?;
                }
            } else if path != self.sketch && self.is_tracked(&path) {
                out.push(path);
            }
        }
        Ok(())
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| {
            Rp5Error::ConfigError(format!("invalid watch pattern '{pattern}': {e}"))
        })?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| Rp5Error::ConfigError(format!("building watch patterns: {e}")))
}

fn is_hidden(rel: &Path) -> bool {
    rel.components().any(|c| match c {
        Component::Normal(name) => name.to_str().is_some_and(|n| n.starts_with('.')),
        _ => false,
    })
}
