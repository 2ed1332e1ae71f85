// src/commands/create.rs

//! `rp5 create`: write a new sketch file from a template.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::Context;
use regex::Regex;
use tracing::info;

use crate::errors::{Result, Rp5Error};

pub const DEFAULT_WIDTH: u32 = 200;
pub const DEFAULT_HEIGHT: u32 = 200;

/// Shape of the generated sketch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SketchTemplate {
    /// Top-level `setup` / `draw` functions.
    Bare,
    /// A `Processing::App` subclass, instantiated at the bottom (`--wrap`).
    Wrapped,
    /// A helper class including `Processing::Proxy` (`--inner`).
    Inner,
}

impl SketchTemplate {
    pub fn from_flags(wrap: bool, inner: bool) -> Self {
        match (wrap, inner) {
            (true, _) => SketchTemplate::Wrapped,
            (false, true) => SketchTemplate::Inner,
            (false, false) => SketchTemplate::Bare,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRequest {
    /// Sketch path as given; a trailing `.rb` is optional.
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub template: SketchTemplate,
}

impl CreateRequest {
    pub fn new(path: impl Into<PathBuf>, template: SketchTemplate) -> Self {
        Self {
            path: path.into(),
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            template,
        }
    }
}

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z][A-Za-z0-9_-]*$").expect("sketch name pattern is valid")
    })
}

/// Create the sketch file and return its path.
///
/// Refuses to overwrite an existing file.
pub fn create_sketch(request: &CreateRequest) -> Result<PathBuf> {
    let stem = sketch_stem(&request.path)?;
    let dir = match request.path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let file = dir.join(format!("{stem}.rb"));

    if file.exists() {
        return Err(Rp5Error::SketchExists(file));
    }

    fs::create_dir_all(&dir).with_context(|| format!("creating directory {:?}", dir))?;
    let contents = render_sketch(&stem, request.width, request.height, request.template);
    fs::write(&file, contents).with_context(|| format!("writing sketch {:?}", file))?;

    info!(sketch = %file.display(), template = ?request.template, "created sketch");
    Ok(file)
}

fn sketch_stem(path: &Path) -> Result<String> {
    let raw = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Rp5Error::InvalidSketchName(path.display().to_string()))?;
    let stem = raw.strip_suffix(".rb").unwrap_or(raw);

    if !name_pattern().is_match(stem) {
        return Err(Rp5Error::InvalidSketchName(stem.to_string()));
    }
    Ok(stem.to_string())
}

/// `my_cool-sketch` -> `MyCoolSketch`.
pub fn class_name(stem: &str) -> String {
    stem.split(['_', '-'])
        .filter(|part| !part.is_empty())
        .map(capitalize)
        .collect()
}

/// `my_cool-sketch` -> `My Cool Sketch`.
pub fn title(stem: &str) -> String {
    stem.split(['_', '-'])
        .filter(|part| !part.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn render_sketch(stem: &str, width: u32, height: u32, template: SketchTemplate) -> String {
    match template {
        SketchTemplate::Bare => format!(
            "def setup\n  size {width}, {height}\nend\n\ndef draw\n\nend\n"
        ),
        SketchTemplate::Wrapped => {
            let class = class_name(stem);
            let title = title(stem);
            format!(
                "require 'ruby-processing'\n\n\
                 class {class} < Processing::App\n  \
                 def setup\n    size {width}, {height}\n  end\n\n  \
                 def draw\n\n  end\nend\n\n\
                 {class}.new(title: '{title}')\n"
            )
        }
        SketchTemplate::Inner => {
            let class = class_name(stem);
            format!(
                "class {class}\n  include Processing::Proxy\n\n  \
                 def initialize\n\n  end\nend\n"
            )
        }
    }
}
