// src/commands/setup.rs

//! `rp5 setup`: environment checks and delegation to the external installer.
//!
//! Installation itself is done by an external program configured as
//! `installer`; this module only detects the host and builds the call.

use std::fmt;
use std::path::{Path, PathBuf};

use clap::ValueEnum;

use crate::config::Rp5Config;
use crate::errors::{Result, Rp5Error};
use crate::launch::LaunchSpec;
use crate::types::RuntimeSelector;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SetupAction {
    /// Report the detected platform and runtime availability.
    Check,
    /// Run the installer (downloads the runtime jar).
    Install,
    /// Run the installer's sample unpacking step.
    UnpackSamples,
}

impl SetupAction {
    /// Argument passed to the installer.
    pub fn installer_arg(&self) -> &'static str {
        match self {
            SetupAction::Check => "check",
            SetupAction::Install => "install",
            SetupAction::UnpackSamples => "unpack_samples",
        }
    }
}

/// Host platform, as far as installer selection cares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostOs {
    Linux,
    MacOs,
    Windows,
    Other(String),
}

impl HostOs {
    pub fn detect() -> Self {
        Self::from_os_str(std::env::consts::OS)
    }

    pub fn from_os_str(os: &str) -> Self {
        match os {
            "linux" => HostOs::Linux,
            "macos" => HostOs::MacOs,
            "windows" => HostOs::Windows,
            other => HostOs::Other(other.to_string()),
        }
    }

    pub fn is_windows(&self) -> bool {
        matches!(self, HostOs::Windows)
    }
}

impl fmt::Display for HostOs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostOs::Linux => f.write_str("linux"),
            HostOs::MacOs => f.write_str("macos"),
            HostOs::Windows => f.write_str("windows"),
            HostOs::Other(os) => f.write_str(os),
        }
    }
}

/// Result of `rp5 setup check`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupReport {
    pub os: HostOs,
    pub runtime: RuntimeSelector,
    pub program: String,
    pub program_path: Option<PathBuf>,
    /// `jruby-complete.jar` and whether it exists; only for `JrubyComplete`.
    pub jar: Option<(PathBuf, bool)>,
    pub runners_dir: PathBuf,
    pub runners_found: bool,
    pub installer: Option<PathBuf>,
}

impl SetupReport {
    /// Whether everything needed to launch a sketch is in place.
    pub fn is_ready(&self) -> bool {
        self.program_path.is_some()
            && self.runners_found
            && self.jar.as_ref().is_none_or(|(_, found)| *found)
    }
}

impl fmt::Display for SetupReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let found = |ok: bool| if ok { "found" } else { "MISSING" };

        writeln!(f, "rp5 setup check")?;
        writeln!(f, "  os:          {}", self.os)?;
        writeln!(f, "  runtime:     {:?}", self.runtime)?;
        match &self.program_path {
            Some(path) => writeln!(f, "  program:     {} ({})", self.program, path.display())?,
            None => writeln!(f, "  program:     {} (MISSING)", self.program)?,
        }
        if let Some((jar, ok)) = &self.jar {
            writeln!(f, "  jar:         {} ({})", jar.display(), found(*ok))?;
        }
        writeln!(
            f,
            "  runners:     {} ({})",
            self.runners_dir.display(),
            found(self.runners_found)
        )?;
        match &self.installer {
            Some(path) => writeln!(f, "  installer:   {}", path.display())?,
            None => writeln!(f, "  installer:   (not configured)")?,
        }
        write!(f, "  ready:       {}", if self.is_ready() { "yes" } else { "no" })
    }
}

pub fn check(config: &Rp5Config, runtime: RuntimeSelector) -> SetupReport {
    let (program, jar) = match runtime {
        RuntimeSelector::SystemJruby => (config.jruby_bin.clone(), None),
        RuntimeSelector::JrubyComplete => (
            config.java.clone(),
            Some((config.jruby_complete.clone(), config.jruby_complete.is_file())),
        ),
    };

    SetupReport {
        os: HostOs::detect(),
        runtime,
        program_path: find_in_path(&program),
        program,
        jar,
        runners_dir: config.runners_dir.clone(),
        runners_found: config.runners_dir.is_dir(),
        installer: config.installer.clone(),
    }
}

/// Build the installer invocation for `action` on `os`.
pub fn installer_spec(config: &Rp5Config, action: SetupAction, os: &HostOs) -> Result<LaunchSpec> {
    let installer = config.installer.as_ref().ok_or_else(|| {
        Rp5Error::ConfigError(
            "no installer configured; set `installer` in your rp5 config".to_string(),
        )
    })?;
    let script = installer.display().to_string();
    let arg = action.installer_arg().to_string();

    let spec = if os.is_windows() {
        LaunchSpec::new("cmd", vec!["/C".to_string(), script, arg])
    } else {
        LaunchSpec::new("sh", vec![script, arg])
    };
    Ok(spec)
}

/// Locate `program` the way a shell would: paths are checked directly, bare
/// names are searched on `PATH`.
pub fn find_in_path(program: &str) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }

    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var).find_map(|dir| {
        let full = dir.join(program);
        if full.is_file() {
            return Some(full);
        }
        if cfg!(windows) {
            let exe = dir.join(format!("{program}.exe"));
            if exe.is_file() {
                return Some(exe);
            }
        }
        None
    })
}
