// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! Parsed arguments are decoded once into an [`Invocation`], which is what
//! the rest of the crate dispatches on.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::commands::create::{DEFAULT_HEIGHT, DEFAULT_WIDTH};
use crate::commands::{CreateRequest, SetupAction, SketchTemplate};
use crate::types::{NotifierKind, RuntimeSelector, WatchTarget};

/// Command-line arguments for `rp5`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "rp5",
    version,
    about = "Run, watch and live-edit Processing sketches on JRuby.",
    long_about = None,
    disable_help_subcommand = true
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `RP5_CONFIG`, then `~/.rp5rc.toml`, then built-in defaults.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `RP5_LOG` or a default level will be used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run a sketch once.
    Run(SketchArgs),
    /// Run a sketch and restart it whenever its sources change.
    Watch(WatchArgs),
    /// Open a sketch in an interactive session.
    Live(LiveArgs),
    /// Create a new sketch from a template.
    Create(CreateArgs),
    /// Check or install the runtime.
    Setup(SetupArgs),
    /// Print usage.
    Help,
    /// Print the version.
    Version,
}

/// `--jruby` / `--nojruby` override of the configured runtime.
#[derive(Debug, Clone, Copy, Default, Args)]
pub struct RuntimeFlags {
    /// Use the system `jruby` executable.
    #[arg(long, conflicts_with = "nojruby")]
    pub jruby: bool,

    /// Use `java` with `jruby-complete.jar`.
    #[arg(long)]
    pub nojruby: bool,
}

impl RuntimeFlags {
    /// `None` when neither flag was given.
    pub fn selector(&self) -> Option<RuntimeSelector> {
        match (self.jruby, self.nojruby) {
            (true, _) => Some(RuntimeSelector::SystemJruby),
            (false, true) => Some(RuntimeSelector::JrubyComplete),
            (false, false) => None,
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct SketchArgs {
    /// Path to the sketch file.
    #[arg(value_name = "SKETCH")]
    pub sketch: PathBuf,

    /// Arguments passed through to the sketch.
    #[arg(value_name = "ARGS", trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,

    #[command(flatten)]
    pub runtime: RuntimeFlags,
}

impl SketchArgs {
    fn target(&self) -> WatchTarget {
        WatchTarget::new(self.sketch.clone(), self.args.clone())
    }
}

#[derive(Debug, Clone, Args)]
pub struct WatchArgs {
    #[command(flatten)]
    pub sketch: SketchArgs,

    /// Detect changes by polling modification times.
    #[arg(long, conflicts_with = "events")]
    pub poll: bool,

    /// Detect changes with OS file events.
    #[arg(long)]
    pub events: bool,

    /// Only restart when file contents actually change.
    #[arg(long)]
    pub hash: bool,
}

#[derive(Debug, Clone, Args)]
pub struct LiveArgs {
    #[command(flatten)]
    pub sketch: SketchArgs,

    /// Disable readline (for Emacs inferior mode).
    #[arg(long)]
    pub emacs: bool,
}

#[derive(Debug, Clone, Args)]
pub struct CreateArgs {
    /// Sketch name or path; `.rb` is optional.
    #[arg(value_name = "NAME")]
    pub name: PathBuf,

    #[arg(value_name = "WIDTH", default_value_t = DEFAULT_WIDTH)]
    pub width: u32,

    #[arg(value_name = "HEIGHT", default_value_t = DEFAULT_HEIGHT)]
    pub height: u32,

    /// Wrap the sketch in a `Processing::App` subclass.
    #[arg(long, conflicts_with = "inner")]
    pub wrap: bool,

    /// Generate a helper class including `Processing::Proxy`.
    #[arg(long)]
    pub inner: bool,
}

#[derive(Debug, Clone, Args)]
pub struct SetupArgs {
    #[arg(value_enum, default_value_t = SetupAction::Check)]
    pub action: SetupAction,

    #[command(flatten)]
    pub runtime: RuntimeFlags,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Decoded command, ready to dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    Run {
        target: WatchTarget,
        runtime: Option<RuntimeSelector>,
    },
    Watch {
        target: WatchTarget,
        runtime: Option<RuntimeSelector>,
        notifier: Option<NotifierKind>,
        use_hash: bool,
    },
    Live {
        target: WatchTarget,
        runtime: Option<RuntimeSelector>,
        emacs: bool,
    },
    Create(CreateRequest),
    Setup {
        action: SetupAction,
        runtime: Option<RuntimeSelector>,
    },
    Help,
    Version,
}

impl CliArgs {
    /// No subcommand means `help`.
    pub fn into_invocation(self) -> Invocation {
        match self.command {
            None | Some(Command::Help) => Invocation::Help,
            Some(Command::Version) => Invocation::Version,
            Some(Command::Run(args)) => Invocation::Run {
                target: args.target(),
                runtime: args.runtime.selector(),
            },
            Some(Command::Watch(args)) => {
                let notifier = match (args.poll, args.events) {
                    (true, _) => Some(NotifierKind::Poll),
                    (false, true) => Some(NotifierKind::Events),
                    (false, false) => None,
                };
                Invocation::Watch {
                    target: args.sketch.target(),
                    runtime: args.sketch.runtime.selector(),
                    notifier,
                    use_hash: args.hash,
                }
            }
            Some(Command::Live(args)) => Invocation::Live {
                target: args.sketch.target(),
                runtime: args.sketch.runtime.selector(),
                emacs: args.emacs,
            },
            Some(Command::Create(args)) => Invocation::Create(CreateRequest {
                path: args.name,
                width: args.width,
                height: args.height,
                template: SketchTemplate::from_flags(args.wrap, args.inner),
            }),
            Some(Command::Setup(args)) => Invocation::Setup {
                action: args.action,
                runtime: args.runtime.selector(),
            },
        }
    }
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
