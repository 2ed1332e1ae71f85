// src/commands/mod.rs

//! Subcommand implementations.
//!
//! - [`run`]: launch a sketch in the foreground and wait for it.
//! - [`live`]: same, through the interactive entry script.
//! - [`create`]: write a new sketch from a template.
//! - [`setup`]: platform checks and the external installer.
//! - [`watch`]: the watch supervisor wired to a change source and Ctrl-C.

pub mod create;
pub mod live;
pub mod run;
pub mod setup;
pub mod watch;

pub use create::{create_sketch, CreateRequest, SketchTemplate};
pub use live::live_sketch;
pub use run::{run_foreground, run_sketch};
pub use setup::{check, installer_spec, HostOs, SetupAction, SetupReport};
pub use watch::watch_sketch;
