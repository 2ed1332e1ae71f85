// src/launch/mod.rs

//! Process launching layer.
//!
//! - [`command`] turns a runtime selector, entry script and target into a
//!   concrete [`LaunchSpec`].
//! - [`backend`] defines the [`ProcessLauncher`] trait the supervisor and the
//!   foreground commands talk to.
//! - [`process`] is the `tokio::process` implementation.

pub mod backend;
pub mod command;
pub mod process;

pub use backend::{ChildHandle, ChildStatus, LaunchFuture, ProcessLauncher};
pub use command::{
    build_launch_spec, read_java_args, EntryScript, LaunchSpec, JAVA_ARGS_FILE, JRUBY_MAIN_CLASS,
};
pub use process::{stop_child, RealLauncher};
