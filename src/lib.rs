// src/lib.rs

pub mod cli;
pub mod commands;
pub mod config;
pub mod errors;
pub mod launch;
pub mod logging;
pub mod supervisor;
pub mod types;
pub mod watch;

use clap::CommandFactory;
use tracing::{debug, warn};

use crate::cli::{CliArgs, Invocation};
use crate::commands::{
    check, create_sketch, installer_spec, live_sketch, run_foreground, run_sketch, watch_sketch,
    HostOs, SetupAction,
};
use crate::config::{resolve_config, Rp5Config};
use crate::errors::Result;
use crate::launch::RealLauncher;

/// High-level entry point used by `main.rs`.
///
/// Resolves the config, dispatches the decoded [`Invocation`] and returns
/// the exit code for the `rp5` process.
pub async fn run(args: CliArgs) -> Result<i32> {
    let config_path = args.config.clone();
    let invocation = args.into_invocation();
    debug!(?invocation, "decoded command line");

    match invocation {
        Invocation::Help => {
            CliArgs::command().print_help()?;
            println!();
            Ok(0)
        }
        Invocation::Version => {
            println!("rp5 {}", env!("CARGO_PKG_VERSION"));
            Ok(0)
        }
        Invocation::Create(request) => {
            let path = create_sketch(&request)?;
            println!("created {}", path.display());
            Ok(0)
        }
        other => {
            let config = resolve_config(config_path.as_deref())?;
            run_with_config(&config, other).await
        }
    }
}

/// Commands that launch something and therefore need the runtime config.
async fn run_with_config(config: &Rp5Config, invocation: Invocation) -> Result<i32> {
    match invocation {
        Invocation::Run { target, runtime } => {
            let runtime = runtime.unwrap_or_else(|| config.default_runtime());
            let mut launcher = RealLauncher::new();
            let status = run_sketch(config, runtime, &target, &mut launcher, interrupted()).await?;
            Ok(status.exit_code())
        }
        Invocation::Live {
            target,
            runtime,
            emacs,
        } => {
            let runtime = runtime.unwrap_or_else(|| config.default_runtime());
            let mut launcher = RealLauncher::new();
            let status =
                live_sketch(config, runtime, &target, emacs, &mut launcher, interrupted()).await?;
            Ok(status.exit_code())
        }
        Invocation::Watch {
            target,
            runtime,
            notifier,
            use_hash,
        } => {
            let runtime = runtime.unwrap_or_else(|| config.default_runtime());
            let mut settings = config.watch.clone();
            if let Some(notifier) = notifier {
                settings.notifier = notifier;
            }
            settings.use_hash |= use_hash;

            let report = watch_sketch(
                config,
                runtime,
                target,
                &settings,
                RealLauncher::new(),
                interrupted,
            )
            .await?;
            Ok(report.exit_code())
        }
        Invocation::Setup { action, runtime } => {
            let runtime = runtime.unwrap_or_else(|| config.default_runtime());
            match action {
                SetupAction::Check => {
                    let report = check(config, runtime);
                    println!("{report}");
                    Ok(if report.is_ready() { 0 } else { 1 })
                }
                SetupAction::Install | SetupAction::UnpackSamples => {
                    let spec = installer_spec(config, action, &HostOs::detect())?;
                    let mut launcher = RealLauncher::new();
                    let status = run_foreground(
                        &mut launcher,
                        spec,
                        config.watch.grace_period,
                        interrupted(),
                    )
                    .await?;
                    Ok(status.exit_code())
                }
            }
        }
        Invocation::Help | Invocation::Version | Invocation::Create(_) => Ok(0),
    }
}

/// Resolves on Ctrl-C. If the handler cannot be installed it never resolves.
async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}
