// src/commands/watch.rs

use std::future::Future;

use tracing::{debug, info};

use crate::config::{Rp5Config, WatchSettings};
use crate::errors::Result;
use crate::launch::{build_launch_spec, EntryScript, ProcessLauncher};
use crate::supervisor::{self, SessionReport};
use crate::types::{RuntimeSelector, WatchTarget};

/// Run `target` under the watch supervisor until the child exits or the
/// operator stops the session.
///
/// `interrupt` is called once per wait; each time its future resolves a stop
/// is requested. A second interrupt while the child is being terminated
/// forces the kill.
pub async fn watch_sketch<L, I, F>(
    config: &Rp5Config,
    runtime: RuntimeSelector,
    target: WatchTarget,
    settings: &WatchSettings,
    launcher: L,
    mut interrupt: I,
) -> Result<SessionReport>
where
    L: ProcessLauncher,
    I: FnMut() -> F,
    F: Future<Output = ()>,
{
    let spec = build_launch_spec(config, runtime, EntryScript::Run, &target)?;
    let mut session = supervisor::start(target, spec, settings, launcher).await?;
    session.spawn_change_source()?;
    info!(
        notifier = ?settings.notifier,
        files = session.tracked().collect()?.len(),
        "watching sketch sources"
    );

    let stop = session.stop_handle();
    let run = session.run();
    tokio::pin!(run);

    loop {
        tokio::select! {
            report = &mut run => return report,
            _ = interrupt() => {
                info!("interrupt received; stopping sketch");
                if !stop.request().await {
                    debug!("session already finished");
                }
            }
        }
    }
}
