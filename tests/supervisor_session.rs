// tests/supervisor_session.rs

use std::error::Error;
use std::path::Path;
use std::time::Duration;

use tempfile::tempdir;
use tokio::time::{sleep, Instant};

use rp5::config::WatchSettings;
use rp5::errors::Rp5Error;
use rp5::launch::{ChildStatus, LaunchSpec};
use rp5::supervisor::{self, SessionEnd, SupervisorEvent, SupervisorState, WatchSession};
use rp5::types::WatchTarget;
use rp5::watch::{probe, Fingerprint};
use rp5_test_utils::builders::{fingerprint_after, sketch_file, test_settings};
use rp5_test_utils::{init_tracing, with_timeout, FakeControl, FakeLauncher, LauncherCall};

type TestResult = Result<(), Box<dyn Error>>;

fn spec() -> LaunchSpec {
    LaunchSpec::new("jruby", vec!["runners/run.rb".to_string(), "sketch.rb".to_string()])
}

/// Start a session on a fresh sketch; returns the session, the fake's
/// control handle and the fingerprint recorded at launch.
async fn start_session(
    dir: &Path,
    settings: &WatchSettings,
) -> Result<(WatchSession<FakeLauncher>, FakeControl, Fingerprint), Box<dyn Error>> {
    let sketch = sketch_file(dir, "sketch.rb");
    let (launcher, control) = FakeLauncher::new();
    let session =
        supervisor::start(WatchTarget::new(sketch, Vec::new()), spec(), settings, launcher).await?;
    let base = probe(session.tracked(), settings.use_hash)?;
    Ok((session, control, base))
}

fn changed(fingerprint: Fingerprint) -> SupervisorEvent {
    SupervisorEvent::SourceChanged { fingerprint }
}

#[tokio::test]
async fn start_launches_exactly_one_child() -> TestResult {
    init_tracing();
    let dir = tempdir()?;
    let (session, control, _) = start_session(dir.path(), &test_settings()).await?;

    assert_eq!(session.state(), SupervisorState::Running);
    assert_eq!(control.calls(), vec![LauncherCall::Launch(1)]);
    assert_eq!(control.specs(), vec![spec()]);
    assert_eq!(control.alive(), 1);

    let report = with_timeout(session.spawn().stop()).await?;
    assert_eq!(report.end, SessionEnd::StoppedByUser);
    assert_eq!(report.launches, 1);
    assert_eq!(report.restarts, 0);
    Ok(())
}

#[tokio::test]
async fn missing_sketch_fails_without_launching() -> TestResult {
    init_tracing();
    let dir = tempdir()?;
    let (launcher, control) = FakeLauncher::new();
    let target = WatchTarget::new(dir.path().join("nope.rb"), Vec::new());

    let result = supervisor::start(target, spec(), &test_settings(), launcher).await;

    match result {
        Err(Rp5Error::SketchNotFound(path)) => assert!(path.ends_with("nope.rb")),
        Err(e) => panic!("Expected SketchNotFound, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
    assert_eq!(control.launches(), 0);
    Ok(())
}

#[tokio::test]
async fn launch_failure_surfaces_runtime_unavailable() -> TestResult {
    init_tracing();
    let dir = tempdir()?;
    let sketch = sketch_file(dir.path(), "sketch.rb");
    let (launcher, control) = FakeLauncher::new();
    control.fail_launches(true);

    let result =
        supervisor::start(WatchTarget::new(sketch, Vec::new()), spec(), &test_settings(), launcher)
            .await;

    match result {
        Err(Rp5Error::RuntimeUnavailable { program }) => assert_eq!(program, "jruby"),
        Err(e) => panic!("Expected RuntimeUnavailable, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
    assert_eq!(control.alive(), 0);
    Ok(())
}

#[tokio::test]
async fn burst_of_changes_restarts_once() -> TestResult {
    init_tracing();
    let dir = tempdir()?;
    let (session, control, base) = start_session(dir.path(), &test_settings()).await?;
    let events = session.events();
    let running = session.spawn();

    for secs in 1..=5 {
        events.send(changed(fingerprint_after(&base, secs))).await?;
    }

    with_timeout(control.wait_for_launches(2)).await;
    // Well past another debounce window: nothing else may happen.
    sleep(Duration::from_millis(200)).await;

    assert_eq!(
        control.calls(),
        vec![
            LauncherCall::Launch(1),
            LauncherCall::Terminate { id: 1, graceful: true },
            LauncherCall::Launch(2),
        ]
    );
    assert_eq!(control.max_alive(), 1);

    let report = with_timeout(running.stop()).await?;
    assert_eq!(report.end, SessionEnd::StoppedByUser);
    assert_eq!(report.launches, 2);
    assert_eq!(report.restarts, 1);
    assert_eq!(control.alive(), 0);
    Ok(())
}

#[tokio::test]
async fn unchanged_or_older_fingerprint_is_ignored() -> TestResult {
    init_tracing();
    let dir = tempdir()?;
    let (session, control, base) = start_session(dir.path(), &test_settings()).await?;
    let events = session.events();
    let running = session.spawn();

    events.send(changed(base.clone())).await?;
    events
        .send(changed(Fingerprint::new(base.modified - Duration::from_secs(10))))
        .await?;
    sleep(Duration::from_millis(200)).await;

    assert_eq!(control.launches(), 1);
    assert!(!running.is_finished());

    let report = with_timeout(running.stop()).await?;
    assert_eq!(report.restarts, 0);
    Ok(())
}

#[tokio::test]
async fn same_content_hash_does_not_restart() -> TestResult {
    init_tracing();
    let dir = tempdir()?;
    let settings = WatchSettings {
        use_hash: true,
        ..test_settings()
    };
    let (session, control, base) = start_session(dir.path(), &settings).await?;
    let hash = base.hash.clone().ok_or("hash missing with use_hash = true")?;
    let events = session.events();
    let running = session.spawn();

    // Touched but identical: newer mtime, same digest.
    events
        .send(changed(fingerprint_after(&base, 5).with_hash(hash)))
        .await?;
    sleep(Duration::from_millis(200)).await;
    assert_eq!(control.launches(), 1);

    events
        .send(changed(fingerprint_after(&base, 6).with_hash("different")))
        .await?;
    with_timeout(control.wait_for_launches(2)).await;

    with_timeout(running.stop()).await?;
    Ok(())
}

#[tokio::test]
async fn crash_without_pending_change_ends_session() -> TestResult {
    init_tracing();
    let dir = tempdir()?;
    let (session, control, _) = start_session(dir.path(), &test_settings()).await?;
    let running = session.spawn();

    control.crash(1, 3);
    let report = with_timeout(running.wait()).await?;

    assert_eq!(report.end, SessionEnd::ChildExited(ChildStatus::ExitedError(3)));
    assert_eq!(report.exit_code(), 3);
    assert_eq!(control.launches(), 1);
    Ok(())
}

#[tokio::test]
async fn clean_exit_ends_session_with_zero() -> TestResult {
    init_tracing();
    let dir = tempdir()?;
    let (session, control, _) = start_session(dir.path(), &test_settings()).await?;
    let running = session.spawn();

    control.crash(1, 0);
    let report = with_timeout(running.wait()).await?;

    assert_eq!(report.end, SessionEnd::ChildExited(ChildStatus::ExitedOk));
    assert_eq!(report.exit_code(), 0);
    Ok(())
}

#[tokio::test]
async fn crash_with_pending_change_relaunches() -> TestResult {
    init_tracing();
    let dir = tempdir()?;
    let settings = WatchSettings {
        debounce: Duration::from_millis(500),
        ..test_settings()
    };
    let (session, control, base) = start_session(dir.path(), &settings).await?;
    let events = session.events();
    let running = session.spawn();

    events.send(changed(fingerprint_after(&base, 1))).await?;
    // Let the supervisor record the change, well inside the window.
    sleep(Duration::from_millis(50)).await;
    control.crash(1, 1);

    with_timeout(control.wait_for_launches(2)).await;
    assert_eq!(
        control.calls(),
        vec![LauncherCall::Launch(1), LauncherCall::Launch(2)]
    );

    let report = with_timeout(running.stop()).await?;
    assert_eq!(report.restarts, 1);
    assert_eq!(report.end, SessionEnd::StoppedByUser);
    Ok(())
}

#[tokio::test]
async fn stop_terminates_gracefully_and_reaps() -> TestResult {
    init_tracing();
    let dir = tempdir()?;
    let (session, control, _) = start_session(dir.path(), &test_settings()).await?;

    let report = with_timeout(session.spawn().stop()).await?;

    assert_eq!(report.end, SessionEnd::StoppedByUser);
    assert_eq!(report.exit_code(), 0);
    assert_eq!(
        control.calls(),
        vec![
            LauncherCall::Launch(1),
            LauncherCall::Terminate { id: 1, graceful: true },
        ]
    );
    assert_eq!(control.alive(), 0);
    Ok(())
}

#[tokio::test]
async fn stubborn_child_is_killed_after_grace_period() -> TestResult {
    init_tracing();
    let dir = tempdir()?;
    let settings = test_settings();
    let (session, control, _) = start_session(dir.path(), &settings).await?;
    control.ignore_graceful(true);

    let started = Instant::now();
    let report = with_timeout(session.spawn().stop()).await?;

    assert!(started.elapsed() >= settings.grace_period);
    assert_eq!(report.end, SessionEnd::StoppedByUser);
    assert_eq!(
        control.calls(),
        vec![
            LauncherCall::Launch(1),
            LauncherCall::Terminate { id: 1, graceful: true },
            LauncherCall::Terminate { id: 1, graceful: false },
        ]
    );
    assert_eq!(control.alive(), 0);
    Ok(())
}

#[tokio::test]
async fn second_stop_forces_kill_without_waiting_for_grace() -> TestResult {
    init_tracing();
    let dir = tempdir()?;
    let settings = WatchSettings {
        grace_period: Duration::from_secs(30),
        ..test_settings()
    };
    let (session, control, _) = start_session(dir.path(), &settings).await?;
    control.ignore_graceful(true);
    let events = session.events();
    let running = session.spawn();

    let started = Instant::now();
    events.send(SupervisorEvent::StopRequested).await?;
    with_timeout(control.wait_for_terminations(1)).await;
    events.send(SupervisorEvent::StopRequested).await?;

    let report = with_timeout(running.wait()).await?;
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(report.end, SessionEnd::StoppedByUser);
    assert!(control
        .calls()
        .contains(&LauncherCall::Terminate { id: 1, graceful: false }));
    assert_eq!(control.alive(), 0);
    Ok(())
}

#[tokio::test]
async fn change_during_termination_is_absorbed_by_relaunch() -> TestResult {
    init_tracing();
    let dir = tempdir()?;
    let (session, control, base) = start_session(dir.path(), &test_settings()).await?;
    // Terminations now take the full grace period.
    control.ignore_graceful(true);
    let events = session.events();
    let running = session.spawn();

    events.send(changed(fingerprint_after(&base, 1))).await?;
    with_timeout(control.wait_for_terminations(1)).await;
    events.send(changed(fingerprint_after(&base, 2))).await?;

    with_timeout(control.wait_for_launches(2)).await;
    // Well past the debounce window: the relaunched child is left alone.
    sleep(Duration::from_millis(300)).await;
    assert_eq!(control.launches(), 2);
    assert_eq!(control.max_alive(), 1);

    let report = with_timeout(running.stop()).await?;
    assert_eq!(report.launches, 2);
    assert_eq!(report.restarts, 1);
    Ok(())
}

#[tokio::test]
async fn terminate_always_precedes_next_launch() -> TestResult {
    init_tracing();
    let dir = tempdir()?;
    let (session, control, base) = start_session(dir.path(), &test_settings()).await?;
    let events = session.events();
    let running = session.spawn();

    for round in 1..=3u64 {
        events.send(changed(fingerprint_after(&base, round))).await?;
        with_timeout(control.wait_for_launches(round as usize + 1)).await;
    }
    with_timeout(running.stop()).await?;

    let calls = control.calls();
    let mut alive: Option<u64> = None;
    for call in &calls {
        match call {
            LauncherCall::Launch(id) => {
                assert!(alive.is_none(), "launch {id} while another child alive: {calls:?}");
                alive = Some(*id);
            }
            LauncherCall::Terminate { id, .. } => {
                assert_eq!(alive, Some(*id));
                alive = None;
            }
        }
    }
    assert_eq!(control.max_alive(), 1);
    Ok(())
}

#[tokio::test]
async fn stop_handle_reports_finished_session() -> TestResult {
    init_tracing();
    let dir = tempdir()?;
    let (session, control, _) = start_session(dir.path(), &test_settings()).await?;
    let stop = session.stop_handle();
    let running = session.spawn();

    assert!(stop.request().await);
    let report = with_timeout(running.wait()).await?;
    assert_eq!(report.end, SessionEnd::StoppedByUser);
    assert_eq!(control.alive(), 0);

    // The control task is gone; nobody is listening any more.
    assert!(!stop.request().await);
    Ok(())
}
