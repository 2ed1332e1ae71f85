use std::time::{Duration, SystemTime};

use proptest::prelude::*;
use tokio::time::Instant;

use rp5::launch::ChildHandle;
use rp5::supervisor::{CoreCommand, CoreInput, SupervisorCore};
use rp5::types::WatchTarget;
use rp5::watch::{Debouncer, Fingerprint};

const WINDOW_MS: u64 = 200;

fn running_core() -> SupervisorCore {
    let mut core = SupervisorCore::new(
        WatchTarget::new("sketch.rb", Vec::new()),
        Fingerprint::new(SystemTime::UNIX_EPOCH),
        Debouncer::new(Duration::from_millis(WINDOW_MS)),
    );
    core.step(CoreInput::Started);
    core.step(CoreInput::Launched {
        handle: ChildHandle { id: 1, pid: None },
        at: SystemTime::now(),
    });
    core
}

proptest! {
    // Any burst whose gaps stay inside the window collapses into one restart,
    // issued only once the window after the last event has passed.
    #[test]
    fn burst_inside_window_yields_single_restart(
        gaps in proptest::collection::vec(0..WINDOW_MS, 1..20)
    ) {
        let mut core = running_core();
        let t0 = Instant::now();
        let mut offset = 0u64;
        let mut terminates = 0usize;

        for (i, gap) in gaps.iter().enumerate() {
            offset += gap;
            let at = t0 + Duration::from_millis(offset);
            let step = core.step(CoreInput::SourceChanged {
                fingerprint: Fingerprint::new(
                    SystemTime::UNIX_EPOCH + Duration::from_secs(i as u64 + 1),
                ),
                at,
            });
            prop_assert!(step.commands.is_empty());

            let tick = core.step(CoreInput::DebounceElapsed { at });
            terminates += tick
                .commands
                .iter()
                .filter(|c| matches!(c, CoreCommand::Terminate { .. }))
                .count();
        }
        prop_assert_eq!(terminates, 0);

        let last = t0 + Duration::from_millis(offset);
        prop_assert_eq!(
            core.debounce_deadline(),
            Some(last + Duration::from_millis(WINDOW_MS))
        );

        let settled = core.step(CoreInput::DebounceElapsed {
            at: last + Duration::from_millis(WINDOW_MS),
        });
        prop_assert_eq!(settled.commands.len(), 1);
        prop_assert_eq!(core.restarts(), 1);
    }

    #[test]
    fn debouncer_counts_collapsed_events(
        offsets in proptest::collection::vec(0u64..10_000, 1..50)
    ) {
        let window = Duration::from_millis(WINDOW_MS);
        let mut debouncer = Debouncer::new(window);
        let t0 = Instant::now();

        for offset in &offsets {
            debouncer.record(t0 + Duration::from_millis(*offset));
        }

        let latest = offsets.iter().copied().max().unwrap_or(0);
        let deadline = t0 + Duration::from_millis(latest) + window;
        prop_assert_eq!(debouncer.deadline(), Some(deadline));
        prop_assert!(!debouncer.is_due(deadline - Duration::from_millis(1)));
        prop_assert!(debouncer.is_due(deadline));

        prop_assert_eq!(debouncer.take() as usize, offsets.len());
        prop_assert!(!debouncer.is_pending());
        prop_assert_eq!(debouncer.take(), 0);
    }
}
