// tests/cli_decoding.rs

use std::path::PathBuf;

use clap::Parser;

use rp5::cli::{CliArgs, Invocation, LogLevel};
use rp5::commands::{CreateRequest, SetupAction, SketchTemplate};
use rp5::types::{NotifierKind, RuntimeSelector, WatchTarget};

fn decode(args: &[&str]) -> Invocation {
    CliArgs::try_parse_from(args)
        .expect("arguments should parse")
        .into_invocation()
}

#[test]
fn run_with_sketch_arguments() {
    assert_eq!(
        decode(&["rp5", "run", "--jruby", "circles.rb", "red", "--big"]),
        Invocation::Run {
            target: WatchTarget::new("circles.rb", vec!["red".to_string(), "--big".to_string()]),
            runtime: Some(RuntimeSelector::SystemJruby),
        }
    );
}

#[test]
fn runtime_defaults_to_config_when_no_flag() {
    assert_eq!(
        decode(&["rp5", "run", "circles.rb"]),
        Invocation::Run {
            target: WatchTarget::new("circles.rb", Vec::new()),
            runtime: None,
        }
    );
    assert!(matches!(
        decode(&["rp5", "run", "--nojruby", "circles.rb"]),
        Invocation::Run { runtime: Some(RuntimeSelector::JrubyComplete), .. }
    ));
}

#[test]
fn watch_flags_select_notifier_and_hashing() {
    assert_eq!(
        decode(&["rp5", "watch", "--events", "--hash", "circles.rb"]),
        Invocation::Watch {
            target: WatchTarget::new("circles.rb", Vec::new()),
            runtime: None,
            notifier: Some(NotifierKind::Events),
            use_hash: true,
        }
    );
    assert!(matches!(
        decode(&["rp5", "watch", "--poll", "circles.rb"]),
        Invocation::Watch { notifier: Some(NotifierKind::Poll), use_hash: false, .. }
    ));
}

#[test]
fn live_with_emacs() {
    assert!(matches!(
        decode(&["rp5", "live", "--emacs", "circles.rb"]),
        Invocation::Live { emacs: true, .. }
    ));
}

#[test]
fn create_with_size_and_template() {
    assert_eq!(
        decode(&["rp5", "create", "--wrap", "waves", "640", "480"]),
        Invocation::Create(CreateRequest {
            path: PathBuf::from("waves"),
            width: 640,
            height: 480,
            template: SketchTemplate::Wrapped,
        })
    );
    assert_eq!(
        decode(&["rp5", "create", "waves"]),
        Invocation::Create(CreateRequest::new("waves", SketchTemplate::Bare))
    );
}

#[test]
fn setup_actions() {
    assert_eq!(
        decode(&["rp5", "setup", "unpack-samples"]),
        Invocation::Setup {
            action: SetupAction::UnpackSamples,
            runtime: None,
        }
    );
    assert!(matches!(
        decode(&["rp5", "setup"]),
        Invocation::Setup { action: SetupAction::Check, .. }
    ));
}

#[test]
fn help_version_and_bare_invocation() {
    assert_eq!(decode(&["rp5"]), Invocation::Help);
    assert_eq!(decode(&["rp5", "help"]), Invocation::Help);
    assert_eq!(decode(&["rp5", "version"]), Invocation::Version);
}

#[test]
fn global_options_are_accepted_after_subcommand() {
    let args = CliArgs::try_parse_from([
        "rp5",
        "watch",
        "--config",
        "rp5.toml",
        "--log-level",
        "debug",
        "circles.rb",
    ])
    .expect("arguments should parse");

    assert_eq!(args.config, Some(PathBuf::from("rp5.toml")));
    assert_eq!(args.log_level, Some(LogLevel::Debug));
}

#[test]
fn conflicting_flags_are_rejected() {
    assert!(CliArgs::try_parse_from(["rp5", "run", "--jruby", "--nojruby", "a.rb"]).is_err());
    assert!(CliArgs::try_parse_from(["rp5", "watch", "--poll", "--events", "a.rb"]).is_err());
    assert!(CliArgs::try_parse_from(["rp5", "create", "--wrap", "--inner", "a"]).is_err());
    assert!(CliArgs::try_parse_from(["rp5", "run"]).is_err());
    assert!(CliArgs::try_parse_from(["rp5", "setup", "reinstall"]).is_err());
}
