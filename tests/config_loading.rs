// tests/config_loading.rs

use std::error::Error;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use tempfile::{tempdir, NamedTempFile};

use rp5::config::{load_and_validate, parse_duration, resolve_config, Rp5Config};
use rp5::errors::Rp5Error;
use rp5::types::{NotifierKind, RuntimeSelector};

type TestResult = Result<(), Box<dyn Error>>;

fn write_config(contents: &str) -> Result<NamedTempFile, Box<dyn Error>> {
    let mut file = NamedTempFile::new()?;
    write!(file, "{contents}")?;
    Ok(file)
}

#[test]
fn empty_file_yields_defaults() -> TestResult {
    let file = write_config("")?;
    let cfg = load_and_validate(file.path())?;
    let base = file.path().parent().ok_or("no parent")?;

    let defaults = Rp5Config::default();
    assert!(!cfg.jruby);
    assert_eq!(cfg.default_runtime(), RuntimeSelector::JrubyComplete);
    assert_eq!(cfg.java, "java");
    assert_eq!(cfg.jruby_complete, base.join("vendors/jruby-complete.jar"));
    assert_eq!(cfg.runners_dir, base.join("runners"));
    assert_eq!(cfg.watch, defaults.watch);
    assert_eq!(cfg.watch.poll_interval, Duration::from_millis(333));
    assert_eq!(cfg.watch.notifier, NotifierKind::Poll);
    Ok(())
}

#[test]
fn full_file_is_parsed_and_paths_resolved() -> TestResult {
    let file = write_config(
        r#"
jruby = true
jruby_bin = "/opt/jruby/bin/jruby"
jruby_complete = "/abs/jruby-complete.jar"
runners_dir = "lib/runners"
jvm_opts = ["-Xms256m", "-Xmx1g"]
installer = "scripts/install.sh"

[watch]
notifier = "events"
poll_interval = "1s"
debounce = "50ms"
grace_period = "5s"
watch_dir = false
patterns = ["**/*.rb"]
use_hash = true
"#,
    )?;
    let cfg = load_and_validate(file.path())?;
    let base = file.path().parent().ok_or("no parent")?;

    assert_eq!(cfg.default_runtime(), RuntimeSelector::SystemJruby);
    assert_eq!(cfg.jruby_bin, "/opt/jruby/bin/jruby");
    assert_eq!(cfg.jruby_complete, PathBuf::from("/abs/jruby-complete.jar"));
    assert_eq!(cfg.runners_dir, base.join("lib/runners"));
    assert_eq!(cfg.installer, Some(base.join("scripts/install.sh")));
    assert_eq!(cfg.jvm_opts, vec!["-Xms256m", "-Xmx1g"]);

    assert_eq!(cfg.watch.notifier, NotifierKind::Events);
    assert_eq!(cfg.watch.poll_interval, Duration::from_secs(1));
    assert_eq!(cfg.watch.debounce, Duration::from_millis(50));
    assert_eq!(cfg.watch.grace_period, Duration::from_secs(5));
    assert!(!cfg.watch.watch_dir);
    assert_eq!(cfg.watch.patterns, vec!["**/*.rb"]);
    assert!(cfg.watch.use_hash);
    Ok(())
}

#[test]
fn invalid_duration_returns_config_error() -> TestResult {
    let file = write_config("[watch]\ndebounce = \"soon\"\n")?;

    match load_and_validate(file.path()) {
        Err(Rp5Error::ConfigError(msg)) => assert!(msg.contains("watch.debounce")),
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
    Ok(())
}

#[test]
fn zero_poll_interval_is_rejected() -> TestResult {
    let file = write_config("[watch]\npoll_interval = \"0ms\"\n")?;

    match load_and_validate(file.path()) {
        Err(Rp5Error::ConfigError(msg)) => assert!(msg.contains("poll_interval")),
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
    Ok(())
}

#[test]
fn empty_patterns_with_watch_dir_are_rejected() -> TestResult {
    let file = write_config("[watch]\npatterns = []\n")?;
    assert!(matches!(
        load_and_validate(file.path()),
        Err(Rp5Error::ConfigError(_))
    ));

    // Without directory watching the patterns are unused.
    let file = write_config("[watch]\nwatch_dir = false\npatterns = []\n")?;
    assert!(load_and_validate(file.path()).is_ok());
    Ok(())
}

#[test]
fn bad_glob_is_rejected() -> TestResult {
    let file = write_config("[watch]\npatterns = [\"src/[.rb\"]\n")?;

    match load_and_validate(file.path()) {
        Err(Rp5Error::ConfigError(msg)) => assert!(msg.contains("src/[.rb")),
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
    Ok(())
}

#[test]
fn unknown_keys_and_notifiers_fail_to_parse() -> TestResult {
    let file = write_config("colour = \"blue\"\n")?;
    assert!(matches!(
        load_and_validate(file.path()),
        Err(Rp5Error::TomlError(_))
    ));

    let file = write_config("[watch]\nnotifier = \"inotify\"\n")?;
    assert!(matches!(
        load_and_validate(file.path()),
        Err(Rp5Error::TomlError(_))
    ));
    Ok(())
}

#[test]
fn empty_java_is_rejected() -> TestResult {
    let file = write_config("java = \"  \"\n")?;
    assert!(matches!(
        load_and_validate(file.path()),
        Err(Rp5Error::ConfigError(_))
    ));
    Ok(())
}

#[test]
fn explicit_config_path_must_exist() -> TestResult {
    let dir = tempdir()?;
    let missing = dir.path().join("missing.toml");

    match resolve_config(Some(&missing)) {
        Err(Rp5Error::ConfigError(msg)) => assert!(msg.contains("missing.toml")),
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
    Ok(())
}

#[test]
fn explicit_config_path_is_loaded() -> TestResult {
    let file = write_config("jruby = true\n")?;
    let cfg = resolve_config(Some(file.path()))?;
    assert!(cfg.jruby);
    Ok(())
}

#[test]
fn parse_duration_units() {
    assert_eq!(parse_duration("250ms"), Ok(Duration::from_millis(250)));
    assert_eq!(parse_duration("3s"), Ok(Duration::from_secs(3)));
    assert_eq!(parse_duration(" 2m "), Ok(Duration::from_secs(120)));
    assert_eq!(parse_duration("1h"), Ok(Duration::from_secs(3600)));
    assert!(parse_duration("").is_err());
    assert!(parse_duration("10").is_err());
    assert!(parse_duration("5d").is_err());
    assert!(parse_duration("ms").is_err());
}

#[test]
fn parse_duration_rejects_overflowing_values() {
    let max = u64::MAX;
    assert!(parse_duration(&format!("{max}m")).is_err());
    assert!(parse_duration(&format!("{}h", max / 60)).is_err());
    assert_eq!(
        parse_duration(&format!("{max}s")),
        Ok(Duration::from_secs(max))
    );
}
