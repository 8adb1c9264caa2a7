// src/config/validate.rs

use std::path::PathBuf;
use std::time::Duration;

use crate::config::duration::parse_duration;
use crate::config::model::{DEFAULT_INTERVAL, RawConfigFile, Settings};
use crate::errors::{HotrunError, Result};
use crate::supervisor::{DEFAULT_GRACE_PERIOD, OutputSink};
use crate::watch::IgnoreRules;

impl TryFrom<RawConfigFile> for Settings {
    type Error = HotrunError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let program = validate_program(&raw)?;
        let root = validate_root(&raw)?;
        let interval = match raw.watch.interval.as_deref() {
            Some(s) => duration_setting("[watch].interval", s)?,
            None => DEFAULT_INTERVAL,
        };
        if interval.is_zero() {
            return Err(HotrunError::ConfigError(
                "[watch].interval must be greater than zero".to_string(),
            ));
        }
        let grace_period = match raw.command.grace_period.as_deref() {
            Some(s) => duration_setting("[command].grace_period", s)?,
            None => DEFAULT_GRACE_PERIOD,
        };

        IgnoreRules::with_patterns(&raw.watch.ignore)
            .map_err(|e| HotrunError::ConfigError(format!("[watch].ignore: {e:#}")))?;

        let stdout = sink_setting("[command].stdout", raw.command.stdout.as_deref())?;
        let stderr = sink_setting("[command].stderr", raw.command.stderr.as_deref())?;

        Ok(Settings {
            root,
            interval,
            ignore: raw.watch.ignore,
            program,
            args: raw.command.args,
            grace_period,
            stdout,
            stderr,
        })
    }
}

fn validate_program(raw: &RawConfigFile) -> Result<String> {
    match raw.command.program.as_deref().map(str::trim) {
        Some(program) if !program.is_empty() => Ok(program.to_string()),
        _ => Err(HotrunError::ConfigError(
            "no command to run: set [command].program or pass one after `--`".to_string(),
        )),
    }
}

/// The root is canonicalized so a symlinked root is walked like the
/// directory it points to. Links below the root are still not followed.
fn validate_root(raw: &RawConfigFile) -> Result<PathBuf> {
    let root = raw
        .watch
        .root
        .clone()
        .unwrap_or_else(|| PathBuf::from("."));
    if !root.is_dir() {
        return Err(HotrunError::ConfigError(format!(
            "[watch].root {:?} is not a directory",
            root
        )));
    }
    root.canonicalize().map_err(|e| {
        HotrunError::ConfigError(format!("[watch].root {:?} cannot be resolved: {e}", root))
    })
}

fn duration_setting(key: &str, value: &str) -> Result<Duration> {
    parse_duration(value).map_err(|e| HotrunError::ConfigError(format!("{key}: {e}")))
}

fn sink_setting(key: &str, value: Option<&str>) -> Result<OutputSink> {
    match value {
        None => Ok(OutputSink::Inherit),
        Some(s) => s
            .parse()
            .map_err(|e| HotrunError::ConfigError(format!("{key}: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::{CommandSection, WatchSection};

    fn raw_with_program(program: &str) -> RawConfigFile {
        RawConfigFile {
            watch: WatchSection::default(),
            command: CommandSection {
                program: Some(program.to_string()),
                ..Default::default()
            },
        }
    }

    #[test]
    fn defaults_are_applied() {
        let settings = Settings::try_from(raw_with_program("echo")).unwrap();
        assert_eq!(settings.root, PathBuf::from(".").canonicalize().unwrap());
        assert_eq!(settings.interval, Duration::from_millis(500));
        assert_eq!(settings.grace_period, Duration::from_secs(3));
        assert_eq!(settings.stdout, OutputSink::Inherit);
        assert_eq!(settings.stderr, OutputSink::Inherit);
        assert!(settings.args.is_empty());
    }

    #[test]
    fn missing_program_is_rejected() {
        let err = Settings::try_from(RawConfigFile::default()).unwrap_err();
        assert!(matches!(err, HotrunError::ConfigError(ref msg) if msg.contains("no command")));

        let err = Settings::try_from(raw_with_program("   ")).unwrap_err();
        assert!(matches!(err, HotrunError::ConfigError(_)));
    }

    #[test]
    fn zero_interval_is_rejected() {
        let mut raw = raw_with_program("echo");
        raw.watch.interval = Some("0ms".to_string());
        let err = Settings::try_from(raw).unwrap_err();
        assert!(err.to_string().contains("greater than zero"));
    }

    #[test]
    fn bad_duration_names_the_key() {
        let mut raw = raw_with_program("echo");
        raw.command.grace_period = Some("soon".to_string());
        let err = Settings::try_from(raw).unwrap_err();
        assert!(err.to_string().contains("[command].grace_period"));
    }

    #[test]
    fn bad_ignore_glob_is_rejected() {
        let mut raw = raw_with_program("echo");
        raw.watch.ignore = vec!["a/[".to_string()];
        let err = Settings::try_from(raw).unwrap_err();
        assert!(err.to_string().contains("[watch].ignore"));
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_root_resolves_to_its_target() {
        let target = tempfile::tempdir().unwrap();
        let links = tempfile::tempdir().unwrap();
        let link = links.path().join("project");
        std::os::unix::fs::symlink(target.path(), &link).unwrap();

        let mut raw = raw_with_program("echo");
        raw.watch.root = Some(link);
        let settings = Settings::try_from(raw).unwrap();
        assert_eq!(settings.root, target.path().canonicalize().unwrap());
    }

    #[test]
    fn missing_root_is_rejected() {
        let mut raw = raw_with_program("echo");
        raw.watch.root = Some(PathBuf::from("/definitely/not/here"));
        let err = Settings::try_from(raw).unwrap_err();
        assert!(err.to_string().contains("not a directory"));
    }
}
