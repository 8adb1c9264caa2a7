// src/lib.rs

pub mod cli;
pub mod config;
pub mod driver;
pub mod errors;
pub mod fs;
pub mod logging;
pub mod supervisor;
pub mod watch;

use std::future::Future;

use anyhow::Result;
use tokio::signal::unix::{SignalKind, signal};
use tracing::info;

use crate::cli::CliArgs;
use crate::config::{Settings, load_settings};
use crate::driver::Driver;
use crate::supervisor::SupervisedTask;
use crate::watch::{ChangeDetector, IgnoreRules};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (file + CLI overrides)
/// - the change detector and the supervised task
/// - the polling driver
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let settings = load_settings(&args)?;

    if args.dry_run {
        print_dry_run(&settings);
        return Ok(());
    }

    // Registered before the first start, so an early Ctrl-C still stops the
    // child instead of killing hotrun and orphaning the process group.
    let shutdown = shutdown_signal()?;

    let ignore = IgnoreRules::with_patterns(&settings.ignore)?;
    let detector = ChangeDetector::new(&settings.root, ignore);
    let task = build_task(&settings);

    let driver = Driver::new(detector, task, settings.interval);
    driver.run_until(shutdown).await?;

    info!("hotrun exiting");
    Ok(())
}

/// Build the supervised task described by `settings`.
pub fn build_task(settings: &Settings) -> SupervisedTask {
    SupervisedTask::new(&settings.root, &settings.program, settings.args.iter().cloned())
        .with_stdout(settings.stdout.clone())
        .with_stderr(settings.stderr.clone())
        .with_grace_period(settings.grace_period)
}

/// Install SIGINT / SIGTERM handlers now and return a future that resolves
/// on the first of either.
fn shutdown_signal() -> Result<impl Future<Output = ()>> {
    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    Ok(async move {
        tokio::select! {
            _ = interrupt.recv() => info!("received SIGINT"),
            _ = terminate.recv() => info!("received SIGTERM"),
        }
    })
}

fn print_dry_run(settings: &Settings) {
    println!("hotrun dry-run");
    println!("  root: {}", settings.root.display());
    println!("  interval: {:?}", settings.interval);
    if !settings.ignore.is_empty() {
        println!("  ignore: {:?}", settings.ignore);
    }
    println!("  program: {}", settings.program);
    if !settings.args.is_empty() {
        println!("  args: {:?}", settings.args);
    }
    println!("  grace_period: {:?}", settings.grace_period);
    println!("  stdout: {}", settings.stdout);
    println!("  stderr: {}", settings.stderr);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use nix::sys::signal::{Signal, raise};

    #[tokio::test]
    async fn interrupt_before_first_poll_is_not_lost() {
        let shutdown = shutdown_signal().unwrap();
        // Delivered before anything awaits `shutdown`.
        raise(Signal::SIGINT).unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        tokio::time::timeout(Duration::from_secs(5), shutdown)
            .await
            .expect("shutdown future should resolve after SIGINT");
    }
}
