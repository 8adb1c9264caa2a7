// src/supervisor/mod.rs

//! Process supervision.
//!
//! - [`task`] owns one child process: it starts it in its own process group
//!   and stops it with SIGINT, escalating to SIGKILL after a grace period.
//! - [`output`] describes where the child's stdout / stderr go.
//!
//! The restart algorithm only depends on the [`Lifecycle`] trait, so tests
//! can drive it with a fake that never spawns anything.

use std::future::Future;
use std::pin::Pin;

use crate::errors::Result;

pub mod output;
pub mod task;

pub use output::OutputSink;
pub use task::{SupervisedTask, DEFAULT_GRACE_PERIOD};

/// Observable state of a supervised task.
///
/// There is no "crashed" state: a process that exited on its own, for
/// whatever reason, reads as `Idle` just like one that was stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Idle,
    Running,
}

/// The two primitives a restart is composed of.
///
/// Production code uses [`SupervisedTask`]; tests can provide their own
/// implementation that records calls instead of spawning processes.
pub trait Lifecycle: Send {
    /// Launch a new instance.
    fn start(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Stop the current instance, if any, and wait until it is reaped.
    fn kill_command(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Kill the current instance, then start a fresh one.
///
/// A kill error aborts before anything is started, so two instances never
/// run side by side.
pub async fn restart<L: Lifecycle + ?Sized>(task: &mut L) -> Result<()> {
    task.kill_command().await?;
    task.start().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::HotrunError;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<&'static str>,
        fail_kill: bool,
        fail_start: bool,
    }

    impl Lifecycle for Recorder {
        fn start(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
            Box::pin(async move {
                self.calls.push("start");
                if self.fail_start {
                    return Err(HotrunError::ConfigError("start failed".to_string()));
                }
                Ok(())
            })
        }

        fn kill_command(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
            Box::pin(async move {
                self.calls.push("kill");
                if self.fail_kill {
                    return Err(HotrunError::ConfigError("kill failed".to_string()));
                }
                Ok(())
            })
        }
    }

    #[tokio::test]
    async fn restart_kills_before_starting() {
        let mut r = Recorder::default();
        restart(&mut r).await.unwrap();
        assert_eq!(r.calls, vec!["kill", "start"]);
    }

    #[tokio::test]
    async fn kill_failure_skips_start() {
        let mut r = Recorder {
            fail_kill: true,
            ..Default::default()
        };
        let err = restart(&mut r).await.unwrap_err();
        assert!(err.to_string().contains("kill failed"));
        assert_eq!(r.calls, vec!["kill"]);
    }

    #[tokio::test]
    async fn start_failure_is_surfaced() {
        let mut r = Recorder {
            fail_start: true,
            ..Default::default()
        };
        let err = restart(&mut r).await.unwrap_err();
        assert!(err.to_string().contains("start failed"));
        assert_eq!(r.calls, vec!["kill", "start"]);
    }

    #[tokio::test]
    async fn restart_works_through_a_trait_object() {
        let mut r = Recorder::default();
        let dyn_task: &mut dyn Lifecycle = &mut r;
        restart(dyn_task).await.unwrap();
        assert_eq!(r.calls, vec!["kill", "start"]);
    }
}
