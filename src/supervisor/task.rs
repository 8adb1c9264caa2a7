// src/supervisor/task.rs

//! A single supervised child process.

use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use anyhow::anyhow;
use nix::sys::signal::{Signal, killpg};
use nix::unistd::Pid;
use tokio::process::Command;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, info, warn};

use crate::errors::{HotrunError, Result};

use super::{Lifecycle, OutputSink, TaskState};

/// How long a process gets to exit after SIGINT before it is SIGKILLed.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(3);

/// How long reaping may take after SIGKILL before it is reported as stuck.
const KILL_REAP_WARNING: Duration = Duration::from_secs(5);

/// A live child process.
///
/// The child itself is owned by `reaper`, a Tokio task that waits for it to
/// exit. Since the child leads its own process group, `pgid` is also its pid.
struct RunningProcess {
    pgid: Pid,
    reaper: JoinHandle<io::Result<ExitStatus>>,
}

/// One command line, run as at most one process at a time.
///
/// The process is started in a fresh process group so that signals sent on
/// stop reach every descendant it spawned, and never the supervisor itself.
pub struct SupervisedTask {
    program: PathBuf,
    args: Vec<String>,
    dir: PathBuf,
    stdout: OutputSink,
    stderr: OutputSink,
    grace_period: Duration,
    process: Option<RunningProcess>,
    last_exit: Option<ExitStatus>,
}

impl std::fmt::Debug for SupervisedTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupervisedTask")
            .field("program", &self.program)
            .field("args", &self.args)
            .field("dir", &self.dir)
            .field("pid", &self.pid())
            .finish_non_exhaustive()
    }
}

impl SupervisedTask {
    /// A task running `program args...` inside `dir`, with inherited output
    /// and the default grace period.
    pub fn new(
        dir: impl Into<PathBuf>,
        program: impl Into<PathBuf>,
        args: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            dir: dir.into(),
            stdout: OutputSink::default(),
            stderr: OutputSink::default(),
            grace_period: DEFAULT_GRACE_PERIOD,
            process: None,
            last_exit: None,
        }
    }

    pub fn with_stdout(mut self, sink: OutputSink) -> Self {
        self.stdout = sink;
        self
    }

    pub fn with_stderr(mut self, sink: OutputSink) -> Self {
        self.stderr = sink;
        self
    }

    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn grace_period(&self) -> Duration {
        self.grace_period
    }

    /// Process (and process group) id of the tracked process, if any.
    ///
    /// Still set for a process that has exited but not been reaped yet.
    pub fn pid(&self) -> Option<i32> {
        self.process.as_ref().map(|p| p.pgid.as_raw())
    }

    /// Exit status of the most recently reaped process.
    pub fn last_exit(&self) -> Option<ExitStatus> {
        self.last_exit
    }

    pub fn state(&self) -> TaskState {
        match &self.process {
            Some(p) if !p.reaper.is_finished() => TaskState::Running,
            _ => TaskState::Idle,
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == TaskState::Running
    }

    /// Launch the configured command in a new process group.
    ///
    /// Fails with [`HotrunError::AlreadyRunning`] if the previous process is
    /// still alive; a previous process that already exited is reaped first.
    pub async fn start(&mut self) -> Result<()> {
        if let Some(process) = &self.process {
            if !process.reaper.is_finished() {
                return Err(HotrunError::AlreadyRunning {
                    pid: process.pgid.as_raw(),
                });
            }
            self.reap().await?;
        }

        let stdout = self.stdout.open().map_err(|e| self.launch_error(e))?;
        let stderr = self.stderr.open().map_err(|e| self.launch_error(e))?;

        info!(
            program = %self.program.display(),
            args = ?self.args,
            dir = %self.dir.display(),
            "starting process"
        );

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .current_dir(&self.dir)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr)
            .process_group(0)
            .spawn()
            .map_err(|e| self.launch_error(e))?;

        let pid = child
            .id()
            .and_then(|id| i32::try_from(id).ok())
            .ok_or_else(|| anyhow!("spawned process has no usable pid"))?;

        let reaper = tokio::spawn(async move { child.wait().await });

        info!(pid, "process started");
        self.process = Some(RunningProcess {
            pgid: Pid::from_raw(pid),
            reaper,
        });
        Ok(())
    }

    /// Stop the tracked process group and wait until the process is reaped.
    ///
    /// Sends SIGINT to the group first. If the process is still alive after
    /// the grace period the group gets SIGKILL. A no-op when nothing is
    /// tracked.
    pub async fn kill_command(&mut self) -> Result<()> {
        let grace_period = self.grace_period;
        let Some(process) = self.process.as_mut() else {
            return Ok(());
        };
        let pgid = process.pgid;

        if process.reaper.is_finished() {
            debug!(pid = pgid.as_raw(), "process already exited; reaping");
            self.reap().await?;
            return Ok(());
        }

        info!(pid = pgid.as_raw(), "stopping process group");
        // Not fatal: the process may have exited between the check above and
        // now (ESRCH). Whether it is gone is decided by the reaper race below,
        // and a group that really ignores us gets SIGKILL.
        if let Err(errno) = killpg(pgid, Signal::SIGINT) {
            warn!(pid = pgid.as_raw(), error = %errno, "failed to send SIGINT");
        }

        let exited = tokio::select! {
            joined = &mut process.reaper => Some(joined),
            _ = tokio::time::sleep(grace_period) => None,
        };

        if let Some(joined) = exited {
            self.process = None;
            let status = self.record_exit(joined)?;
            info!(pid = pgid.as_raw(), %status, "process stopped");
            return Ok(());
        }

        warn!(
            pid = pgid.as_raw(),
            grace_ms = grace_period.as_millis() as u64,
            "process ignored SIGINT; sending SIGKILL"
        );
        if let Err(errno) = killpg(pgid, Signal::SIGKILL) {
            let gone = self
                .process
                .as_ref()
                .is_some_and(|p| p.reaper.is_finished());
            if !gone {
                return Err(HotrunError::KillFailed {
                    pgid: pgid.as_raw(),
                    source: errno,
                });
            }
            debug!(pid = pgid.as_raw(), "process exited just before SIGKILL");
        }

        let reaped = match tokio::time::timeout(KILL_REAP_WARNING, self.reap()).await {
            Ok(reaped) => reaped?,
            Err(_) => {
                warn!(
                    pid = pgid.as_raw(),
                    waited_ms = KILL_REAP_WARNING.as_millis() as u64,
                    "process not reaped after SIGKILL; still waiting"
                );
                self.reap().await?
            }
        };
        if let Some(status) = reaped {
            info!(pid = pgid.as_raw(), %status, "process killed");
        }
        Ok(())
    }

    /// Kill the current process (if any), then start a new one.
    pub async fn run(&mut self) -> Result<()> {
        super::restart(self).await
    }

    /// Wait for the tracked process to exit on its own and reap it.
    ///
    /// Returns `None` when nothing is tracked.
    pub async fn wait(&mut self) -> Result<Option<ExitStatus>> {
        self.reap().await
    }

    async fn reap(&mut self) -> Result<Option<ExitStatus>> {
        let Some(process) = self.process.as_mut() else {
            return Ok(None);
        };
        let joined = (&mut process.reaper).await;
        self.process = None;
        self.record_exit(joined).map(Some)
    }

    fn record_exit(
        &mut self,
        joined: std::result::Result<io::Result<ExitStatus>, JoinError>,
    ) -> Result<ExitStatus> {
        let status = joined
            .map_err(anyhow::Error::from)?
            .map_err(HotrunError::Reap)?;
        self.last_exit = Some(status);
        Ok(status)
    }

    fn launch_error(&self, source: io::Error) -> HotrunError {
        HotrunError::Launch {
            program: self.program.display().to_string(),
            source,
        }
    }
}

impl Lifecycle for SupervisedTask {
    fn start(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(SupervisedTask::start(self))
    }

    fn kill_command(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(SupervisedTask::kill_command(self))
    }
}

impl Drop for SupervisedTask {
    fn drop(&mut self) {
        // Last resort so a dropped task never leaves its process group behind.
        if let Some(process) = &self.process {
            if !process.reaper.is_finished() {
                let _ = killpg(process.pgid, Signal::SIGKILL);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn kill_without_process_is_a_no_op() {
        let mut task = SupervisedTask::new(".", "true", Vec::<String>::new());
        task.kill_command().await.unwrap();
        assert_eq!(task.state(), TaskState::Idle);
        assert!(task.last_exit().is_none());
    }

    #[tokio::test]
    async fn wait_without_process_returns_none() {
        let mut task = SupervisedTask::new(".", "true", Vec::<String>::new());
        assert!(task.wait().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn missing_executable_leaves_task_idle() {
        let mut task = SupervisedTask::new(".", "/nonexistent/hotrun-binary", ["x"]);
        let err = task.start().await.unwrap_err();
        assert!(matches!(err, HotrunError::Launch { .. }));
        assert!(err.to_string().contains("failed to launch"));
        assert!(task.pid().is_none());
        assert_eq!(task.state(), TaskState::Idle);
    }

    #[tokio::test]
    async fn start_rejects_a_second_live_process() {
        let mut task = SupervisedTask::new(".", "sleep", ["30"]);
        task.start().await.unwrap();
        let first = task.pid();

        let err = task.start().await.unwrap_err();
        assert!(matches!(err, HotrunError::AlreadyRunning { .. }));
        assert_eq!(task.pid(), first);

        task.kill_command().await.unwrap();
        assert!(task.pid().is_none());
    }

    #[tokio::test]
    async fn failed_sigint_still_waits_for_the_reaper() {
        use std::os::unix::process::ExitStatusExt;

        let mut task = SupervisedTask::new(".", "true", Vec::<String>::new())
            .with_grace_period(Duration::from_secs(5));
        // No process group has this id, so SIGINT fails with ESRCH. The
        // reaper still finishes well inside the grace period.
        task.process = Some(RunningProcess {
            pgid: Pid::from_raw(i32::MAX),
            reaper: tokio::spawn(async {
                tokio::time::sleep(Duration::from_millis(100)).await;
                Ok(ExitStatus::from_raw(0))
            }),
        });

        let started = std::time::Instant::now();
        task.kill_command().await.unwrap();
        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(task.pid().is_none());
        assert!(task.last_exit().is_some_and(|s| s.success()));
    }

    #[test]
    fn builder_setters_apply() {
        let task = SupervisedTask::new("/tmp", "cargo", ["run", "--release"])
            .with_grace_period(Duration::from_millis(250))
            .with_stdout(OutputSink::Null);
        assert_eq!(task.grace_period(), Duration::from_millis(250));
        assert_eq!(task.args(), ["run", "--release"]);
        assert_eq!(task.program(), Path::new("cargo"));
        assert_eq!(task.dir(), Path::new("/tmp"));
    }
}
