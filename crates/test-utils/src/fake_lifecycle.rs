use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use hotrun::errors::{Errno, HotrunError, Result};
use hotrun::supervisor::Lifecycle;

/// Which primitive a [`FakeLifecycle`] saw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Start,
    Kill,
}

/// A lifecycle that spawns nothing:
/// - records every `start` / `kill_command` call in order
/// - fails either primitive on demand.
#[derive(Debug, Clone, Default)]
pub struct FakeLifecycle {
    calls: Arc<Mutex<Vec<Call>>>,
    fail_start: bool,
    fail_kill: bool,
}

impl FakeLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_start(mut self) -> Self {
        self.fail_start = true;
        self
    }

    pub fn failing_kill(mut self) -> Self {
        self.fail_kill = true;
        self
    }

    /// Shared view of the call log; stays valid after the fake is moved.
    pub fn calls_handle(&self) -> Arc<Mutex<Vec<Call>>> {
        Arc::clone(&self.calls)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, call: Call) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| **c == call).count()
    }
}

impl Lifecycle for FakeLifecycle {
    fn start(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            self.calls.lock().unwrap().push(Call::Start);
            if self.fail_start {
                return Err(HotrunError::Launch {
                    program: "fake".to_string(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "fake start failure"),
                });
            }
            Ok(())
        })
    }

    fn kill_command(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            self.calls.lock().unwrap().push(Call::Kill);
            if self.fail_kill {
                return Err(HotrunError::KillFailed {
                    pgid: 4242,
                    source: Errno::EPERM,
                });
            }
            Ok(())
        })
    }
}
