//! Deadlines and cancellation for running layouts.

use crate::error::{Interruption, LayoutError, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Shared cancellation flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Polled by engines between phases. A default monitor never interrupts.
#[derive(Debug, Clone, Default)]
pub struct LayoutMonitor {
    deadline: Option<Instant>,
    cancel: CancelToken,
}

impl LayoutMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// A timeout too large to represent means no deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Instant::now().checked_add(timeout);
        self
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Cancellation wins over an expired deadline.
    pub fn interruption(&self) -> Option<Interruption> {
        if self.cancel.is_cancelled() {
            return Some(Interruption::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(Interruption::DeadlineExpired),
            _ => None,
        }
    }

    pub fn check(&self) -> Result<()> {
        match self.interruption() {
            Some(reason) => Err(LayoutError::Interrupted { reason }),
            None => Ok(()),
        }
    }

    /// Maps an engine failure, turning remora's interruption into the monitor's reason.
    pub(crate) fn engine_error(&self, err: remora::Error) -> LayoutError {
        match err {
            remora::Error::Interrupted { phase } => {
                let reason = self.interruption().unwrap_or(Interruption::Cancelled);
                tracing::debug!(phase, %reason, "engine interrupted");
                LayoutError::Interrupted { reason }
            }
            other => LayoutError::Engine(other),
        }
    }
}

impl remora::Interrupt for LayoutMonitor {
    fn interrupted(&self) -> bool {
        self.interruption().is_some()
    }
}
