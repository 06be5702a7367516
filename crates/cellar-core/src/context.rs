//! Per-call cancellation and deadlines.
//!
//! Store operations block until the backend responds. An [`OpContext`] lets the
//! caller bound that wait: a backend checks it before touching storage and
//! polls [`OpContext::should_interrupt`] while a statement runs.

use crate::error::{CellarError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Shared cancellation flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Cancellation and deadline carried by every store call
#[derive(Debug, Clone, Default)]
pub struct OpContext {
    deadline: Option<Instant>,
    cancel: Option<CancelToken>,
}

impl OpContext {
    /// No deadline, not cancellable
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline, `None` when there is no deadline
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// True when the context carries a deadline or a cancel token
    pub fn is_bounded(&self) -> bool {
        self.deadline.is_some() || self.cancel.is_some()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }

    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// True once the call should stop
    pub fn should_interrupt(&self) -> bool {
        self.is_cancelled() || self.is_expired()
    }

    /// Fail with [`CellarError::Cancelled`] if the call should stop.
    pub fn check(&self) -> Result<()> {
        match self.interrupt_reason() {
            Some(reason) => Err(CellarError::Cancelled(reason.to_string())),
            None => Ok(()),
        }
    }

    /// The error to report after the backend aborted a statement on our behalf
    pub fn interrupted_error(&self) -> CellarError {
        CellarError::Cancelled(
            self.interrupt_reason()
                .unwrap_or("statement interrupted")
                .to_string(),
        )
    }

    fn interrupt_reason(&self) -> Option<&'static str> {
        if self.is_cancelled() {
            Some("cancelled by caller")
        } else if self.is_expired() {
            Some("deadline exceeded")
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_background_never_interrupts() {
        let ctx = OpContext::background();
        assert!(!ctx.should_interrupt());
        assert!(ctx.check().is_ok());
        assert_eq!(ctx.remaining(), None);
        assert!(!ctx.is_bounded());
    }

    #[test]
    fn test_cancel_is_shared() {
        let token = CancelToken::new();
        let ctx = OpContext::background().with_cancel(token.clone());
        assert!(ctx.check().is_ok());

        token.cancel();
        assert!(ctx.is_cancelled());
        let err = ctx.check().unwrap_err();
        assert!(err.is_cancelled());
        assert!(err.to_string().contains("cancelled by caller"));
    }

    #[test]
    fn test_expired_deadline() {
        let ctx = OpContext::background().with_deadline(Instant::now());
        assert!(ctx.is_expired());
        assert_eq!(ctx.remaining(), Some(Duration::ZERO));
        let err = ctx.check().unwrap_err();
        assert!(err.to_string().contains("deadline exceeded"));
    }

    #[test]
    fn test_future_deadline() {
        let ctx = OpContext::background().with_timeout(Duration::from_secs(60));
        assert!(!ctx.should_interrupt());
        assert!(ctx.remaining().unwrap() > Duration::from_secs(30));
    }
}
