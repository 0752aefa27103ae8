use std::sync::atomic::{AtomicU64, Ordering};

/// Opaque identity of one load attempt. `Copy`, compared only for
/// equality — never ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionToken(u64);

/// Mints a strictly increasing token per load attempt; exactly one token
/// is current at any time and issuing a new one invalidates all prior
/// tokens immediately.
///
/// This is the sole guard against cross-episode data corruption: every
/// async stage re-checks [`SessionController::is_current`] before
/// expensive work and again before publishing. Superseded pipelines run
/// to completion, but their output is inert. Stale tokens are expected
/// and frequent, never failures.
#[derive(Debug, Default)]
pub struct SessionController {
    epoch: AtomicU64,
}

impl SessionController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new load attempt, invalidating every earlier token.
    pub fn begin_load(&self) -> SessionToken {
        SessionToken(self.epoch.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Is this token still the current load?
    #[must_use]
    pub fn is_current(&self, token: SessionToken) -> bool {
        self.epoch.load(Ordering::SeqCst) == token.0
    }

    /// Invalidate the current load without starting a new one (playback
    /// stop / teardown).
    pub fn retire(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
    }
}
