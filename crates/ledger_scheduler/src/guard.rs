//! Mutual exclusion for scheduler ticks.

use std::sync::atomic::{AtomicBool, Ordering};

/// Is-a-tick-currently-running flag.
///
/// At most one permit exists at a time; a second acquisition attempt while a
/// tick runs returns `None` and the caller skips its tick.
#[derive(Debug, Default)]
pub(crate) struct TickGuard {
    running: AtomicBool,
}

impl TickGuard {
    /// Tries to start a tick. Returns a permit that releases the flag on drop.
    pub(crate) fn try_acquire(&self) -> Option<TickPermit<'_>> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            Some(TickPermit { guard: self })
        } else {
            None
        }
    }
}

/// RAII permit for one tick.
pub(crate) struct TickPermit<'a> {
    guard: &'a TickGuard,
}

impl Drop for TickPermit<'_> {
    fn drop(&mut self) {
        self.guard.running.store(false, Ordering::Release);
    }
}
