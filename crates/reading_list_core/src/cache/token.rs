//! Single-flight coordination token for full refreshes.

use std::sync::{Condvar, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct TokenState {
    held: bool,
    /// Number of refreshes that have released the token.
    completed: u64,
    waiting: usize,
}

/// Single-permit token: whoever holds it drives the only running refresh.
#[derive(Debug, Default)]
pub(crate) struct RefreshToken {
    state: Mutex<TokenState>,
    released: Condvar,
}

/// Held by the refresh driver; releasing it wakes every coalesced caller.
pub(crate) struct TokenGuard<'a> {
    token: &'a RefreshToken,
}

impl RefreshToken {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Takes the token without blocking, or waits for the in-flight refresh.
    ///
    /// Returns `Some` when the caller must drive a refresh. Returns `None`
    /// once the refresh that was running on arrival has finished; the caller
    /// must not scan again.
    pub(crate) fn acquire_or_wait(&self) -> Option<TokenGuard<'_>> {
        let mut state = self.guard();
        if !state.held {
            state.held = true;
            return Some(TokenGuard { token: self });
        }

        let arrival = state.completed;
        state.waiting += 1;
        let mut state = self
            .released
            .wait_while(state, |state| state.completed == arrival)
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        state.waiting -= 1;
        None
    }

    /// Number of callers currently blocked on an in-flight refresh.
    pub(crate) fn waiting(&self) -> usize {
        self.guard().waiting
    }

    pub(crate) fn is_held(&self) -> bool {
        self.guard().held
    }

    fn release(&self) {
        let mut state = self.guard();
        state.held = false;
        state.completed += 1;
        self.released.notify_all();
    }

    fn guard(&self) -> MutexGuard<'_, TokenState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for TokenGuard<'_> {
    fn drop(&mut self) {
        self.token.release();
    }
}
