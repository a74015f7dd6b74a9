//! Busy flag ensuring passes never overlap

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

/// Per-orchestrator busy flag.
///
/// `try_acquire` flips the flag from idle to busy in one compare-and-swap and
/// hands back a permit; dropping the permit clears the flag, on every exit
/// path including unwinding.
#[derive(Debug, Clone, Default)]
pub struct BusyGuard {
    busy: Arc<AtomicBool>,
}

impl BusyGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the flag, or `None` if a pass already holds it
    pub fn try_acquire(&self) -> Option<PassPermit> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| PassPermit {
                busy: Arc::clone(&self.busy),
            })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// The process-wide guard for one destination root.
///
/// Every call naming the same directory (after canonicalisation, so `out`,
/// `out/.` and an absolute spelling agree) returns a clone of the same flag.
/// A destination that does not exist yet is keyed by the path as given.
pub fn destination_guard(destination: &Path) -> BusyGuard {
    static GUARDS: OnceLock<Mutex<HashMap<PathBuf, BusyGuard>>> = OnceLock::new();

    let key = destination
        .canonicalize()
        .unwrap_or_else(|_| destination.to_path_buf());
    let mut guards = GUARDS
        .get_or_init(Default::default)
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    guards.entry(key).or_default().clone()
}

/// Proof that the holder owns the busy flag. Owned and `Send`, so it can move
/// into the blocking task that runs the pass.
#[derive(Debug)]
pub struct PassPermit {
    busy: Arc<AtomicBool>,
}

impl Drop for PassPermit {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}
