//! PassResult - Outcome of one mirroring pass

use serde::Serialize;
use std::time::Duration;

/// Counts of what one pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PassResult {
    pub dirs_created: usize,
    pub files_copied: usize,
    pub files_removed: usize,
    pub dirs_removed: usize,

    /// Failed file or directory actions
    pub failures: usize,

    /// Paths the walkers could not read (source + destination)
    pub walk_issues: usize,

    /// Source symlinks and special files left unmirrored
    pub specials_skipped: usize,

    pub bytes_copied: u64,

    /// True when the pass never started because another one held the guard
    pub skipped: bool,

    #[serde(serialize_with = "serialize_millis")]
    pub duration: Duration,
}

impl PassResult {
    /// Result for a tick that found a pass already running
    pub fn skipped() -> Self {
        Self {
            skipped: true,
            ..Default::default()
        }
    }

    /// Number of successfully performed actions
    pub fn total_actions(&self) -> usize {
        self.dirs_created + self.files_copied + self.files_removed + self.dirs_removed
    }

    /// Pass ran and every action succeeded
    pub fn is_clean(&self) -> bool {
        !self.skipped && self.failures == 0 && self.walk_issues == 0
    }
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}
