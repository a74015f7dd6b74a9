//! Pass orchestration: one walk-plan-execute cycle at a time

mod guard;
mod schedule;
mod sink;

pub use guard::{destination_guard, BusyGuard, PassPermit};
pub use schedule::run_periodic;
pub use sink::{JsonLinesSink, MultiSink, PassRecord, PassSink, TracingSink};

use crate::diff::{generate_sync_plan, ContentComparer, DigestComparer};
use crate::executor::{execute_plan, pool, WorkerPool};
use crate::scanner::scan_directory;
use crate::types::{MirrorError, PassResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// Mirrors one source root into one destination root.
///
/// Passes into the same destination never overlap: each one holds the
/// destination's [`BusyGuard`] (see [`destination_guard`]) from the first walk
/// until execution ends, and a pass that cannot claim it is recorded as
/// skipped without touching either tree. This holds across instances, so two
/// orchestrators or two calls to the free [`run_once`] on one destination
/// exclude each other too.
///
/// A pass blocks the calling thread and owns a short-lived worker runtime, so
/// from async code run it through `tokio::task::spawn_blocking`.
pub struct Orchestrator {
    source: PathBuf,
    destination: PathBuf,
    workers: usize,
    guard: BusyGuard,
    sink: Arc<dyn PassSink>,
    comparer: Option<Arc<dyn ContentComparer>>,
}

impl Orchestrator {
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        let destination = destination.into();
        Self {
            source: source.into(),
            guard: destination_guard(&destination),
            destination,
            workers: pool::default_worker_count(),
            sink: Arc::new(TracingSink),
            comparer: None,
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn PassSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Use a private guard instead of the destination's shared one
    pub fn with_guard(mut self, guard: BusyGuard) -> Self {
        self.guard = guard;
        self
    }

    /// Replace the default BLAKE3 [`DigestComparer`]
    pub fn with_comparer(mut self, comparer: Arc<dyn ContentComparer>) -> Self {
        self.comparer = Some(comparer);
        self
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn guard(&self) -> &BusyGuard {
        &self.guard
    }

    /// Run one pass now, or record a skip if one is already running.
    ///
    /// # Errors
    /// Returns an error only when the pass could not run at all: a root is
    /// missing or unreadable, or the worker pool failed. Per-file failures
    /// are counted in `PassResult::failures`.
    pub fn run_once(&self) -> Result<PassResult, MirrorError> {
        match self.guard.try_acquire() {
            Some(permit) => self.run_with_permit(permit),
            None => {
                self.record_skipped();
                Ok(PassResult::skipped())
            }
        }
    }

    /// Run one pass under an already claimed permit.
    ///
    /// The permit is released as soon as the pass ends, before the record
    /// reaches the sink.
    pub fn run_with_permit(&self, permit: PassPermit) -> Result<PassResult, MirrorError> {
        let outcome = self.run_pass();
        drop(permit);

        let record = match &outcome {
            Ok(result) => PassRecord::completed(result.clone()),
            Err(err) => PassRecord::failed(err),
        };
        self.sink.record(&record);

        outcome
    }

    pub(crate) fn record_skipped(&self) {
        self.sink.record(&PassRecord::skipped());
    }

    fn run_pass(&self) -> Result<PassResult, MirrorError> {
        let started = Instant::now();
        tracing::debug!(
            source = %self.source.display(),
            destination = %self.destination.display(),
            "pass started"
        );

        let source = scan_directory(&self.source)?;
        let dest = scan_directory(&self.destination)?;

        let pool = WorkerPool::new(self.workers, self.workers * 2)?;
        let comparer = match &self.comparer {
            Some(comparer) => Arc::clone(comparer),
            None => Arc::new(DigestComparer::new(
                self.source.clone(),
                self.destination.clone(),
            )),
        };
        let plan = generate_sync_plan(&source, &dest, comparer, &pool)?;
        let mut result = execute_plan(&plan, &self.source, &self.destination, &pool)?;

        result.walk_issues = source.issues().len() + dest.issues().len();
        result.specials_skipped = plan.stats.specials_skipped;
        result.duration = started.elapsed();
        Ok(result)
    }
}

/// Mirror `source` into `destination` once with default settings.
///
/// Skips, like [`Orchestrator::run_once`], if a pass into the same
/// destination is already running anywhere in the process.
///
/// # Example
/// ```no_run
/// let result = replica::run_once("/data/in".as_ref(), "/backup/out".as_ref())?;
/// println!("{} files copied", result.files_copied);
/// # Ok::<(), replica::MirrorError>(())
/// ```
pub fn run_once(source: &Path, destination: &Path) -> Result<PassResult, MirrorError> {
    Orchestrator::new(source, destination).run_once()
}
