//! # replica - One-way folder mirroring
//!
//! Keeps a destination directory an exact copy of a source directory.
//!
//! Each pass walks both trees, compares files present on both sides by
//! BLAKE3 digest, and applies the minimal set of directory creations,
//! copies and removals. Passes can run once or on a fixed interval; an
//! orchestrator never lets two passes overlap.

// Module declarations
pub mod config;
pub mod scanner;
pub mod diff;
pub mod executor;
pub mod hash;
pub mod orchestrator;
pub mod types;

// Re-export commonly used types
pub use types::{MirrorError, PassResult, SyncAction, TreeSnapshot};
pub use config::Config;
pub use orchestrator::{run_once, run_periodic, Orchestrator};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
