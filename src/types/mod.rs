//! Core type definitions for replica

mod action;
mod entry;
mod error;
mod result;
mod tree;

pub use action::SyncAction;
pub use entry::{EntryKind, PathEntry};
pub use error::MirrorError;
pub use result::PassResult;
pub use tree::{TreeSnapshot, WalkIssue};
