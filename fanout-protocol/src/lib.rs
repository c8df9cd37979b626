//! Fanout job-file protocol
//!
//! One job is materialized as up to four sentinel files in a shared scratch
//! directory, keyed by a fixed-width numeric id: `-in` (serialized
//! arguments), `-started` (worker began), `-out` (serialized return value)
//! and `-done` (completion signal, always written last). Workers only create
//! files; the dispatcher is the only deleter, and deletes only after
//! observing `-done`. That read/write split is what lets both sides share a
//! directory without any locking.

pub mod dir;
pub mod error;
pub mod files;
pub mod wire;

// Re-export main types
pub use dir::JobDir;
pub use error::{ProtocolError, ProtocolResult};
pub use files::{file_id, pad_width, parse_name, JobFile, MIN_ID_WIDTH};
pub use wire::{JobInput, JobOutcome};
