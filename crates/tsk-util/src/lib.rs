//! tsk-util - Shared utilities for the tsk pipeline.
//!
//! This crate holds the error taxonomy used by every phase of the
//! pipeline, the shared `Result` alias, and the prefix auto-completion
//! routine that backs name canonicalization.

pub mod complete;
pub mod error;

pub use complete::{autocomplete, MINIMUM_MATCH_LENGTH};
pub use error::{Error, Result};
