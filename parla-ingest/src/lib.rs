//! parla-ingest library interface
//!
//! Turns raw parliamentary session markup into speaker-attributed utterances
//! with roster metadata, and folds per-session shards into one labeled corpus.
//!
//! - [`markup`]: HTML flattening into block elements
//! - [`services`]: segmentation, roster matching, per-session processing
//! - [`corpus`]: shard combining, cross-directory merging, dataset loading

pub mod corpus;
pub mod error;
pub mod markup;
pub mod services;
pub mod types;

pub use crate::error::{IngestError, IngestResult, Severity};
pub use crate::types::{BlockKind, SessionKey, SpeechBlock};
