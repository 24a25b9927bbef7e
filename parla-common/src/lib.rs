//! # Parla Common Library
//!
//! Shared code for the parliamentary corpus tools including:
//! - Error types
//! - Configuration loading
//! - Corpus data model (utterances, roster records, session metadata)
//! - Text normalization helpers

pub mod config;
pub mod error;
pub mod model;
pub mod text;

pub use error::{Error, Result};
pub use model::{Language, SessionMetadata, SpeakerRecord, StatementDescriptor, Utterance, UtteranceMetadata};
