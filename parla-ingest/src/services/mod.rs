//! Session processing services
//!
//! Bottom-up: markup segmentation (segmenter, splitter, coalescer), roster
//! matching, then the per-session driver and the statement export.

pub mod context_coalescer;
pub mod roster;
pub mod segmenter;
pub mod session_processor;
pub mod session_scanner;
pub mod speaker_matcher;
pub mod statement_export;
pub mod subspeech_splitter;

pub use context_coalescer::ContextCoalescer;
pub use roster::Roster;
pub use segmenter::{DirectoryPartials, DocumentSegmenter, MarkupFormat, PartialDocumentSource, Segmentation};
pub use session_processor::{BatchReport, SessionOutcome, SessionProcessor};
pub use session_scanner::{SessionLocation, SessionScanner};
pub use speaker_matcher::SpeakerMatcher;
pub use statement_export::{collect_statements, write_statements, StatementRecord};
pub use subspeech_splitter::{SplitDecision, SubSpeechSplitter};
