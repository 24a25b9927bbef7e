//! Corpus assembly: shard combining, cross-directory merging and dataset
//! loading

pub mod classifier;
pub mod combine;
pub mod dataset;
pub mod merger;
pub mod writer;

pub use classifier::{FileClass, FileClassifier};
pub use combine::{combine_shards, CombineReport};
pub use dataset::{load_dataset, LabeledRecord};
pub use merger::{CorpusAccumulator, CorpusMerger, MergeReport, MergedCorpus, MetadataTable, TranscriptTable};
pub use writer::write_corpus;
