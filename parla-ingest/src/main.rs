//! parla-ingest - parliamentary transcript ingestion
//!
//! Subcommands:
//! - `process`: discover sessions and write per-session shards
//! - `statements`: export one session's statements
//! - `combine`: concatenate shards into `merged_all.txt` / `merged_all.json`
//! - `merge`: cross-directory corpus merge (transcripts + pl/en metadata)
//! - `validate`: load a labeled dataset and check record counts

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use parla_common::config::{load_toml_config, PathOverrides, ResolvedConfig};
use parla_ingest::corpus::combine::{MERGED_JSON, MERGED_TXT};
use parla_ingest::corpus::{combine_shards, load_dataset, write_corpus, CorpusMerger};
use parla_ingest::services::{
    collect_statements, write_statements, SessionLocation, SessionProcessor, SessionScanner,
};
use parla_ingest::SessionKey;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_HASH"),
    ", built ",
    env!("BUILD_TIMESTAMP"),
    ", ",
    env!("BUILD_PROFILE"),
    ")"
);

/// Command-line arguments for parla-ingest
#[derive(Parser, Debug)]
#[command(name = "parla-ingest")]
#[command(about = "Parliamentary transcript ingestion and corpus assembly")]
#[command(version, long_version = LONG_VERSION)]
struct Cli {
    /// Config file (defaults to <config_dir>/parla/config.toml)
    #[arg(long, global = true, env = "PARLA_CONFIG")]
    config: Option<PathBuf>,

    /// Log level when RUST_LOG is not set (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Segment every session and write shards
    Process {
        /// Transcript tree root (<term>/<sitting>/<date>_<n>.html)
        #[arg(long)]
        data_root: Option<PathBuf>,

        /// Roster tree root (<term>/deputies.csv)
        #[arg(long)]
        roster_root: Option<PathBuf>,

        /// Shard output directory
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Rewrite shards of sessions already processed
        #[arg(long)]
        force: bool,

        /// Worker threads
        #[arg(long)]
        jobs: Option<usize>,
    },

    /// Export the statements of one session
    Statements {
        term: String,
        sitting: String,
        /// Session date (YYYY-MM-DD)
        date: String,

        #[arg(long)]
        data_root: Option<PathBuf>,

        #[arg(long, default_value = "statements.jsonl")]
        out_jsonl: PathBuf,

        #[arg(long, default_value = "statements.tsv")]
        out_tsv: PathBuf,
    },

    /// Concatenate all shards under the output directory
    Combine {
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Defaults to <output_dir>/merged_all.txt
        #[arg(long)]
        out_txt: Option<PathBuf>,

        /// Defaults to <output_dir>/merged_all.json
        #[arg(long)]
        out_json: Option<PathBuf>,
    },

    /// Merge transcript and metadata shards found anywhere under a root
    Merge {
        root: PathBuf,
        out_transcripts: PathBuf,
        out_meta_pl: PathBuf,
        out_meta_en: PathBuf,
    },

    /// Load a dataset directory and verify record counts
    Validate { dataset_dir: PathBuf },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let toml_config = load_toml_config(cli.config.as_deref());

    let default_level = cli.log_level.clone().unwrap_or_else(|| {
        toml_config
            .as_ref()
            .map(|c| c.logging.level.clone())
            .unwrap_or_else(|_| "info".to_string())
    });
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&default_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let toml_config = toml_config.context("Failed to load configuration")?;

    match cli.command {
        Command::Process {
            data_root,
            roster_root,
            output_dir,
            force,
            jobs,
        } => {
            let config = ResolvedConfig::resolve(
                &PathOverrides {
                    data_root,
                    roster_root,
                    output_dir,
                },
                toml_config,
            );
            info!(
                data_root = %config.data_root.display(),
                roster_root = %config.roster_root.display(),
                output_dir = %config.output_dir.display(),
                "Processing sessions"
            );

            let sessions = SessionScanner::new(&config.markup_extension)
                .scan(&config.data_root)
                .context("Session discovery failed")?;
            let report = SessionProcessor::new(&config)
                .with_force(force)
                .with_jobs(jobs)
                .run_batch(&sessions)?;

            println!(
                "processed={} skipped_existing={} skipped_no_roster={} failed={} utterances={} degraded={}",
                report.processed,
                report.skipped_existing,
                report.skipped_no_roster,
                report.failed,
                report.utterances,
                report.degraded
            );
        }

        Command::Statements {
            term,
            sitting,
            date,
            data_root,
            out_jsonl,
            out_tsv,
        } => {
            let config = ResolvedConfig::resolve(
                &PathOverrides {
                    data_root,
                    ..Default::default()
                },
                toml_config,
            );
            let parsed = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
                .with_context(|| format!("Invalid session date: {}", date))?;
            let dir = config.data_root.join(&term).join(&sitting);
            let location = SessionLocation {
                key: SessionKey::new(term, sitting, parsed),
                dir,
                stem: date,
                extension: config.markup_extension.clone(),
            };

            let records = collect_statements(&location)?;
            write_statements(&records, &out_jsonl, &out_tsv)?;
        }

        Command::Combine {
            output_dir,
            out_txt,
            out_json,
        } => {
            let config = ResolvedConfig::resolve(
                &PathOverrides {
                    output_dir,
                    ..Default::default()
                },
                toml_config,
            );
            let out_txt = out_txt.unwrap_or_else(|| config.output_dir.join(MERGED_TXT));
            let out_json = out_json.unwrap_or_else(|| config.output_dir.join(MERGED_JSON));
            combine_shards(&config.output_dir, &out_txt, &out_json)?;
        }

        Command::Merge {
            root,
            out_transcripts,
            out_meta_pl,
            out_meta_en,
        } => {
            let config = ResolvedConfig::resolve(&PathOverrides::default(), toml_config);
            let merger = CorpusMerger::new(config.merge.max_sample_lines).with_excluded([
                out_transcripts.clone(),
                out_meta_pl.clone(),
                out_meta_en.clone(),
            ]);
            let (corpus, report) = merger.merge(&root)?;
            write_corpus(&corpus, &out_transcripts, &out_meta_pl, &out_meta_en)?;

            println!(
                "files={} transcripts={} metadata_pl={} metadata_en={} skipped={}",
                report.files_seen,
                corpus.transcripts.len(),
                corpus.metadata_pl.len(),
                corpus.metadata_en.len(),
                report.skipped_files
            );
        }

        Command::Validate { dataset_dir } => {
            let records = load_dataset(&dataset_dir)?;
            let positive = records.iter().filter(|r| r.label == 1).count();
            println!(
                "records={} label_1={} label_0={}",
                records.len(),
                positive,
                records.len() - positive
            );
        }
    }

    Ok(())
}
