//! Corpus assembly integration tests: cross-directory merge, shard combining
//! and dataset validation

mod helpers;

use helpers::{legacy_backbone, read_lines, Para, SessionTree, ROSTER_CSV};
use parla_ingest::corpus::dataset::LABELS_FILE;
use parla_ingest::corpus::{combine_shards, load_dataset, write_corpus, CorpusMerger};
use parla_ingest::services::{SessionProcessor, SessionScanner};
use parla_ingest::IngestError;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn shard_tree() -> TempDir {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("in");
    write(
        &root,
        "2023/shard_a.txt",
        "A\tDzień dobry, otwieram posiedzenie.\nB\tDziękuję bardzo, Panie Marszałku.\n",
    );
    write(&root, "2024/nested/shard_b.dat", "C\tProszę o zabranie głosu.\nA\tInny tekst tej samej wypowiedzi.\n");
    write(&root, "meta/a-meta.tsv", "imię\twiek\nA\t30\nB\t41\n");
    write(&root, "meta/b-meta-en.tsv", "id\tpartia\nC\tKO\n");
    write(&root, "meta/x-meta.tsv", "id\tx\ty\nD\t1\t\n");
    write(&root, "meta/y-meta.tsv", "id\tx\ty\nD\t2\t9\n");
    write(&root, "notes.bin", "zwykła notatka bez tabulatorów");
    temp
}

fn merge_into(temp: &TempDir, out: &Path) -> parla_ingest::corpus::MergeReport {
    let transcripts = out.join("transcripts.tsv");
    let meta_pl = out.join("meta_pl.tsv");
    let meta_en = out.join("meta_en.tsv");
    let merger = CorpusMerger::new(20).with_excluded([transcripts.clone(), meta_pl.clone(), meta_en.clone()]);
    let (corpus, report) = merger.merge(&temp.path().join("in")).unwrap();
    write_corpus(&corpus, &transcripts, &meta_pl, &meta_en).unwrap();
    report
}

#[test]
fn test_merge_classifies_and_fills() {
    let temp = shard_tree();
    let out = temp.path().join("out");
    let report = merge_into(&temp, &out);

    assert_eq!(report.transcript_files, 2);
    assert_eq!(report.metadata_files, 4);
    assert_eq!(report.skipped_files, 1);
    assert_eq!(report.duplicate_transcript_ids, 1);
    assert_eq!(report.duplicate_metadata_ids, 1);

    assert_eq!(
        read_lines(&out.join("transcripts.tsv")),
        vec![
            "A\tDzień dobry, otwieram posiedzenie.",
            "B\tDziękuję bardzo, Panie Marszałku.",
            "C\tProszę o zabranie głosu.",
        ]
    );

    // a-meta.tsv → pl; b-meta-en.tsv → en despite its Polish header
    let en = read_lines(&out.join("meta_en.tsv"));
    assert_eq!(en, vec!["id\tpartia", "C\tKO"]);

    let pl = read_lines(&out.join("meta_pl.tsv"));
    assert_eq!(pl[0], "imię\twiek\tid\tx\ty");
    assert!(pl.contains(&"A\t30\t\t\t".to_string()));
    // duplicate id: only the empty field is filled
    assert!(pl.contains(&"\t\tD\t1\t9".to_string()));
}

#[test]
fn test_merge_is_idempotent_with_outputs_inside_root() {
    let temp = shard_tree();
    let out = temp.path().join("in").join("merged");

    merge_into(&temp, &out);
    let first: Vec<Vec<u8>> = ["transcripts.tsv", "meta_pl.tsv", "meta_en.tsv"]
        .iter()
        .map(|name| fs::read(out.join(name)).unwrap())
        .collect();

    let report = merge_into(&temp, &out);
    let second: Vec<Vec<u8>> = ["transcripts.tsv", "meta_pl.tsv", "meta_en.tsv"]
        .iter()
        .map(|name| fs::read(out.join(name)).unwrap())
        .collect();

    assert_eq!(first, second);
    assert_eq!(report.files_seen, 7);
}

#[test]
fn test_merge_rejects_missing_root() {
    let temp = TempDir::new().unwrap();
    let result = CorpusMerger::new(20).merge(&temp.path().join("missing"));
    assert!(matches!(result, Err(IngestError::NotADirectory(_))));
}

fn write_dataset(dir: &Path, transcripts: usize, metadata: usize, labels: usize) {
    let txt: Vec<String> = (0..transcripts).map(|i| format!("{}\tTekst Numer {}", i, i)).collect();
    let json: Vec<serde_json::Value> = (0..metadata)
        .map(|i| serde_json::json!({"id": i.to_string(), "speaker": null, "metadata": []}))
        .collect();
    let labels: Vec<&str> = (0..labels).map(|i| if i % 2 == 0 { "0" } else { "1" }).collect();

    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join("merged_all.txt"), txt.join("\n")).unwrap();
    fs::write(dir.join("merged_all.json"), serde_json::to_string(&json).unwrap()).unwrap();
    fs::write(dir.join(LABELS_FILE), labels.join("\n")).unwrap();
}

#[test]
fn test_dataset_count_mismatch_reports_all_counts() {
    let temp = TempDir::new().unwrap();
    write_dataset(temp.path(), 10, 10, 9);

    match load_dataset(temp.path()) {
        Err(e @ IngestError::SchemaViolation { .. }) => {
            assert!(e.to_string().contains("(10, 10, 9)"));
        }
        other => panic!("Expected SchemaViolation, got {:?}", other.map(|r| r.len())),
    }
}

#[test]
fn test_dataset_loads_joined_records() {
    let temp = TempDir::new().unwrap();
    write_dataset(temp.path(), 4, 4, 4);

    let records = load_dataset(temp.path()).unwrap();
    assert_eq!(records.len(), 4);
    assert_eq!(records[1].id, "1");
    assert_eq!(records[1].processed_text, "tekst numer 1");
    assert_eq!(records[1].label, 1);
    assert_eq!(records[1].metadata["id"], "1");
}

#[test]
fn test_dataset_falls_back_to_metadata_table() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path();
    fs::write(dir.join("merged_all.txt"), "a\tPierwszy\nb\tDrugi\n").unwrap();
    fs::write(dir.join("corpus-meta.tsv"), "id\tparty\na\tKO\nb\t\n").unwrap();
    fs::write(dir.join(LABELS_FILE), "1\n0\n").unwrap();

    let records = load_dataset(dir).unwrap();
    assert_eq!(records[0].metadata["party"], "KO");
    assert!(records[1].metadata["party"].is_null());
}

#[test]
fn test_process_combine_validate_pipeline() {
    let tree = SessionTree::new();
    tree.write_document(
        "10",
        "1",
        "2023-11-13",
        0,
        &legacy_backbone(&[
            Para::Marker("Marszałek Jan Kowalski:"),
            Para::Text("Otwieram posiedzenie."),
            Para::Marker("Poseł Ewa Lis:"),
            Para::Text("Dziękuję."),
        ]),
    );
    tree.write_session_metadata("10", "1", "2023-11-13", r#"{"statements": []}"#);
    tree.write_roster("10", ROSTER_CSV);

    let config = tree.config();
    let sessions = SessionScanner::new("html").scan(&config.data_root).unwrap();
    SessionProcessor::new(&config).run_batch(&sessions).unwrap();

    let dataset = tree.temp.path().join("dataset");
    let report = combine_shards(
        &config.output_dir,
        &dataset.join("merged_all.txt"),
        &dataset.join("merged_all.json"),
    )
    .unwrap();
    assert_eq!(report.transcript_shards, 1);
    assert_eq!(report.metadata_entries, 2);

    fs::write(dataset.join(LABELS_FILE), "0\n1\n").unwrap();
    let records = load_dataset(&dataset).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].text, "Poseł Ewa Lis: Dziękuję.");
    assert_eq!(records[1].metadata["metadata"][0]["club"], "Lewica");
}
