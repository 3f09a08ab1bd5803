//! Corpus-driven classifier tests.
//!
//! Validates the deterministic tiers against golden expectations in
//! query_corpus.tsv and enforces a minimum deterministic coverage so the
//! rule tables cannot silently rot.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use parc_core::store::InMemoryStore;
use parc_core::{Intent, Pipeline, PipelineConfig};

#[derive(Debug)]
struct CorpusEntry {
    query: String,
    expected_intent: String,
    expected_source: String,
    line_num: usize,
}

fn parse_corpus() -> Vec<CorpusEntry> {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("query_corpus.tsv");

    let content = fs::read_to_string(&path).expect("failed to read query_corpus.tsv");

    let mut entries = Vec::new();
    for (line_idx, line) in content.lines().enumerate() {
        let line_num = line_idx + 1;
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line.starts_with("query\t") {
            continue;
        }

        let parts: Vec<&str> = line.split('\t').collect();
        assert!(
            parts.len() == 3,
            "line {}: expected 3 columns, got {}",
            line_num,
            parts.len()
        );

        entries.push(CorpusEntry {
            query: parts[0].to_string(),
            expected_intent: parts[1].to_string(),
            expected_source: parts[2].to_string(),
            line_num,
        });
    }

    entries
}

fn pipeline() -> Pipeline {
    Pipeline::new(
        PipelineConfig::default(),
        Arc::new(InMemoryStore::with_demo_data()),
        None,
        None,
    )
    .expect("pipeline builds")
}

#[test]
fn test_corpus_minimum_size() {
    let entries = parse_corpus();
    assert!(
        entries.len() >= 30,
        "corpus must have >= 30 entries, got {}",
        entries.len()
    );
}

#[test]
fn test_corpus_names_known_intents() {
    for entry in parse_corpus() {
        assert!(
            Intent::from_id(&entry.expected_intent).is_some(),
            "line {}: unknown intent {:?}",
            entry.line_num,
            entry.expected_intent
        );
    }
}

#[test]
fn test_corpus_deterministic_coverage() {
    let entries = parse_corpus();
    let total = entries.len();
    let deterministic = entries.iter().filter(|e| e.expected_source != "-").count();

    let coverage = (deterministic as f64 / total as f64) * 100.0;
    assert!(
        coverage >= 80.0,
        "deterministic coverage must be >= 80%, got {:.1}% ({}/{})",
        coverage,
        deterministic,
        total
    );
}

#[test]
fn test_corpus_classification() {
    let pipeline = pipeline();
    let mut failures = Vec::new();

    for entry in parse_corpus() {
        let result = pipeline.classify_only(&entry.query);
        if result.intent.to_string() != entry.expected_intent {
            failures.push(format!(
                "line {}: {:?} -> {} (expected {})",
                entry.line_num, entry.query, result.intent, entry.expected_intent
            ));
            continue;
        }
        if entry.expected_source != "-" && result.tier.to_string() != entry.expected_source {
            failures.push(format!(
                "line {}: {:?} classified via {} (expected {})",
                entry.line_num, entry.query, result.tier, entry.expected_source
            ));
        }
    }

    assert!(
        failures.is_empty(),
        "{} corpus mismatches:\n{}",
        failures.len(),
        failures.join("\n")
    );
}

#[test]
fn test_corpus_classification_is_deterministic() {
    let pipeline = pipeline();
    for entry in parse_corpus() {
        let a = pipeline.classify_only(&entry.query);
        let b = pipeline.classify_only(&entry.query);
        assert_eq!(a.intent, b.intent, "line {}", entry.line_num);
        assert_eq!(a.confidence, b.confidence, "line {}", entry.line_num);
        assert_eq!(a.tier, b.tier, "line {}", entry.line_num);
    }
}

#[test]
fn test_corpus_spot_checks() {
    let entries = parse_corpus();

    let warranty = entries
        .iter()
        .find(|e| e.query == "garantie de BC23")
        .expect("missing warranty query in corpus");
    assert_eq!(warranty.expected_intent, "warranty_details");
    assert_eq!(warranty.expected_source, "early_override");

    let pending = entries
        .iter()
        .find(|e| e.query == "combien de commandes en attente")
        .expect("missing pending-orders query in corpus");
    assert_eq!(pending.expected_intent, "count_pending_commands");

    let suppliers = entries
        .iter()
        .find(|e| e.query == "Liste des fournisseurs")
        .expect("missing supplier listing in corpus");
    assert_eq!(suppliers.expected_source, "phrase_boost");
}
