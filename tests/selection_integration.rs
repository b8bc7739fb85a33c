//! End-to-end selection over identity tables on disk.

use std::collections::HashSet;
use std::fs;
use std::io::Write;

use seqpicker::export::{read_report, write_report, write_representatives};
use seqpicker::identity::{fraction_identity, IdentityTableParser, SimilarityFunction};
use seqpicker::objective::{BuiltinObjective, FacilityLocation, MixtureObjective, Redundancy};
use seqpicker::pipeline::{SelectionConfig, SelectionRunner};
use seqpicker::{select, IdentityError, SelectionError, SelectionOptions, StopReason};

const IDENTITY_MATRIX: &str = "\
# p1              p2              %id     nid   denomid  %match  nmatch  denommatch
seq1             seq2             100.0   62    62       100.0   62      62
seq1             seq3             98.4    61    62       98.4    61      62
seq1             seq8             96.8    60    62       96.8    60      62
seq2             seq3             98.4    61    62       98.4    61      62
seq3             seq8             95.2    59    62       95.2    59      62
seq4             seq5             98.4    61    62       98.4    61      62
seq4             seq10            96.8    60    62       96.8    60      62
seq6             seq7             100.0   62    62       100.0   62      62
seq8             seq9             98.4    61    62       98.4    61      62";

fn identity_file(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(content.as_bytes()).expect("write identities");
    file
}

fn sims() -> Vec<&'static dyn SimilarityFunction> {
    let sim: &'static dyn SimilarityFunction = &fraction_identity;
    vec![sim, sim]
}

#[test]
fn test_parse_identity_matrix() {
    let file = identity_file(IDENTITY_MATRIX);
    let db = IdentityTableParser::new()
        .parse_file(file.path())
        .expect("parses");

    assert_eq!(db.len(), 10);
    let record = db.neighbor("seq1", "seq2").expect("edge exists");
    assert_eq!(record.pct_identity, 100.0);
    assert!(db.in_neighbors_of("seq2").any(|(id, _)| id == "seq1"));
}

#[test]
fn test_select_representatives_for_sizes_and_weights() {
    let file = identity_file(IDENTITY_MATRIX);
    let db = IdentityTableParser::new()
        .parse_file(file.path())
        .expect("parses");

    for max_size in [3, 5] {
        let objective = BuiltinObjective::default_mixture(0.5).expect("valid mixture");
        let reps = select(
            &db,
            &objective,
            &sims(),
            SelectionOptions::new().with_max_size(max_size),
        )
        .expect("selects");

        assert!(reps.len() <= max_size);
        assert_eq!(reps.iter().collect::<HashSet<_>>().len(), reps.len());
        assert!(reps.iter().all(|id| db.contains(id)));
    }

    for weight in [0.0, 0.5, 1.0] {
        let objective = MixtureObjective::builder()
            .objective(FacilityLocation::new(), weight)
            .objective(Redundancy::new(), 1.0 - weight)
            .build()
            .expect("valid mixture");
        let reps = select(&db, &objective, &sims(), SelectionOptions::new().with_max_size(3))
            .expect("selects");
        assert!(reps.len() <= 3);
    }
}

#[test]
fn test_coverage_heavy_mixture_spreads_over_clusters() {
    let file = identity_file(IDENTITY_MATRIX);
    let report = SelectionRunner::new(
        SelectionConfig::default()
            .with_max_size(3)
            .with_mixture_weight(0.5),
    )
    .expect("valid config")
    .run(file.path())
    .expect("run succeeds");

    // The three identity clusters each get one representative.
    let clusters = [
        &["seq1", "seq2", "seq3", "seq8", "seq9"][..],
        &["seq4", "seq5", "seq10"][..],
        &["seq6", "seq7"][..],
    ];
    for cluster in clusters {
        let hits = report
            .selected
            .iter()
            .filter(|id| cluster.contains(&id.as_str()))
            .count();
        assert_eq!(hits, 1, "cluster {:?} in {:?}", cluster, report.selected);
    }
}

#[test]
fn test_error_handling() {
    let file = identity_file(IDENTITY_MATRIX);
    let db = IdentityTableParser::new()
        .parse_file(file.path())
        .expect("parses");
    let objective = BuiltinObjective::default_mixture(0.5).expect("valid mixture");

    let result = select(&db, &objective, &sims(), SelectionOptions::new().with_max_size(0));
    assert!(matches!(result, Err(SelectionError::InvalidConfiguration(_))));

    let empty = seqpicker::Database::new();
    let result = select(&empty, &objective, &sims(), SelectionOptions::new().with_max_size(3));
    assert!(matches!(result, Err(SelectionError::InvalidState(_))));

    let result = MixtureObjective::new(vec![BuiltinObjective::FacilityLocation.create()], vec![0.5, 0.5]);
    assert!(matches!(result, Err(SelectionError::InvalidConfiguration(_))));
}

#[test]
fn test_missing_and_empty_inputs() {
    let parser = IdentityTableParser::new();

    let result = parser.parse_file("/nonexistent/identities.txt");
    assert!(matches!(result, Err(IdentityError::InputNotFound(_))));

    let file = identity_file("# only a header\n\n");
    let result = parser.parse_file(file.path());
    assert!(matches!(result, Err(IdentityError::InputEmpty(_))));
}

#[test]
fn test_run_and_export() {
    let file = identity_file(IDENTITY_MATRIX);
    let out = tempfile::tempdir().expect("temp dir");
    let reps_path = out.path().join("results").join("reps.txt");
    let report_path = out.path().join("results").join("report.json");

    let report = SelectionRunner::new(SelectionConfig::default().with_max_size(4))
        .expect("valid config")
        .run(file.path())
        .expect("run succeeds");

    write_representatives(&report.selected, &reps_path).expect("writes list");
    write_report(&report, &report_path).expect("writes report");

    let content = fs::read_to_string(&reps_path).expect("list exists");
    assert!(!content.ends_with('\n'));
    assert_eq!(content.lines().count(), 4);
    assert_eq!(content.lines().collect::<Vec<_>>(), report.selected);

    let loaded = read_report(&report_path).expect("report exists");
    assert_eq!(loaded.selected, report.selected);
    assert_eq!(loaded.stop_reason, StopReason::TargetReached);
}

#[test]
fn test_unbounded_run_orders_every_sequence() {
    let file = identity_file(IDENTITY_MATRIX);
    let report = SelectionRunner::new(SelectionConfig::default())
        .expect("valid config")
        .run(file.path())
        .expect("run succeeds");

    assert_eq!(report.selected.len(), 10);
    assert_eq!(report.stop_reason, StopReason::Exhausted);
}

#[test]
fn test_approximate_run_respects_target() {
    let file = identity_file(IDENTITY_MATRIX);
    let report = SelectionRunner::new(
        SelectionConfig::default()
            .with_max_size(6)
            .with_approx_ratio(1.2),
    )
    .expect("valid config")
    .run(file.path())
    .expect("run succeeds");

    assert_eq!(report.selected.len(), 6);
    assert_eq!(
        report.selected.iter().collect::<HashSet<_>>().len(),
        report.selected.len()
    );
}
