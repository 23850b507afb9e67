//! Integration tests for the search indexer.

mod common;

use common::*;
use mlboard_core::search::{SearchConfig, SearchIndex, SearchRecord};
use mlboard_core::store::DataStore;

fn seeded_store() -> DataStore {
    let mut store = DataStore::new();

    let sweep_runs: Vec<_> = (1..=15)
        .map(|i| iteration(&format!("it-{i}"), &format!("sweep-run-{i:02}")))
        .collect();
    let other_run = iteration("it-other", "final-eval");

    let _ = store.set_projects(vec![
        project(
            "proj-1",
            "sweep alpha",
            vec![experiment("exp-1", "lr sweep", sweep_runs)],
        ),
        project(
            "proj-2",
            "sweep beta",
            vec![experiment("exp-2", "wd sweep", vec![other_run])],
        ),
        project("proj-3", "sweep gamma", vec![]),
    ]);
    let _ = store.set_datasets(vec![dataset("ds-1", "imagenet-mini")]);
    let _ = store.set_models(vec![model("model-1", "resnet-classifier")]);
    store
}

#[test]
fn index_flattens_graph_in_source_order() {
    let store = seeded_store();
    let index = SearchIndex::build(&store);
    let records = index.records();

    // Per project: experiment first, then its iterations, then the project
    // record; datasets and models trail the projects.
    assert!(matches!(records[0], SearchRecord::Experiment(_)));
    assert!(matches!(records[1], SearchRecord::Iteration(_)));
    assert!(matches!(records[16], SearchRecord::Project(_)));
    assert!(matches!(records.last().unwrap(), SearchRecord::Model(_)));

    let SearchRecord::Project(project_hit) = &records[16] else {
        panic!("expected project record");
    };
    assert_eq!(project_hit.title, "sweep alpha");
    assert_eq!(project_hit.experiments_count, 1);
    assert_eq!(project_hit.iterations_count, 15);
}

#[test]
fn empty_query_returns_everything_grouped() {
    let store = seeded_store();
    let index = SearchIndex::build(&store);

    let results = index.query("", &SearchConfig::default());
    assert_eq!(results.projects.len(), 3);
    assert_eq!(results.experiments.len(), 2);
    // Source order, capped at the group limit.
    assert_eq!(results.iterations.len(), 10);
    assert_eq!(results.iterations[0].iteration_name, "sweep-run-01");
    assert_eq!(results.datasets.len(), 1);
    assert_eq!(results.models.len(), 1);
}

#[test]
fn matching_groups_are_capped_at_limit() {
    let store = seeded_store();
    let index = SearchIndex::build(&store);

    // "sweep" matches all 15 sweep iterations and all 3 projects.
    let results = index.query("sweep", &SearchConfig::default());
    assert_eq!(results.iterations.len(), 10);
    assert_eq!(results.projects.len(), 3);
    assert!(results.datasets.is_empty());
}

#[test]
fn results_rank_by_match_score() {
    let mut store = DataStore::new();
    let runs = vec![
        iteration("it-1", "checkpoint-sweep-aux"),
        iteration("it-2", "mnist"),
        iteration("it-3", "run-mnist-final"),
    ];
    let _ = store.set_projects(vec![project(
        "proj-1",
        "digits",
        vec![experiment("exp-1", "all", runs)],
    )]);

    let index = SearchIndex::build(&store);
    let results = index.query("mnist", &SearchConfig::default());

    assert_eq!(results.iterations.len(), 2);
    // The exact name outranks the longer one containing it.
    assert_eq!(results.iterations[0].iteration_name, "mnist");
    assert_eq!(results.iterations[1].iteration_name, "run-mnist-final");
}

#[test]
fn threshold_filters_weak_matches() {
    let store = seeded_store();
    let index = SearchIndex::build(&store);

    let strict = SearchConfig {
        score_threshold: i64::MAX,
        group_limit: 10,
    };
    let results = index.query("sweep", &strict);
    assert!(results.projects.is_empty());
    assert!(results.iterations.is_empty());
}

#[test]
fn unmatched_query_returns_empty_groups() {
    let store = seeded_store();
    let index = SearchIndex::build(&store);

    let results = index.query("zzzzqqqq", &SearchConfig::default());
    assert!(results.projects.is_empty());
    assert!(results.experiments.is_empty());
    assert!(results.iterations.is_empty());
    assert!(results.datasets.is_empty());
    assert!(results.models.is_empty());
}

#[test]
fn models_match_on_source_iteration_name() {
    let mut store = DataStore::new();
    let mut m = model("model-1", "prod-classifier");
    m.iteration = Some(iteration("it-9", "golden-run"));
    let _ = store.set_models(vec![m]);

    let index = SearchIndex::build(&store);
    let results = index.query("golden", &SearchConfig::default());
    assert_eq!(results.models.len(), 1);
    assert_eq!(results.models[0].model_name, "prod-classifier");
}

#[test]
fn rebuild_reflects_store_changes() {
    let mut store = seeded_store();
    let before = SearchIndex::build(&store);
    assert_eq!(before.query("gamma", &SearchConfig::default()).projects.len(), 1);

    let _ = store.delete_project("proj-3");
    let after = SearchIndex::build(&store);
    assert!(after.query("gamma", &SearchConfig::default()).projects.is_empty());
}
