//! Flattened fuzzy search over the whole entity graph.
//!
//! The index is rebuilt from the store snapshot on any data change and holds
//! one tagged record per project, experiment, iteration, dataset, and model.
//! Lookup is approximate (typo-tolerant), score-ranked, grouped by kind, and
//! capped per group.

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use serde::Serialize;

use crate::models::{ModelStatus, ProjectStatus};
use crate::store::DataStore;

/// Entity kind discriminator carried by every indexed record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchKind {
    Project,
    Experiment,
    Iteration,
    Dataset,
    Model,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectHit {
    pub id: String,
    pub title: String,
    pub status: ProjectStatus,
    pub experiments_count: usize,
    pub iterations_count: usize,
    pub archived: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExperimentHit {
    pub id: String,
    pub name: String,
    pub project_id: String,
    pub project_title: String,
    pub iterations_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IterationHit {
    pub id: String,
    pub iteration_name: String,
    pub experiment_id: String,
    pub experiment_name: String,
    pub project_id: String,
    pub project_title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetHit {
    pub id: String,
    pub dataset_name: String,
    pub version: String,
    pub archived: bool,
    pub pinned: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelHit {
    pub id: String,
    pub model_name: String,
    pub model_status: ModelStatus,
    pub pinned: bool,
    /// Name of the iteration the model was created from, if any; matched
    /// alongside the model name.
    pub iteration_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SearchRecord {
    Project(ProjectHit),
    Experiment(ExperimentHit),
    Iteration(IterationHit),
    Dataset(DatasetHit),
    Model(ModelHit),
}

impl SearchRecord {
    pub fn kind(&self) -> SearchKind {
        match self {
            SearchRecord::Project(_) => SearchKind::Project,
            SearchRecord::Experiment(_) => SearchKind::Experiment,
            SearchRecord::Iteration(_) => SearchKind::Iteration,
            SearchRecord::Dataset(_) => SearchKind::Dataset,
            SearchRecord::Model(_) => SearchKind::Model,
        }
    }

    /// The kind's matchable field values, status and parent names included.
    fn match_fields(&self) -> Vec<&str> {
        match self {
            SearchRecord::Project(p) => vec![p.title.as_str(), p.status.as_str()],
            SearchRecord::Experiment(e) => {
                vec![e.name.as_str(), e.project_title.as_str()]
            }
            SearchRecord::Iteration(it) => {
                vec![it.iteration_name.as_str(), it.project_title.as_str()]
            }
            SearchRecord::Dataset(d) => vec![d.dataset_name.as_str()],
            SearchRecord::Model(m) => {
                let mut fields = vec![m.model_name.as_str()];
                if let Some(name) = &m.iteration_name {
                    fields.push(name.as_str());
                }
                fields
            }
        }
    }
}

/// Lookup knobs: minimum fuzzy score to accept and per-kind result cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchConfig {
    pub score_threshold: i64,
    pub group_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            score_threshold: 0,
            group_limit: 10,
        }
    }
}

/// Query results grouped by kind, capped per group, rank order preserved
/// within each group.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchResults {
    pub projects: Vec<ProjectHit>,
    pub experiments: Vec<ExperimentHit>,
    pub iterations: Vec<IterationHit>,
    pub datasets: Vec<DatasetHit>,
    pub models: Vec<ModelHit>,
}

/// Flattened, tagged snapshot of the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchIndex {
    records: Vec<SearchRecord>,
}

impl SearchIndex {
    /// Flatten the current graph into the index. Per project: experiment
    /// records first, each followed by its iteration records, then the
    /// project record itself; datasets and models follow in source order.
    pub fn build(store: &DataStore) -> Self {
        let mut records = Vec::new();

        for project in store.projects() {
            let mut iterations_total = 0;
            for experiment in &project.experiments {
                records.push(SearchRecord::Experiment(ExperimentHit {
                    id: experiment.id.clone(),
                    name: experiment.name.clone(),
                    project_id: project.id.clone(),
                    project_title: project.title.clone(),
                    iterations_count: experiment.iterations.len(),
                }));
                iterations_total += experiment.iterations.len();
                for iteration in &experiment.iterations {
                    records.push(SearchRecord::Iteration(IterationHit {
                        id: iteration.id.clone(),
                        iteration_name: iteration.iteration_name.clone(),
                        experiment_id: experiment.id.clone(),
                        experiment_name: experiment.name.clone(),
                        project_id: project.id.clone(),
                        project_title: project.title.clone(),
                    }));
                }
            }
            records.push(SearchRecord::Project(ProjectHit {
                id: project.id.clone(),
                title: project.title.clone(),
                status: project.status,
                experiments_count: project.experiments.len(),
                iterations_count: iterations_total,
                archived: project.archived,
            }));
        }

        for dataset in store.datasets() {
            records.push(SearchRecord::Dataset(DatasetHit {
                id: dataset.id.clone(),
                dataset_name: dataset.dataset_name.clone(),
                version: dataset.version.clone(),
                archived: dataset.archived,
                pinned: dataset.pinned,
            }));
        }

        for model in store.models() {
            records.push(SearchRecord::Model(ModelHit {
                id: model.id.clone(),
                model_name: model.model_name.clone(),
                model_status: model.model_status,
                pinned: model.pinned,
                iteration_name: model
                    .iteration
                    .as_ref()
                    .map(|it| it.iteration_name.clone()),
            }));
        }

        Self { records }
    }

    pub fn records(&self) -> &[SearchRecord] {
        &self.records
    }

    /// Run a lookup. An empty query returns everything grouped in source
    /// order; otherwise records are fuzzy-matched over their kind's field
    /// set, filtered by the score threshold, and ranked by score (stable on
    /// ties). Each group is capped at `group_limit`.
    pub fn query(&self, query: &str, config: &SearchConfig) -> SearchResults {
        let query = query.trim();
        if query.is_empty() {
            return self.group(self.records.iter(), config.group_limit);
        }

        let matcher = SkimMatcherV2::default();
        let mut scored: Vec<(i64, &SearchRecord)> = self
            .records
            .iter()
            .filter_map(|record| {
                record
                    .match_fields()
                    .iter()
                    .filter_map(|field| matcher.fuzzy_match(field, query))
                    .max()
                    .filter(|score| *score >= config.score_threshold)
                    .map(|score| (score, record))
            })
            .collect();
        scored.sort_by_key(|(score, _)| std::cmp::Reverse(*score));

        self.group(scored.into_iter().map(|(_, record)| record), config.group_limit)
    }

    fn group<'a>(
        &self,
        records: impl Iterator<Item = &'a SearchRecord>,
        limit: usize,
    ) -> SearchResults {
        let mut results = SearchResults::default();
        for record in records {
            match record {
                SearchRecord::Project(p) if results.projects.len() < limit => {
                    results.projects.push(p.clone());
                }
                SearchRecord::Experiment(e) if results.experiments.len() < limit => {
                    results.experiments.push(e.clone());
                }
                SearchRecord::Iteration(it) if results.iterations.len() < limit => {
                    results.iterations.push(it.clone());
                }
                SearchRecord::Dataset(d) if results.datasets.len() < limit => {
                    results.datasets.push(d.clone());
                }
                SearchRecord::Model(m) if results.models.len() < limit => {
                    results.models.push(m.clone());
                }
                _ => {}
            }
        }
        results
    }
}
