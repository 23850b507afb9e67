//! The authoritative in-memory entity graph and its mutation surface.
//!
//! Every mutation resolves its target path first and falls back to a no-op
//! when any id along the path is missing — optimistic updates may race a
//! concurrent deletion, so an unresolved id is normal, not an error.
//! Subscribers are notified only when the graph actually changed.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::models::{
    Dataset, Experiment, Iteration, Model, MonitoringChart, Prediction, Project,
};

/// Which top-level collection a mutation touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEvent {
    Projects,
    Datasets,
    Models,
}

/// Outcome of a mutation: whether the graph changed.
///
/// A `NoOp` bumps no revision and wakes no subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum StoreChange {
    Changed,
    NoOp,
}

impl StoreChange {
    pub fn changed(self) -> bool {
        matches!(self, StoreChange::Changed)
    }
}

type Listener = Box<dyn FnMut(StoreEvent)>;

/// Process-wide entity graph: projects (owning experiments and iterations),
/// datasets, and monitored models.
#[derive(Default)]
pub struct DataStore {
    projects: Vec<Project>,
    datasets: Vec<Dataset>,
    models: Vec<Model>,
    revision: u64,
    listeners: Vec<Listener>,
}

impl DataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a change listener. Called once per mutation that changed the
    /// graph, never for no-ops.
    pub fn subscribe(&mut self, listener: impl FnMut(StoreEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Monotonic counter bumped on every effective mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn emit(&mut self, event: StoreEvent) -> StoreChange {
        self.revision += 1;
        for listener in &mut self.listeners {
            listener(event);
        }
        StoreChange::Changed
    }

    // ─── Read access ─────────────────────────────────────────────────────────

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn datasets(&self) -> &[Dataset] {
        &self.datasets
    }

    pub fn models(&self) -> &[Model] {
        &self.models
    }

    pub fn project(&self, project_id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == project_id)
    }

    pub fn dataset(&self, dataset_id: &str) -> Option<&Dataset> {
        self.datasets.iter().find(|d| d.id == dataset_id)
    }

    pub fn model(&self, model_id: &str) -> Option<&Model> {
        self.models.iter().find(|m| m.id == model_id)
    }

    fn project_mut(&mut self, project_id: &str) -> Option<&mut Project> {
        self.projects.iter_mut().find(|p| p.id == project_id)
    }

    fn model_mut(&mut self, model_id: &str) -> Option<&mut Model> {
        self.models.iter_mut().find(|m| m.id == model_id)
    }

    /// Resolve a compare selection (`experiment_id -> iteration ids`) against
    /// a project. Experiments come back in project order, iterations in
    /// experiment order; unresolved ids are dropped.
    pub fn select_iterations(
        &self,
        project_id: &str,
        selection: &HashMap<String, Vec<String>>,
    ) -> Vec<&Iteration> {
        let Some(project) = self.project(project_id) else {
            return Vec::new();
        };
        project
            .experiments
            .iter()
            .filter(|e| selection.contains_key(&e.id))
            .flat_map(|e| {
                let ids = &selection[&e.id];
                e.iterations
                    .iter()
                    .filter(move |it| ids.contains(&it.id))
            })
            .collect()
    }

    // ─── Top-level collections ───────────────────────────────────────────────

    pub fn set_projects(&mut self, projects: Vec<Project>) -> StoreChange {
        info!(count = projects.len(), "replacing project collection");
        self.projects = projects;
        self.emit(StoreEvent::Projects)
    }

    pub fn set_datasets(&mut self, datasets: Vec<Dataset>) -> StoreChange {
        info!(count = datasets.len(), "replacing dataset collection");
        self.datasets = datasets;
        self.emit(StoreEvent::Datasets)
    }

    pub fn set_models(&mut self, models: Vec<Model>) -> StoreChange {
        info!(count = models.len(), "replacing model collection");
        self.models = models;
        self.emit(StoreEvent::Models)
    }

    /// Replace all three collections after a full reload.
    pub fn set_all(
        &mut self,
        projects: Vec<Project>,
        models: Vec<Model>,
        datasets: Vec<Dataset>,
    ) -> StoreChange {
        let _ = self.set_projects(projects);
        let _ = self.set_models(models);
        self.set_datasets(datasets)
    }

    pub fn add_project(&mut self, project: Project) -> StoreChange {
        debug!(project_id = %project.id, "adding project");
        self.projects.push(project);
        self.emit(StoreEvent::Projects)
    }

    pub fn update_project(&mut self, project_id: &str, project: Project) -> StoreChange {
        match self.projects.iter_mut().find(|p| p.id == project_id) {
            Some(slot) => {
                *slot = project;
                self.emit(StoreEvent::Projects)
            }
            None => {
                debug!(project_id, "update_project: id not found, no-op");
                StoreChange::NoOp
            }
        }
    }

    pub fn delete_project(&mut self, project_id: &str) -> StoreChange {
        let before = self.projects.len();
        self.projects.retain(|p| p.id != project_id);
        if self.projects.len() == before {
            debug!(project_id, "delete_project: id not found, no-op");
            return StoreChange::NoOp;
        }
        self.emit(StoreEvent::Projects)
    }

    pub fn add_dataset(&mut self, dataset: Dataset) -> StoreChange {
        debug!(dataset_id = %dataset.id, "adding dataset");
        self.datasets.push(dataset);
        self.emit(StoreEvent::Datasets)
    }

    pub fn update_dataset(&mut self, dataset_id: &str, dataset: Dataset) -> StoreChange {
        match self.datasets.iter_mut().find(|d| d.id == dataset_id) {
            Some(slot) => {
                *slot = dataset;
                self.emit(StoreEvent::Datasets)
            }
            None => {
                debug!(dataset_id, "update_dataset: id not found, no-op");
                StoreChange::NoOp
            }
        }
    }

    pub fn delete_dataset(&mut self, dataset_id: &str) -> StoreChange {
        let before = self.datasets.len();
        self.datasets.retain(|d| d.id != dataset_id);
        if self.datasets.len() == before {
            debug!(dataset_id, "delete_dataset: id not found, no-op");
            return StoreChange::NoOp;
        }
        self.emit(StoreEvent::Datasets)
    }

    pub fn add_model(&mut self, model: Model) -> StoreChange {
        debug!(model_id = %model.id, "adding model");
        self.models.push(model);
        self.emit(StoreEvent::Models)
    }

    pub fn update_model(&mut self, model_id: &str, model: Model) -> StoreChange {
        match self.models.iter_mut().find(|m| m.id == model_id) {
            Some(slot) => {
                *slot = model;
                self.emit(StoreEvent::Models)
            }
            None => {
                debug!(model_id, "update_model: id not found, no-op");
                StoreChange::NoOp
            }
        }
    }

    pub fn delete_model(&mut self, model_id: &str) -> StoreChange {
        let before = self.models.len();
        self.models.retain(|m| m.id != model_id);
        if self.models.len() == before {
            debug!(model_id, "delete_model: id not found, no-op");
            return StoreChange::NoOp;
        }
        self.emit(StoreEvent::Models)
    }

    // ─── Experiments ─────────────────────────────────────────────────────────

    pub fn add_experiment(&mut self, project_id: &str, experiment: Experiment) -> StoreChange {
        match self.project_mut(project_id) {
            Some(project) => {
                project.experiments.push(experiment);
                self.emit(StoreEvent::Projects)
            }
            None => {
                debug!(project_id, "add_experiment: project not found, no-op");
                StoreChange::NoOp
            }
        }
    }

    pub fn update_experiment(
        &mut self,
        project_id: &str,
        experiment_id: &str,
        experiment: Experiment,
    ) -> StoreChange {
        let slot = self
            .project_mut(project_id)
            .and_then(|p| p.experiments.iter_mut().find(|e| e.id == experiment_id));
        match slot {
            Some(slot) => {
                *slot = experiment;
                self.emit(StoreEvent::Projects)
            }
            None => {
                debug!(project_id, experiment_id, "update_experiment: path not found, no-op");
                StoreChange::NoOp
            }
        }
    }

    pub fn delete_experiment(&mut self, project_id: &str, experiment_id: &str) -> StoreChange {
        let Some(project) = self.project_mut(project_id) else {
            debug!(project_id, "delete_experiment: project not found, no-op");
            return StoreChange::NoOp;
        };
        let before = project.experiments.len();
        project.experiments.retain(|e| e.id != experiment_id);
        if project.experiments.len() == before {
            debug!(project_id, experiment_id, "delete_experiment: id not found, no-op");
            return StoreChange::NoOp;
        }
        self.emit(StoreEvent::Projects)
    }

    /// Reset the transient experiment selection to its default: only the
    /// first experiment checked. Called when the active project is reloaded.
    pub fn reset_experiment_selection(&mut self, project_id: &str) -> StoreChange {
        match self.project_mut(project_id) {
            Some(project) => {
                for (i, experiment) in project.experiments.iter_mut().enumerate() {
                    experiment.checked = i == 0;
                }
                self.emit(StoreEvent::Projects)
            }
            None => {
                debug!(project_id, "reset_experiment_selection: project not found, no-op");
                StoreChange::NoOp
            }
        }
    }

    // ─── Iterations ──────────────────────────────────────────────────────────

    pub fn update_iteration(
        &mut self,
        project_id: &str,
        experiment_id: &str,
        iteration_id: &str,
        iteration: Iteration,
    ) -> StoreChange {
        let slot = self
            .project_mut(project_id)
            .and_then(|p| p.experiments.iter_mut().find(|e| e.id == experiment_id))
            .and_then(|e| e.iterations.iter_mut().find(|it| it.id == iteration_id));
        match slot {
            Some(slot) => {
                *slot = iteration;
                self.emit(StoreEvent::Projects)
            }
            None => {
                debug!(
                    project_id,
                    experiment_id, iteration_id, "update_iteration: path not found, no-op"
                );
                StoreChange::NoOp
            }
        }
    }

    /// Remove the listed iterations from each named experiment and keep the
    /// experiment's `columns_metadata` usage counts consistent: every
    /// parameter/metric key a removed iteration held is decremented, and
    /// entries reaching zero are deleted.
    ///
    /// Removal is atomic per experiment — an experiment id that does not
    /// resolve leaves that experiment untouched; the others are still
    /// processed.
    pub fn delete_iterations(
        &mut self,
        project_id: &str,
        to_delete: &HashMap<String, Vec<String>>,
    ) -> StoreChange {
        let Some(project) = self.project_mut(project_id) else {
            debug!(project_id, "delete_iterations: project not found, no-op");
            return StoreChange::NoOp;
        };

        let mut removed_total = 0usize;
        for (experiment_id, iteration_ids) in to_delete {
            let Some(experiment) = project
                .experiments
                .iter_mut()
                .find(|e| &e.id == experiment_id)
            else {
                debug!(experiment_id = %experiment_id, "delete_iterations: experiment not found, skipped");
                continue;
            };

            let (removed, kept): (Vec<Iteration>, Vec<Iteration>) = experiment
                .iterations
                .drain(..)
                .partition(|it| iteration_ids.contains(&it.id));
            experiment.iterations = kept;

            for iteration in &removed {
                let keys = iteration
                    .metrics
                    .keys()
                    .chain(iteration.parameters.keys());
                for key in keys {
                    if let Some(meta) = experiment.columns_metadata.get_mut(key) {
                        meta.count = meta.count.saturating_sub(1);
                        if meta.count == 0 {
                            experiment.columns_metadata.remove(key);
                        }
                    }
                }
            }
            removed_total += removed.len();
        }

        if removed_total == 0 {
            debug!(project_id, "delete_iterations: nothing matched, no-op");
            return StoreChange::NoOp;
        }
        info!(project_id, removed = removed_total, "deleted iterations");
        self.emit(StoreEvent::Projects)
    }

    // ─── Monitoring charts and predictions ───────────────────────────────────

    pub fn update_monitoring_chart(
        &mut self,
        model_id: &str,
        chart_id: &str,
        chart: MonitoringChart,
    ) -> StoreChange {
        let slot = self
            .model_mut(model_id)
            .and_then(|m| m.interactive_charts.iter_mut().find(|c| c.id == chart_id));
        match slot {
            Some(slot) => {
                *slot = chart;
                self.emit(StoreEvent::Models)
            }
            None => {
                debug!(model_id, chart_id, "update_monitoring_chart: path not found, no-op");
                StoreChange::NoOp
            }
        }
    }

    pub fn delete_monitoring_chart(&mut self, model_id: &str, chart_id: &str) -> StoreChange {
        let Some(model) = self.model_mut(model_id) else {
            debug!(model_id, "delete_monitoring_chart: model not found, no-op");
            return StoreChange::NoOp;
        };
        let before = model.interactive_charts.len();
        model.interactive_charts.retain(|c| c.id != chart_id);
        if model.interactive_charts.len() == before {
            debug!(model_id, chart_id, "delete_monitoring_chart: id not found, no-op");
            return StoreChange::NoOp;
        }
        self.emit(StoreEvent::Models)
    }

    pub fn update_prediction(
        &mut self,
        model_id: &str,
        prediction_id: &str,
        prediction: Prediction,
    ) -> StoreChange {
        let slot = self
            .model_mut(model_id)
            .and_then(|m| m.predictions_data.iter_mut().find(|p| p.id == prediction_id));
        match slot {
            Some(slot) => {
                *slot = prediction;
                self.emit(StoreEvent::Models)
            }
            None => {
                debug!(model_id, prediction_id, "update_prediction: path not found, no-op");
                StoreChange::NoOp
            }
        }
    }
}
