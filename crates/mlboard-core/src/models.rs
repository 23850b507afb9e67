//! Data models for mlboard-core.
//!
//! These mirror the JSON shapes the dashboard backend delivers. The store
//! owns the deserialized graph; everything else reads it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Insertion-ordered scalar map used for iteration parameters and metrics.
///
/// Document order matters downstream: compare-view diff tables list keys in
/// the order they were first encountered.
pub type ScalarMap = serde_json::Map<String, Value>;

// ─── Projects ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    NotStarted,
    InProgress,
    Completed,
}

impl ProjectStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ProjectStatus::NotStarted => "not_started",
            ProjectStatus::InProgress => "in_progress",
            ProjectStatus::Completed => "completed",
        }
    }
}

impl std::fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Top-level container: a project owns its experiments outright.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status: ProjectStatus,
    pub archived: bool,
    pub pinned: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub experiments: Vec<Experiment>,
}

// ─── Experiments and iterations ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Parameter,
    Metric,
}

/// Usage-count entry in an experiment's `columns_metadata`.
///
/// `count` equals the number of iterations in the experiment currently
/// carrying the column's key; zero-count entries are removed outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMeta {
    #[serde(rename = "type")]
    pub kind: ColumnKind,
    pub count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Experiment {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub iterations: Vec<Iteration>,
    #[serde(default)]
    pub columns_metadata: HashMap<String, ColumnMeta>,
    /// Session-scoped selection flag; never sent to or read from the wire.
    #[serde(skip)]
    pub checked: bool,
}

/// Dataset reference recorded on an iteration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IterationDataset {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub version: String,
}

/// A rendered chart image logged by a run, base64-encoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageChart {
    pub id: String,
    pub name: String,
    pub encoded_image: String,
    #[serde(default)]
    pub comparable: bool,
}

/// One recorded training/evaluation run.
///
/// `project_id`/`experiment_id` and the matching name fields are denormalized
/// back-references for lookup and linking, not ownership.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Iteration {
    pub id: String,
    pub iteration_name: String,
    #[serde(default)]
    pub parameters: ScalarMap,
    #[serde(default)]
    pub metrics: ScalarMap,
    #[serde(default)]
    pub path_to_model: String,
    #[serde(default)]
    pub user_name: String,
    pub dataset: Option<IterationDataset>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub project_id: String,
    #[serde(default)]
    pub project_title: String,
    pub experiment_id: String,
    #[serde(default)]
    pub experiment_name: String,
    #[serde(default)]
    pub interactive_charts: Vec<Chart>,
    #[serde(default)]
    pub image_charts: Vec<ImageChart>,
    pub assigned_monitored_model_id: Option<String>,
    pub assigned_monitored_model_name: Option<String>,
}

// ─── Custom charts ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartType {
    Line,
    Bar,
    Pie,
    Scatter,
    Boxplot,
}

impl std::fmt::Display for ChartType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChartType::Line => write!(f, "line"),
            ChartType::Bar => write!(f, "bar"),
            ChartType::Pie => write!(f, "pie"),
            ChartType::Scatter => write!(f, "scatter"),
            ChartType::Boxplot => write!(f, "boxplot"),
        }
    }
}

/// A single-run custom chart exactly as logged by the run.
///
/// `x_data`/`y_data` hold one or more arrays; see the series module for the
/// two supported pairings (shared x-axis vs per-series x-axis).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chart {
    pub id: String,
    pub chart_type: ChartType,
    pub name: String,
    #[serde(default)]
    pub chart_title: String,
    #[serde(default)]
    pub chart_subtitle: String,
    pub x_data: Vec<Vec<Value>>,
    pub y_data: Vec<Vec<Value>>,
    pub y_data_names: Option<Vec<String>>,
    #[serde(default)]
    pub x_label: String,
    #[serde(default)]
    pub y_label: String,
    pub x_min: Option<f64>,
    pub x_max: Option<f64>,
    pub y_min: Option<f64>,
    pub y_max: Option<f64>,
    #[serde(default)]
    pub comparable: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ─── Datasets ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(rename = "_id")]
    pub id: String,
    pub dataset_name: String,
    #[serde(default)]
    pub path_to_dataset: String,
    #[serde(default)]
    pub dataset_description: String,
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub version: String,
    pub archived: bool,
    pub pinned: bool,
    /// Iteration ids linked to this dataset, keyed by dataset version.
    #[serde(default)]
    pub linked_iterations: ScalarMap,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ─── Models and monitoring ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelStatus {
    Active,
    Idle,
    Archived,
}

impl std::fmt::Display for ModelStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelStatus::Active => write!(f, "active"),
            ModelStatus::Idle => write!(f, "idle"),
            ModelStatus::Archived => write!(f, "archived"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitoringChartType {
    Histogram,
    Countplot,
    Scatter,
    ScatterWithHistograms,
    Timeseries,
    RegressionMetrics,
    ClassificationMetrics,
    ConfusionMatrix,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BinMethod {
    SquareRoot,
    Sturges,
    FreedmanDiaconis,
    Scott,
    FixedNumber,
}

/// Chart definition attached to a monitored model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringChart {
    pub id: String,
    pub monitored_model_id: String,
    pub chart_type: MonitoringChartType,
    pub x_axis_column: Option<String>,
    pub y_axis_columns: Option<Vec<String>>,
    pub bin_method: Option<BinMethod>,
    pub bin_number: Option<usize>,
    pub metrics: Option<Vec<String>>,
}

/// One prediction served by a monitored model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub id: String,
    pub prediction_date: DateTime<Utc>,
    #[serde(default)]
    pub predicted_by: String,
    pub input_data: Option<Value>,
    pub prediction: f64,
    /// Ground truth, filled in after the fact; metrics skip predictions
    /// without it.
    pub actual: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Model {
    #[serde(rename = "_id")]
    pub id: String,
    pub model_name: String,
    #[serde(default)]
    pub model_description: String,
    pub model_status: ModelStatus,
    pub pinned: bool,
    /// Snapshot of the iteration this model was created from, if any.
    pub iteration: Option<Iteration>,
    pub ml_model: Option<String>,
    #[serde(default)]
    pub predictions_data: Vec<Prediction>,
    #[serde(default)]
    pub interactive_charts: Vec<MonitoringChart>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
