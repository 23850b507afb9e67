//! Pinned-first orderings for the top-level collections.
//!
//! Every ordering puts pinned entries ahead of unpinned ones, then applies
//! the selected method. Method codes match the query-string values the
//! dashboard persists.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Dataset, Model, Project};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortMethod {
    #[serde(rename = "AZ")]
    TitleAsc,
    #[serde(rename = "ZA")]
    TitleDesc,
    #[serde(rename = "UDESC")]
    UpdatedDesc,
    #[serde(rename = "UASC")]
    UpdatedAsc,
    #[serde(rename = "CDESC")]
    CreatedDesc,
    #[serde(rename = "CASC")]
    CreatedAsc,
}

fn ordered(
    pinned: (bool, bool),
    title: (&str, &str),
    updated: (DateTime<Utc>, DateTime<Utc>),
    created: (DateTime<Utc>, DateTime<Utc>),
    method: SortMethod,
) -> Ordering {
    match pinned {
        (true, false) => return Ordering::Less,
        (false, true) => return Ordering::Greater,
        _ => {}
    }
    match method {
        SortMethod::TitleAsc => title.0.cmp(title.1),
        SortMethod::TitleDesc => title.1.cmp(title.0),
        SortMethod::UpdatedDesc => updated.1.cmp(&updated.0),
        SortMethod::UpdatedAsc => updated.0.cmp(&updated.1),
        SortMethod::CreatedDesc => created.1.cmp(&created.0),
        SortMethod::CreatedAsc => created.0.cmp(&created.1),
    }
}

pub fn compare_projects(a: &Project, b: &Project, method: SortMethod) -> Ordering {
    ordered(
        (a.pinned, b.pinned),
        (&a.title, &b.title),
        (a.updated_at, b.updated_at),
        (a.created_at, b.created_at),
        method,
    )
}

pub fn compare_datasets(a: &Dataset, b: &Dataset, method: SortMethod) -> Ordering {
    ordered(
        (a.pinned, b.pinned),
        (&a.dataset_name, &b.dataset_name),
        (a.updated_at, b.updated_at),
        (a.created_at, b.created_at),
        method,
    )
}

pub fn compare_models(a: &Model, b: &Model, method: SortMethod) -> Ordering {
    ordered(
        (a.pinned, b.pinned),
        (&a.model_name, &b.model_name),
        (a.updated_at, b.updated_at),
        (a.created_at, b.created_at),
        method,
    )
}

pub fn sort_projects(projects: &mut [Project], method: SortMethod) {
    projects.sort_by(|a, b| compare_projects(a, b, method));
}

pub fn sort_datasets(datasets: &mut [Dataset], method: SortMethod) {
    datasets.sort_by(|a, b| compare_datasets(a, b, method));
}

pub fn sort_models(models: &mut [Model], method: SortMethod) {
    models.sort_by(|a, b| compare_models(a, b, method));
}
