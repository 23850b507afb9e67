//! Error types for mlboard-core.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MlboardError {
    #[error("comparison requires at least 2 iterations, got {0}")]
    NotEnoughIterations(usize),

    #[error("no selected iteration contains axis data for chart {0:?}")]
    NoAxisData(String),

    #[error("x/y data shape mismatch: {x_arrays} x-arrays vs {y_arrays} y-arrays")]
    ShapeMismatch { x_arrays: usize, y_arrays: usize },

    #[error("chart type {0:?} cannot be combined across runs")]
    NotCombinable(String),

    #[error("chart group {0:?} mixes chart types")]
    MixedChartTypes(String),

    #[error("bar charts in group {0:?} differ in x-axis data")]
    BarAxisMismatch(String),
}

pub type Result<T> = std::result::Result<T, MlboardError>;
