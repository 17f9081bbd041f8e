use thiserror::Error;

use crate::quote::QuoteError;

/// Everything that can abort a pipeline run. Nothing here is retried
/// automatically; the caller decides whether to fetch more history, shrink
/// the window or adjust hyperparameters.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("cannot normalize {observations} observations: {reason}")]
    DegenerateInput { observations: usize, reason: String },

    #[error("not enough history: {observations} values for window size {window_size}")]
    InsufficientHistory { observations: usize, window_size: usize },

    #[error("window has length {actual}, predictor expects {expected}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("training failed: {0}")]
    Training(#[from] TrainingFailure),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("observation source failed: {0}")]
    Source(#[from] QuoteError),
}

#[derive(Error, Debug)]
pub enum TrainingFailure {
    #[error("loss diverged to {loss} in epoch {epoch}")]
    Diverged { epoch: usize, loss: f32 },

    #[error("{0}")]
    InvalidConfiguration(String),

    #[error("predictor has not been trained")]
    NotTrained,

    #[error("tensor conversion: {0}")]
    Tensor(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
