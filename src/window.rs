use std::num::NonZeroUsize;

use crate::ModelFloat;

/// `window_size` consecutive normalized values and the value right after them.
#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    pub input: Vec<ModelFloat>,
    pub target: ModelFloat,
}

/// Slides a `window_size` frame over `series` one step at a time.
///
/// Windows come out in ascending start index, so the last one is the most
/// recent. A series of `len <= window_size` has no complete window and gives
/// an empty `Vec`; whether that is an error is up to the caller.
pub fn build_windows(series: &[ModelFloat], window_size: NonZeroUsize) -> Vec<Window> {
    let w = window_size.get();
    if series.len() <= w {
        return Vec::new();
    }
    series
        .windows(w + 1)
        .map(|frame| Window { input: frame[..w].to_vec(), target: frame[w] })
        .collect()
}

/// The trailing `window_size` values, i.e. the input for predicting the step
/// after the end of the series.
pub fn last_input(series: &[ModelFloat], window_size: NonZeroUsize) -> Option<&[ModelFloat]> {
    let w = window_size.get();
    series.len().checked_sub(w).map(|start| &series[start..])
}
