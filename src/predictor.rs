use crate::{error::{PipelineError, Result}, window::Window, ModelFloat};

/// Reported at the end of every training epoch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochProgress {
    /// 1-based.
    pub epoch: usize,
    pub epochs: usize,
    /// Mean loss over the epoch's batches.
    pub loss: f32,
}

/// A learning engine that maps a window of normalized values to the next
/// value. The pipeline talks to models only through this trait; trained state
/// lives inside the implementing value.
pub trait SequencePredictor {
    /// Input length `train` and `predict` accept.
    fn window_size(&self) -> usize;

    /// Runs `epochs` full passes over `windows`, calling `on_epoch` after each.
    fn train_with_progress(
        &mut self,
        windows: &[Window],
        epochs: usize,
        on_epoch: &mut dyn FnMut(EpochProgress),
    ) -> Result<()>;

    fn train(&mut self, windows: &[Window], epochs: usize) -> Result<()> {
        self.train_with_progress(windows, epochs, &mut |_| {})
    }

    /// Estimate of the value following `window`. Does not change the model.
    fn predict(&self, window: &[ModelFloat]) -> Result<ModelFloat>;
}

pub(crate) fn check_shape(expected: usize, window: &[ModelFloat]) -> Result<()> {
    if window.len() == expected {
        Ok(())
    } else {
        Err(PipelineError::ShapeMismatch { expected, actual: window.len() })
    }
}

/// Predicts `steps` values past `seed`, feeding each prediction back in as
/// the newest element of the next window.
pub fn forecast<P: SequencePredictor + ?Sized>(
    predictor: &P,
    seed: &[ModelFloat],
    steps: usize,
) -> Result<Vec<ModelFloat>> {
    check_shape(predictor.window_size(), seed)?;
    let mut current = seed.to_vec();
    let mut predictions = Vec::with_capacity(steps);
    for _ in 0..steps {
        let next = predictor.predict(&current)?;
        predictions.push(next);
        current.copy_within(1.., 0);
        if let Some(last) = current.last_mut() {
            *last = next;
        }
    }
    Ok(predictions)
}
