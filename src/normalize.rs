use itertools::{Itertools, MinMaxResult};

use crate::{error::{PipelineError, Result}, quote::Observation, ModelFloat};

/// Close-price range a series was scaled with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinMax {
    pub min: f64,
    pub max: f64,
}

impl MinMax {
    pub fn scale(&self, close: f64) -> ModelFloat {
        ((close - self.min) / (self.max - self.min)) as ModelFloat
    }

    pub fn unscale(&self, value: ModelFloat) -> f64 {
        value as f64 * (self.max - self.min) + self.min
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedSeries {
    pub values: Vec<ModelFloat>,
    /// `None` only for the empty series.
    pub scale: Option<MinMax>,
}

impl NormalizedSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Min-max scales closes to [0,1]. Expects `observations` sorted by date;
/// output is index-aligned with the input.
pub fn normalize(observations: &[Observation]) -> Result<NormalizedSeries> {
    if observations.is_empty() {
        return Ok(NormalizedSeries { values: Vec::new(), scale: None });
    }

    if let Some(bad) = observations.iter().find(|o| !o.close().is_finite()) {
        return Err(degenerate(observations.len(), format!("close on {} is {}", bad.date(), bad.close())));
    }

    let (min, max) = match observations.iter().map(Observation::close).minmax_by(f64::total_cmp) {
        MinMaxResult::MinMax(min, max) if min < max => (min, max),
        MinMaxResult::MinMax(min, _) | MinMaxResult::OneElement(min) => {
            return Err(degenerate(observations.len(), format!("all closes equal {min}")));
        }
        MinMaxResult::NoElements => unreachable!("checked non-empty above"),
    };

    let scale = MinMax { min, max };
    let values = observations.iter().map(|o| scale.scale(o.close())).collect();
    Ok(NormalizedSeries { values, scale: Some(scale) })
}

fn degenerate(observations: usize, reason: String) -> PipelineError {
    PipelineError::DegenerateInput { observations, reason }
}
