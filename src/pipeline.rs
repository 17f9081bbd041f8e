use crate::{
    config::PipelineConfig,
    error::{PipelineError, Result},
    normalize::{normalize, MinMax},
    predictor::{forecast, EpochProgress, SequencePredictor},
    quote::{sort_by_date, Observation, ObservationSource},
    window::{build_windows, last_input},
    ModelFloat,
};

/// What one run produced: the most recent window with its true next value
/// next to the model's guess, all in normalized units.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub last_window: Vec<ModelFloat>,
    pub target: ModelFloat,
    pub predicted: ModelFloat,
    pub scale: MinMax,
    pub windows_trained: usize,
    /// Steps past the final observation, empty unless a horizon was configured.
    pub forecast: Vec<ModelFloat>,
}

impl RunReport {
    pub fn target_price(&self) -> f64 {
        self.scale.unscale(self.target)
    }

    pub fn predicted_price(&self) -> f64 {
        self.scale.unscale(self.predicted)
    }

    pub fn forecast_prices(&self) -> Vec<f64> {
        self.forecast.iter().map(|&v| self.scale.unscale(v)).collect()
    }
}

pub struct Pipeline<S: ObservationSource, P: SequencePredictor> {
    source: S,
    predictor: P,
    config: PipelineConfig,
}

impl<S: ObservationSource, P: SequencePredictor> Pipeline<S, P> {
    pub fn new(source: S, predictor: P, config: PipelineConfig) -> Self {
        Self { source, predictor, config }
    }

    pub fn run(&mut self) -> Result<RunReport> {
        self.run_with_progress(&mut |_| {})
    }

    pub fn run_with_progress(&mut self, on_epoch: &mut dyn FnMut(EpochProgress)) -> Result<RunReport> {
        let observations = self.source.fetch()?;
        run_on_with_progress(observations, &mut self.predictor, &self.config, on_epoch)
    }

    pub fn predictor(&self) -> &P {
        &self.predictor
    }

    pub fn into_predictor(self) -> P {
        self.predictor
    }
}

pub fn run_on<P: SequencePredictor + ?Sized>(
    observations: Vec<Observation>,
    predictor: &mut P,
    config: &PipelineConfig,
) -> Result<RunReport> {
    run_on_with_progress(observations, predictor, config, &mut |_| {})
}

/// Sort, normalize, window, train, predict. The first failing stage ends the
/// run with its error.
pub fn run_on_with_progress<P: SequencePredictor + ?Sized>(
    mut observations: Vec<Observation>,
    predictor: &mut P,
    config: &PipelineConfig,
    on_epoch: &mut dyn FnMut(EpochProgress),
) -> Result<RunReport> {
    let window_size = config.window()?;
    if observations.is_empty() {
        return Err(PipelineError::DegenerateInput { observations: 0, reason: "no observations".into() });
    }

    sort_by_date(&mut observations);
    let series = normalize(&observations)?;
    let scale = series.scale.ok_or_else(|| PipelineError::DegenerateInput {
        observations: observations.len(),
        reason: "no scale fitted".into(),
    })?;

    let windows = build_windows(&series.values, window_size);
    let Some(last) = windows.last() else {
        return Err(PipelineError::InsufficientHistory {
            observations: series.len(),
            window_size: window_size.get(),
        });
    };

    predictor.train_with_progress(&windows, config.epochs, on_epoch)?;
    let predicted = predictor.predict(&last.input)?;

    let forecast = match (config.horizon, last_input(&series.values, window_size)) {
        (0, _) | (_, None) => Vec::new(),
        (steps, Some(seed)) => forecast(&*predictor, seed, steps)?,
    };

    Ok(RunReport {
        last_window: last.input.clone(),
        target: last.target,
        predicted,
        scale,
        windows_trained: windows.len(),
        forecast,
    })
}
