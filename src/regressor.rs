use burn::{module::AutodiffModule, optim::Optimizer, tensor::backend::AutodiffBackend};

use crate::{
    error::{Result, TrainingFailure},
    inferer::Inferer,
    predictor::{check_shape, EpochProgress, SequencePredictor},
    train::{model::TheModel, trainer::{make_trainer, LossKind, TheTrainingConfig, Trainer}},
    window::Window,
    ModelFloat,
};

/// LSTM regressor trained with Adam. Trains on `B`, predicts on its inner
/// backend through an [`Inferer`] refreshed after every successful training.
pub struct LstmRegressor<B: AutodiffBackend, O: Optimizer<TheModel<B>, B>> {
    window_size: usize,
    device: B::Device,
    trainer: Trainer<B, O, LossKind>,
    inferer: Option<Inferer<B::InnerBackend>>,
}

pub fn make_regressor<B: AutodiffBackend>(
    window_size: usize,
    train_config: TheTrainingConfig,
    device: B::Device,
) -> LstmRegressor<B, impl Optimizer<TheModel<B>, B>> {
    let trainer = make_trainer::<B>(train_config, device.clone());
    LstmRegressor { window_size, device, trainer, inferer: None }
}

impl<B: AutodiffBackend, O: Optimizer<TheModel<B>, B>> SequencePredictor for LstmRegressor<B, O> {
    fn window_size(&self) -> usize {
        self.window_size
    }

    fn train_with_progress(
        &mut self,
        windows: &[Window],
        epochs: usize,
        on_epoch: &mut dyn FnMut(EpochProgress),
    ) -> Result<()> {
        if epochs == 0 {
            return Err(TrainingFailure::InvalidConfiguration("epochs must be positive".into()).into());
        }
        if windows.is_empty() {
            return Err(TrainingFailure::InvalidConfiguration("no windows to train on".into()).into());
        }
        for window in windows {
            check_shape(self.window_size, &window.input)?;
        }

        self.inferer = None;
        self.trainer.fit(windows, epochs, on_epoch)?;
        let model = self.trainer.model()?.valid();
        self.inferer = Some(Inferer::new(model, self.device.clone()));
        Ok(())
    }

    fn predict(&self, window: &[ModelFloat]) -> Result<ModelFloat> {
        check_shape(self.window_size, window)?;
        let inferer = self.inferer.as_ref().ok_or(TrainingFailure::NotTrained)?;
        Ok(inferer.infer_1(window)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::PipelineError, train::model::TheModelConfig, TheAutodiffBackend};

    fn regressor(window_size: usize) -> LstmRegressor<TheAutodiffBackend, impl Optimizer<TheModel<TheAutodiffBackend>, TheAutodiffBackend>> {
        let config = TheTrainingConfig::new(TheModelConfig::new().with_hidden_size(8)).with_learning_rate(1e-2);
        make_regressor::<TheAutodiffBackend>(window_size, config, Default::default())
    }

    fn windows() -> Vec<Window> {
        vec![
            Window { input: vec![0.0, 0.5, 0.25], target: 0.75 },
            Window { input: vec![0.5, 0.25, 0.75], target: 1.0 },
            Window { input: vec![0.25, 0.75, 1.0], target: 0.5 },
        ]
    }

    #[test]
    fn test_predict_before_training() {
        let err = regressor(3).predict(&[0.0, 0.5, 0.25]).unwrap_err();
        assert!(matches!(err, PipelineError::Training(TrainingFailure::NotTrained)));
    }

    #[test]
    fn test_train_then_predict() {
        let mut p = regressor(3);
        p.train(&windows(), 20).unwrap();
        let y = p.predict(&[0.25, 0.75, 1.0]).unwrap();
        assert!(y.is_finite() && (-1.0..=2.0).contains(&y), "prediction {y}");
    }

    #[test]
    fn test_predict_is_pure() {
        let mut p = regressor(3);
        p.train(&windows(), 5).unwrap();
        let a = p.predict(&[0.25, 0.75, 1.0]).unwrap();
        let b = p.predict(&[0.25, 0.75, 1.0]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_divergence_fails_training_and_drops_model() {
        let config = TheTrainingConfig::new(TheModelConfig::new().with_hidden_size(8)).with_learning_rate(1e38);
        let mut p = make_regressor::<TheAutodiffBackend>(3, config, Default::default());
        for epochs in [1, 5] {
            let err = p.train(&windows(), epochs).unwrap_err();
            assert!(matches!(err, PipelineError::Training(TrainingFailure::Diverged { .. })), "{err:?}");
            let err = p.predict(&[0.25, 0.75, 1.0]).unwrap_err();
            assert!(matches!(err, PipelineError::Training(TrainingFailure::NotTrained)));
        }
    }

    #[test]
    fn test_shape_mismatch() {
        let mut p = regressor(3);
        p.train(&windows(), 1).unwrap();
        let err = p.predict(&[0.25, 0.75]).unwrap_err();
        assert!(matches!(err, PipelineError::ShapeMismatch { expected: 3, actual: 2 }));

        let bad = vec![Window { input: vec![0.1; 4], target: 0.2 }];
        let err = p.train(&bad, 1).unwrap_err();
        assert!(matches!(err, PipelineError::ShapeMismatch { expected: 3, actual: 4 }));
    }

    #[test]
    fn test_invalid_training_calls() {
        let mut p = regressor(3);
        assert!(matches!(
            p.train(&windows(), 0).unwrap_err(),
            PipelineError::Training(TrainingFailure::InvalidConfiguration(_))
        ));
        assert!(matches!(
            p.train(&[], 3).unwrap_err(),
            PipelineError::Training(TrainingFailure::InvalidConfiguration(_))
        ));
    }
}
