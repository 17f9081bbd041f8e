use burn::data::dataloader::batcher::Batcher;
use burn::grad_clipping::GradientClippingConfig;
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::tensor::backend::AutodiffBackend;
use burn::prelude::*;
use burn::tensor::ElementConversion;
use log::{debug, info};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::error::TrainingFailure;
use crate::predictor::EpochProgress;
use crate::window::Window;

use super::data::{WindowBatch, WindowBatcher};
use super::model::{TheModel, TheModelConfig};

#[derive(Config, Debug)]
pub struct TheTrainingConfig {
    #[config(default = 64)]
    pub batch_size: usize,
    #[config(default = 1234)]
    pub seed: u64,
    #[config(default = 1e-3)]
    pub learning_rate: f64,
    /// Clip each gradient value to `[-grad_clip, grad_clip]` before stepping.
    pub grad_clip: Option<f32>,
    /// Stop after this many epochs without a lower epoch loss and keep the
    /// best weights. `None` always runs every requested epoch.
    pub patience: Option<usize>,
    #[config(default = "LossKind::Mse")]
    pub loss: LossKind,
    pub model_config: TheModelConfig,
}

#[derive(Config, Debug, PartialEq)]
pub enum LossKind {
    Mse,
    Huber { delta: f32 },
}

pub trait LossCalc<B: Backend> {
    /// # Shapes
    ///   - Output, Expected [batch_size, 1]
    ///   - Result [batch_size]
    fn for_each_in_batch(&self, output: Tensor<B, 2>, expected: Tensor<B, 2>) -> Tensor<B, 1>;
}

impl<B: Backend> LossCalc<B> for LossKind {
    fn for_each_in_batch(&self, output: Tensor<B, 2>, expected: Tensor<B, 2>) -> Tensor<B, 1> {
        let diff = output - expected;
        let per_element = match self {
            LossKind::Mse => diff.clone() * diff,
            LossKind::Huber { delta } => {
                let abs = diff.abs();
                let quadratic = abs.clone().clamp_max(*delta);
                let linear = abs - quadratic.clone();
                quadratic.clone() * quadratic * 0.5 + linear * *delta
            }
        };
        per_element.mean_dim(1).squeeze_dim(1)
    }
}

/// The model lives in an `Option` because the optimizer step consumes it and
/// hands back the updated one.
pub struct Trainer<B: AutodiffBackend, O: Optimizer<TheModel<B>, B>, L: LossCalc<B>> {
    train_config: TheTrainingConfig,
    model: Option<TheModel<B>>,
    optimizer: O,
    loss_calc: L,
    batcher: WindowBatcher<B>,
    rng: StdRng,
}

pub fn make_trainer<B: AutodiffBackend>(
    train_config: TheTrainingConfig,
    device: B::Device,
) -> Trainer<B, impl Optimizer<TheModel<B>, B>, LossKind> {
    B::seed(&device, train_config.seed);
    let model = train_config.model_config.init::<B>(&device);
    let optimizer = AdamConfig::new()
        .with_grad_clipping(train_config.grad_clip.map(GradientClippingConfig::Value))
        .init::<B, TheModel<B>>();
    let loss = train_config.loss.clone();
    Trainer::new(train_config, model, optimizer, loss, device)
}

impl<B: AutodiffBackend, O: Optimizer<TheModel<B>, B>, L: LossCalc<B>> Trainer<B, O, L> {
    pub fn new(train_config: TheTrainingConfig, model: TheModel<B>, optimizer: O, loss_calc: L, device: B::Device) -> Self {
        let rng = StdRng::seed_from_u64(train_config.seed);
        Self {
            train_config,
            model: Some(model),
            optimizer,
            loss_calc,
            batcher: WindowBatcher::new(device),
            rng,
        }
    }

    pub fn model(&self) -> Result<&TheModel<B>, TrainingFailure> {
        self.model.as_ref().ok_or(TrainingFailure::NotTrained)
    }

    /// Runs up to `epochs` passes over `windows` in a freshly shuffled order
    /// each time. Shapes must already be checked. The kept weights are scored
    /// once more at the end, so a last step that blew up is still `Diverged`.
    pub fn fit(
        &mut self,
        windows: &[Window],
        epochs: usize,
        on_epoch: &mut dyn FnMut(EpochProgress),
    ) -> Result<(), TrainingFailure> {
        let batch_size = self.train_config.batch_size;
        if batch_size == 0 {
            return Err(TrainingFailure::InvalidConfiguration("batch_size must be positive".into()));
        }
        if windows.is_empty() || epochs == 0 {
            return Ok(());
        }
        info!("Training on {} windows for {} epochs, batch size {}", windows.len(), epochs, batch_size);

        let mut order: Vec<usize> = (0..windows.len()).collect();
        let mut best: Option<(f32, TheModel<B>)> = None;
        let mut since_best = 0;
        let mut last_epoch = 0;

        for epoch in 1..=epochs {
            last_epoch = epoch;
            order.shuffle(&mut self.rng);
            let mut loss_sum = 0.0;
            for chunk in order.chunks(batch_size) {
                let batch = self.batcher.batch(chunk.iter().map(|&i| windows[i].clone()).collect(), &self.batcher.device);
                loss_sum += self.train_batch(batch, epoch)? * chunk.len() as f32;
            }
            let loss = loss_sum / windows.len() as f32;
            debug!("Epoch {}/{}: loss={:.6}", epoch, epochs, loss);
            on_epoch(EpochProgress { epoch, epochs, loss });

            if let Some(patience) = self.train_config.patience {
                let best_loss = best.as_ref().map(|(l, _)| *l);
                if best_loss.map_or(true, |b| loss < b) {
                    best = Some((loss, self.model()?.clone()));
                    since_best = 0;
                } else {
                    since_best += 1;
                    if since_best >= patience {
                        info!("Stopping early at epoch {}, best loss {:.6}", epoch, best_loss.unwrap_or(loss));
                        break;
                    }
                }
            }
        }

        if let Some((best_loss, model)) = best {
            debug!("Restoring weights with loss {:.6}", best_loss);
            self.model = Some(model);
        }

        let loss = self.evaluate(windows)?;
        if !loss.is_finite() {
            return Err(TrainingFailure::Diverged { epoch: last_epoch, loss });
        }
        Ok(())
    }

    /// Mean loss of the current weights over `windows`, without stepping.
    pub fn evaluate(&self, windows: &[Window]) -> Result<f32, TrainingFailure> {
        let model = self.model()?;
        let batch_size = self.train_config.batch_size.max(1);
        let mut loss_sum = 0.0;
        for chunk in windows.chunks(batch_size) {
            let batch = self.batcher.batch(chunk.to_vec(), &self.batcher.device);
            let loss = self.loss_calc.for_each_in_batch(model.forward(batch.inputs), batch.targets).mean();
            loss_sum += loss.into_scalar().elem::<f32>() * chunk.len() as f32;
        }
        Ok(loss_sum / windows.len() as f32)
    }

    /// One optimizer step. Returns the mean loss of the batch before the step.
    pub fn train_batch(&mut self, batch: WindowBatch<B>, epoch: usize) -> Result<f32, TrainingFailure> {
        let model = self.model.take().ok_or(TrainingFailure::NotTrained)?;

        let output = model.forward(batch.inputs);
        let loss = self.loss_calc.for_each_in_batch(output, batch.targets).mean();
        let value = loss.clone().into_scalar().elem::<f32>();
        if !value.is_finite() {
            self.model = Some(model);
            return Err(TrainingFailure::Diverged { epoch, loss: value });
        }

        let grads = GradientsParams::from_grads(loss.backward(), &model);
        self.model = Some(self.optimizer.step(self.train_config.learning_rate, model, grads));
        Ok(value)
    }
}
