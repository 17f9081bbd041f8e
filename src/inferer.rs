use burn::tensor::{backend::Backend, Tensor};

use crate::{error::TrainingFailure, train::{data::WindowBatcher, model::TheModel}, ModelFloat};

/// Read-only copy of a trained model on a backend without autodiff.
pub struct Inferer<B: Backend> {
    batcher: WindowBatcher<B>,
    model: TheModel<B>,
}

impl<B: Backend> Inferer<B> {
    pub fn new(model: TheModel<B>, device: B::Device) -> Self {
        assert!(!B::ad_enabled());
        Self { batcher: WindowBatcher::new(device), model }
    }

    pub fn infer_1(&self, window: &[ModelFloat]) -> Result<ModelFloat, TrainingFailure> {
        let output = self.infer_batch(self.batcher.input(window));
        let values = output.into_data().to_vec::<f32>()
            .map_err(|e| TrainingFailure::Tensor(format!("{e:?}")))?;
        values.first().copied()
            .ok_or_else(|| TrainingFailure::Tensor("empty model output".into()))
    }

    /// # Shapes
    ///   - Input [batch_size, window_size, NUM_FEATURES]
    ///   - Output [batch_size, 1]
    pub fn infer_batch(&self, input: Tensor<B, 3>) -> Tensor<B, 2> {
        self.model.forward(input)
    }
}
