use burn::{data::dataloader::batcher::Batcher, prelude::*, tensor::TensorData};

use crate::{window::Window, ModelFloat, NUM_FEATURES};

/// Lays windows out as tensors on one device. This is the only place that
/// knows the `[batch, window, feature]` layout the model consumes.
#[derive(Clone)]
pub struct WindowBatcher<B: Backend> {
    pub(crate) device: B::Device,
}

#[derive(Clone, Debug)]
pub struct WindowBatch<B: Backend> {
    /// [batch_size, window_size, NUM_FEATURES]
    pub inputs: Tensor<B, 3>,
    /// [batch_size, 1]
    pub targets: Tensor<B, 2>,
}

impl<B: Backend> WindowBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }

    /// A single window as a batch of one.
    pub fn input(&self, window: &[ModelFloat]) -> Tensor<B, 3> {
        Tensor::from_data(
            TensorData::new(window.to_vec(), [1, window.len(), NUM_FEATURES]),
            &self.device,
        )
    }
}

/// All windows must share one input length; callers check shapes first.
impl<B: Backend> Batcher<B, Window, WindowBatch<B>> for WindowBatcher<B> {
    fn batch(&self, windows: Vec<Window>, device: &B::Device) -> WindowBatch<B> {
        let batch_size = windows.len();
        let window_size = windows.first().map_or(0, |w| w.input.len());
        let inputs: Vec<ModelFloat> = windows.iter().flat_map(|w| w.input.iter().copied()).collect();
        let targets: Vec<ModelFloat> = windows.iter().map(|w| w.target).collect();

        let inputs = Tensor::from_data(
            TensorData::new(inputs, [batch_size, window_size, NUM_FEATURES]),
            device,
        );
        let targets = Tensor::from_data(TensorData::new(targets, [batch_size, 1]), device);
        WindowBatch { inputs, targets }
    }
}
