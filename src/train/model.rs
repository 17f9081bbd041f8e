use burn::{nn::{Linear, LinearConfig, Lstm, LstmConfig}, prelude::*};

use crate::NUM_FEATURES;

#[derive(Config, Debug)]
pub struct TheModelConfig {
    #[config(default = 50)]
    pub hidden_size: usize,
}

impl TheModelConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> TheModel<B> {
        let lstm = LstmConfig::new(NUM_FEATURES, self.hidden_size, true).init(device);
        let output = LinearConfig::new(self.hidden_size, 1).init(device);
        TheModel { lstm, output }
    }
}

/// One LSTM layer read out through a linear head on its final hidden state.
#[derive(Module, Debug)]
pub struct TheModel<B: Backend> {
    lstm: Lstm<B>,
    output: Linear<B>,
}

/// # Shapes
///   - Input [batch_size, window_size, NUM_FEATURES]
///   - Output [batch_size, 1]
impl<B: Backend> TheModel<B> {
    pub fn forward(&self, input: Tensor<B, 3>) -> Tensor<B, 2> {
        let (_, state) = self.lstm.forward(input, None);
        self.output.forward(state.hidden)
    }
}
