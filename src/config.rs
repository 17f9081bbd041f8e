use std::{num::NonZeroUsize, path::Path};

use burn::prelude::*;

use crate::{error::{self, PipelineError}, train::{model::TheModelConfig, trainer::TheTrainingConfig}};

#[derive(Config, Debug)]
pub struct PipelineConfig {
    /// Values per input window.
    #[config(default = 5)]
    pub window_size: usize,
    #[config(default = 50)]
    pub epochs: usize,
    /// Extra out-of-sample steps to forecast past the last observation.
    #[config(default = 0)]
    pub horizon: usize,
    pub training: TheTrainingConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::new(TheTrainingConfig::new(TheModelConfig::new()))
    }
}

impl PipelineConfig {
    pub fn window(&self) -> error::Result<NonZeroUsize> {
        NonZeroUsize::new(self.window_size)
            .ok_or_else(|| PipelineError::InvalidConfig("window_size must be at least 1".into()))
    }
}

/// Missing fields take their defaults.
pub fn load_config(path: &Path) -> error::Result<PipelineConfig> {
    PipelineConfig::load(path)
        .map_err(|e| PipelineError::InvalidConfig(format!("loading {path:?}: {e}")))
}

pub fn save_config(config: &PipelineConfig, path: &Path) -> error::Result<()> {
    config.save(path)
        .map_err(|e| PipelineError::InvalidConfig(format!("writing {path:?}: {e}")))
}
