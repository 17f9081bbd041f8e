pub mod config;
pub mod error;
pub mod inferer;
pub mod normalize;
pub mod output;
pub mod pipeline;
pub mod predictor;
pub mod quote;
pub mod regressor;
pub mod train;
pub mod window;

use burn::backend::{Autodiff, NdArray};

pub type ModelFloat = f32;
/// Values per time step; only the close is fed to the model.
pub const NUM_FEATURES: usize = 1;

pub type TheBackend = NdArray<ModelFloat>;
pub type TheAutodiffBackend = Autodiff<TheBackend>;

pub use config::PipelineConfig;
pub use error::{PipelineError, TrainingFailure};
pub use normalize::{normalize, MinMax, NormalizedSeries};
pub use pipeline::{run_on, Pipeline, RunReport};
pub use predictor::{forecast, EpochProgress, SequencePredictor};
pub use quote::{DailySeriesFile, Observation, ObservationSource};
pub use regressor::{make_regressor, LstmRegressor};
pub use window::{build_windows, Window};
