use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use log::info;

use close_forecast::{
    config::{load_config, save_config},
    make_regressor, output::print_report, DailySeriesFile, Pipeline, PipelineConfig, TheAutodiffBackend,
};

#[derive(Parser)]
#[command(name = "close-forecast")]
#[command(about = "Train an LSTM on daily closes and predict the next one", long_about = None)]
struct Cli {
    /// Saved TIME_SERIES_DAILY JSON response
    quotes: PathBuf,

    /// Pipeline config (JSON); missing fields take defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(short, long)]
    window_size: Option<usize>,

    #[arg(short, long)]
    epochs: Option<usize>,

    /// Forecast this many steps past the last observation
    #[arg(long)]
    horizon: Option<usize>,

    /// Write the effective config here before running
    #[arg(long)]
    save_config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(window_size) = cli.window_size {
        config.window_size = window_size;
    }
    if let Some(epochs) = cli.epochs {
        config.epochs = epochs;
    }
    if let Some(horizon) = cli.horizon {
        config.horizon = horizon;
    }
    if let Some(path) = &cli.save_config {
        save_config(&config, path)?;
        info!("Wrote config to {:?}", path);
    }

    info!("Window size {}, {} epochs, horizon {}", config.window_size, config.epochs, config.horizon);
    let predictor = make_regressor::<TheAutodiffBackend>(config.window_size, config.training.clone(), Default::default());
    let source = DailySeriesFile::new(&cli.quotes);
    let mut pipeline = Pipeline::new(source, predictor, config);

    let report = pipeline
        .run_with_progress(&mut |p| {
            if p.epoch == p.epochs || p.epoch % 10 == 0 {
                info!("Epoch {}/{}: loss={:.6}", p.epoch, p.epochs, p.loss);
            }
        })
        .with_context(|| format!("Forecast run over {:?} failed", cli.quotes))?;

    print_report(&report);
    Ok(())
}
