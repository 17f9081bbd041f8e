use std::num::NonZeroUsize;

use chrono::{Days, NaiveDate};
use close_forecast::{
    build_windows, make_regressor, normalize, quote::sort_by_date, train::{model::TheModelConfig, trainer::TheTrainingConfig},
    DailySeriesFile, Observation, Pipeline, PipelineConfig, PipelineError, SequencePredictor, TheAutodiffBackend, Window,
};

fn observations(closes: &[f64]) -> Vec<Observation> {
    let start = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
    closes.iter().enumerate()
        .map(|(i, &c)| Observation::new(start + Days::new(i as u64), c - 0.5, c + 1.0, c - 1.0, c, 1_000_000))
        .collect()
}

fn training() -> TheTrainingConfig {
    TheTrainingConfig::new(TheModelConfig::new().with_hidden_size(16)).with_learning_rate(1e-2)
}

#[test]
fn test_reference_example_end_to_end() {
    let config = PipelineConfig::new(training()).with_window_size(3).with_epochs(30).with_horizon(2);
    let predictor = make_regressor::<TheAutodiffBackend>(3, config.training.clone(), Default::default());
    let mut pipeline = Pipeline::new(observations(&[10.0, 12.0, 11.0, 13.0, 14.0, 12.0]), predictor, config);

    let report = pipeline.run().unwrap();
    assert_eq!(report.windows_trained, 3);
    assert_eq!(report.last_window, vec![0.25, 0.75, 1.0]);
    assert_eq!(report.target, 0.5);
    assert!(report.predicted.is_finite());
    assert!((-1.0..=2.0).contains(&report.predicted), "predicted {}", report.predicted);
    assert_eq!(report.forecast.len(), 2);
    assert!(report.forecast.iter().all(|v| v.is_finite()));

    let again = pipeline.predictor().predict(&[0.25, 0.75, 1.0]).unwrap();
    assert_eq!(again, report.predicted);
}

#[test]
fn test_windows_are_reproducible() {
    let mut obs = observations(&[101.2, 99.8, 100.4, 103.9, 102.2, 98.7, 97.1, 99.5, 104.0, 103.3]);
    obs.swap(2, 7);
    let build = |mut obs: Vec<Observation>| -> Vec<Window> {
        sort_by_date(&mut obs);
        let series = normalize(&obs).unwrap();
        build_windows(&series.values, NonZeroUsize::new(4).unwrap())
    };
    let first = build(obs.clone());
    let second = build(obs);
    assert_eq!(first.len(), 6);
    let bits = |ws: &[Window]| -> Vec<u32> {
        ws.iter().flat_map(|w| w.input.iter().chain(std::iter::once(&w.target))).map(|v| v.to_bits()).collect()
    };
    assert_eq!(bits(&first), bits(&second));
}

#[test]
fn test_daily_file_source() {
    let json = r#"{
        "Meta Data": { "2. Symbol": "TEST" },
        "Time Series (Daily)": {
            "2025-01-10": { "1. open": "12", "2. high": "13", "3. low": "11", "4. close": "12.0", "5. volume": "10" },
            "2025-01-09": { "1. open": "14", "2. high": "15", "3. low": "13", "4. close": "14.0", "5. volume": "10" },
            "2025-01-08": { "1. open": "13", "2. high": "14", "3. low": "12", "4. close": "13.0", "5. volume": "10" },
            "2025-01-07": { "1. open": "11", "2. high": "12", "3. low": "10", "4. close": "11.0", "5. volume": "10" },
            "2025-01-06": { "1. open": "12", "2. high": "13", "3. low": "11", "4. close": "12.0", "5. volume": "10" },
            "2025-01-03": { "1. open": "10", "2. high": "11", "3. low": "9", "4. close": "10.0", "5. volume": "10" }
        }
    }"#;
    let path = std::env::temp_dir().join(format!("close-forecast-daily-{}.json", std::process::id()));
    std::fs::write(&path, json).unwrap();

    let config = PipelineConfig::new(training()).with_window_size(3).with_epochs(5);
    let predictor = make_regressor::<TheAutodiffBackend>(3, config.training.clone(), Default::default());
    let mut pipeline = Pipeline::new(DailySeriesFile::new(&path), predictor, config);
    let report = pipeline.run();
    std::fs::remove_file(&path).unwrap();

    let report = report.unwrap();
    assert_eq!(report.last_window, vec![0.25, 0.75, 1.0]);
    assert_eq!(report.target_price(), 12.0);
}

#[test]
fn test_missing_file_is_source_error() {
    let config = PipelineConfig::new(training()).with_window_size(3).with_epochs(1);
    let predictor = make_regressor::<TheAutodiffBackend>(3, config.training.clone(), Default::default());
    let mut pipeline = Pipeline::new(DailySeriesFile::new("/nonexistent/quotes.json"), predictor, config);
    assert!(matches!(pipeline.run().unwrap_err(), PipelineError::Source(_)));
}

#[test]
fn test_single_observation_is_degenerate() {
    let config = PipelineConfig::new(training()).with_window_size(3).with_epochs(1);
    let predictor = make_regressor::<TheAutodiffBackend>(3, config.training.clone(), Default::default());
    let mut pipeline = Pipeline::new(observations(&[10.0]), predictor, config);
    assert!(matches!(pipeline.run().unwrap_err(), PipelineError::DegenerateInput { observations: 1, .. }));
}
