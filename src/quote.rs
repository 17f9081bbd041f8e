use std::{collections::BTreeMap, fs, path::PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;

pub const DAILY_SERIES_KEY: &str = "Time Series (Daily)";
const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Error, Debug)]
pub enum QuoteError {
    #[error("reading {path:?}: {source}")]
    Io { path: PathBuf, #[source] source: std::io::Error },

    #[error("decoding quote document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("provider returned an error: {0}")]
    Provider(String),

    #[error("bad field {field} for {date}: {value:?}")]
    Field { date: String, field: &'static str, value: String },
}

/// One daily bar. Fields are private so an observation cannot change after
/// it has been decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    date: NaiveDate,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: u64,
}

impl Observation {
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: u64) -> Self {
        Self { date, open, high, low, close, volume }
    }

    pub fn date(&self) -> NaiveDate { self.date }
    pub fn open(&self) -> f64 { self.open }
    pub fn high(&self) -> f64 { self.high }
    pub fn low(&self) -> f64 { self.low }
    pub fn close(&self) -> f64 { self.close }
    pub fn volume(&self) -> u64 { self.volume }
}

/// Oldest first. Stable, so observations sharing a date keep their input order.
pub fn sort_by_date(observations: &mut [Observation]) {
    observations.sort_by_key(Observation::date);
}

/// Where a pipeline run gets its observations from. Called exactly once per
/// run and allowed to block.
pub trait ObservationSource {
    fn fetch(&mut self) -> Result<Vec<Observation>, QuoteError>;
}

impl ObservationSource for Vec<Observation> {
    fn fetch(&mut self) -> Result<Vec<Observation>, QuoteError> {
        Ok(self.clone())
    }
}

/// A saved `TIME_SERIES_DAILY` response.
pub struct DailySeriesFile {
    path: PathBuf,
}

impl DailySeriesFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ObservationSource for DailySeriesFile {
    fn fetch(&mut self) -> Result<Vec<Observation>, QuoteError> {
        let json = fs::read_to_string(&self.path)
            .map_err(|source| QuoteError::Io { path: self.path.clone(), source })?;
        parse_daily_series(&json)
    }
}

///
/*
{
  "Meta Data": { "2. Symbol": "AAPL", ... },
  "Time Series (Daily)": {
    "2025-02-14": {
      "1. open": "241.2500",
      "2. high": "245.5500",
      "3. low": "240.9900",
      "4. close": "244.6000",
      "5. volume": "40896227"
    },
    ...
  }
}
*/
///
#[derive(Debug, Deserialize)]
struct DailyResponse {
    #[serde(rename = "Time Series (Daily)")]
    time_series: Option<BTreeMap<String, DailyBar>>,
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DailyBar {
    #[serde(rename = "1. open")]
    open: String,
    #[serde(rename = "2. high")]
    high: String,
    #[serde(rename = "3. low")]
    low: String,
    #[serde(rename = "4. close")]
    close: String,
    #[serde(rename = "5. volume")]
    volume: String,
}

/// Decodes a daily series document. The result is in key order, which for
/// ISO dates is already chronological, but callers still sort: other
/// sources make no such promise.
pub fn parse_daily_series(json: &str) -> Result<Vec<Observation>, QuoteError> {
    let response: DailyResponse = serde_json::from_str(json)?;

    if let Some(msg) = response.error_message.or(response.note).or(response.information) {
        if response.time_series.is_none() {
            return Err(QuoteError::Provider(msg));
        }
    }

    let Some(series) = response.time_series else {
        return Ok(Vec::new());
    };

    series.into_iter().map(|(date, bar)| bar.into_observation(&date)).collect()
}

impl DailyBar {
    fn into_observation(self, date: &str) -> Result<Observation, QuoteError> {
        let parsed_date = NaiveDate::parse_from_str(date, DATE_FORMAT)
            .map_err(|_| field_error(date, "date", date))?;
        let volume = self.volume.trim().parse::<u64>()
            .map_err(|_| field_error(date, "5. volume", &self.volume))?;
        Ok(Observation::new(
            parsed_date,
            price(date, "1. open", &self.open)?,
            price(date, "2. high", &self.high)?,
            price(date, "3. low", &self.low)?,
            price(date, "4. close", &self.close)?,
            volume,
        ))
    }
}

fn price(date: &str, field: &'static str, value: &str) -> Result<f64, QuoteError> {
    match value.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Ok(v),
        _ => Err(field_error(date, field, value)),
    }
}

fn field_error(date: &str, field: &'static str, value: &str) -> QuoteError {
    QuoteError::Field { date: date.to_string(), field, value: value.to_string() }
}
