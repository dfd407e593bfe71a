//! # NOAA Tide Prediction Fetching
//!
//! This module handles all network operations for fetching high/low tide
//! predictions from NOAA's CO-OPS data API.
//!
//! ## Data Source
//!
//! ### NOAA Tides and Currents
//! - **URL**: https://api.tidesandcurrents.noaa.gov/api/prod/datagetter
//! - **Product**: `predictions` with `interval=hilo` (extrema only, not the curve)
//! - **Datum**: MLLW, heights in feet (`units=english`)
//! - **Time zone**: `lst_ldt`, local standard/daylight time at the station, so
//!   no timezone conversion happens on our side
//! - **Dates**: compact `YYYYMMDD` form
//!
//! ### Response Shapes
//! ```json
//! {"predictions":[{"t":"2024-11-06 03:12","v":"6.512","type":"H"}]}
//! {"error":{"message":"No Predictions data was found. Please make sure ..."}}
//! ```
//!
//! ## Error Handling
//! - **Network/HTTP failures** surface as [`TideError::SourceUnavailable`]
//! - **"No data" answers** (error body or empty list) surface as [`TideError::NoData`]
//! - **Malformed rows** are skipped with a warning; one bad row never sinks
//!   the whole request

use crate::config::NoaaConfig;
use crate::{TideEvent, TideKind};
use chrono::{NaiveDate, NaiveDateTime, ParseError};
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can occur while fetching tide predictions.
#[derive(Error, Debug)]
pub enum TideError {
    /// HTTP request failed (network, server, or protocol error)
    #[error("tide source unavailable: {0}")]
    SourceUnavailable(#[from] reqwest::Error),

    /// Response body was not the JSON shape NOAA documents
    #[error("tide response decode: {0}")]
    Decode(#[from] serde_json::Error),

    /// NOAA answered with an error message other than "no data"
    #[error("tide provider error: {0}")]
    Provider(String),

    /// The station has no predictions for the requested range
    #[error("no tide predictions for the requested range")]
    NoData,
}

/// Anything that can supply high/low tide events for a station.
///
/// `begin_date` and `end_date` are compact `YYYYMMDD` strings (see
/// [`compact_date`]). Events come back in provider order, which for NOAA is
/// chronological.
pub trait TideSource {
    fn fetch(
        &self,
        station_id: &str,
        begin_date: &str,
        end_date: &str,
    ) -> impl Future<Output = Result<Vec<TideEvent>, TideError>> + Send;
}

/// Timestamp format of the `t` field.
const NOAA_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Prefix of the error message NOAA returns for an empty range.
const NO_DATA_MESSAGE: &str = "No Predictions data was found";

/// Parse a caller-facing ISO date (`YYYY-MM-DD`).
pub fn parse_iso_date(value: &str) -> Result<NaiveDate, ParseError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
}

/// Render a date in the compact `YYYYMMDD` form the NOAA API expects.
pub fn compact_date(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// HTTP client for the NOAA CO-OPS data getter.
#[derive(Clone, Debug)]
pub struct NoaaClient {
    http: reqwest::Client,
    base_url: String,
    application: String,
}

impl NoaaClient {
    pub fn new(config: &NoaaConfig) -> Result<Self, TideError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            application: config.application.clone(),
        })
    }
}

impl TideSource for NoaaClient {
    async fn fetch(
        &self,
        station_id: &str,
        begin_date: &str,
        end_date: &str,
    ) -> Result<Vec<TideEvent>, TideError> {
        info!(station_id, begin_date, end_date, "fetching NOAA hilo predictions");

        let body = self
            .http
            .get(&self.base_url)
            .query(&[
                ("begin_date", begin_date),
                ("end_date", end_date),
                ("station", station_id),
                ("product", "predictions"),
                ("datum", "MLLW"),
                ("units", "english"),
                ("time_zone", "lst_ldt"),
                ("interval", "hilo"),
                ("format", "json"),
                ("application", self.application.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        parse_predictions(&body)
    }
}

#[derive(Deserialize)]
struct NoaaResponse {
    #[serde(default)]
    predictions: Option<Vec<NoaaPrediction>>,
    #[serde(default)]
    error: Option<NoaaErrorBody>,
}

// Every field optional so one odd row doesn't fail the whole body.
#[derive(Deserialize, Debug)]
struct NoaaPrediction {
    t: Option<String>,
    v: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

#[derive(Deserialize)]
struct NoaaErrorBody {
    #[serde(default)]
    message: String,
}

/// Decode a NOAA `datagetter` JSON body into tide events.
///
/// Input order is preserved. Rows with a missing or unparseable time, height
/// or type are logged and skipped.
pub fn parse_predictions(body: &str) -> Result<Vec<TideEvent>, TideError> {
    let response: NoaaResponse = serde_json::from_str(body)?;

    if let Some(error) = response.error {
        return if error.message.trim_start().starts_with(NO_DATA_MESSAGE) {
            Err(TideError::NoData)
        } else {
            Err(TideError::Provider(error.message))
        };
    }

    let rows = response.predictions.unwrap_or_default();
    if rows.is_empty() {
        return Err(TideError::NoData);
    }

    let mut events = Vec::with_capacity(rows.len());
    for row in &rows {
        match parse_row(row) {
            Some(event) => events.push(event),
            None => warn!(?row, "skipping malformed tide prediction"),
        }
    }

    debug!(received = rows.len(), kept = events.len(), "parsed tide predictions");
    Ok(events)
}

fn parse_row(row: &NoaaPrediction) -> Option<TideEvent> {
    let timestamp =
        NaiveDateTime::parse_from_str(row.t.as_deref()?.trim(), NOAA_TIME_FORMAT).ok()?;
    let height_ft: f64 = row.v.as_deref()?.trim().parse().ok()?;
    if !height_ft.is_finite() {
        return None;
    }
    let kind = TideKind::from_code(row.kind.as_deref()?.trim())?;
    Some(TideEvent {
        timestamp,
        height_ft,
        kind,
    })
}
