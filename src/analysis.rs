//! # Tide Filter Engine
//!
//! Turns a [`TideQuery`] into the list of matching, sun-annotated tide events.
//!
//! ## Pipeline
//! 1. **Resolve** the location name to a catalog record (station, coordinates, tz)
//! 2. **Fetch** high/low predictions for the station over the date range
//! 3. **Stage 1**: keep events of the requested kind whose height clears the
//!    threshold and whose weekday was asked for
//! 4. **Sun times**: compute sunrise/sunset once for each distinct date left
//! 5. **Stage 2**: keep events inside the requested time-of-day window
//! 6. **Emit** one [`ResultRow`] per survivor, in provider order
//!
//! ## Thresholds
//! The height threshold is one-sided and depends on the tide kind: a Low tide
//! matches when it is *at or below* the threshold, a High tide when it is *at
//! or above* it.
//!
//! ## Twilight Buffer
//! Daylight widens the window to `(sunrise - 1h, sunset + 1h)` so twilight
//! counts as light. Night keeps events *outside* `(sunrise + 1h, sunset - 1h)`
//! so twilight counts as dark. Both comparisons are strict and on clock time
//! only.
//!
//! ## Error Policy
//! - A "no data" answer from the tide source is a valid empty result.
//! - A sunrise/sunset failure (polar day or night) fails the whole query; no
//!   default times are substituted.

use crate::locations::LocationCatalog;
use crate::solar::{SunCalculator, SunError};
use crate::tide_data::{compact_date, parse_iso_date, TideError, TideSource};
use crate::{
    weekday_name, LocationRecord, ResultRow, SunTimes, TideEvent, TideKind, TideQuery, TimeOfDay,
    ROW_TIME_FORMAT,
};
use chrono::{Datelike, Duration, NaiveDate, NaiveTime};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, info};

/// Width of the twilight buffer around sunrise and sunset.
const TWILIGHT_BUFFER_HOURS: i64 = 1;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("location not found: {0}")]
    LocationNotFound(String),

    #[error("invalid date {value:?}, expected YYYY-MM-DD")]
    InvalidDateFormat {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error(transparent)]
    SourceUnavailable(#[from] TideError),

    #[error(transparent)]
    Computation(#[from] SunError),
}

/// Orchestrates lookup, fetch, filtering and sun annotation for one query.
///
/// The engine holds no per-query state, so one instance can serve concurrent
/// queries; sunrise/sunset memoization is scoped to a single [`analyze`] call.
///
/// [`analyze`]: TideFilterEngine::analyze
#[derive(Debug)]
pub struct TideFilterEngine<T, S> {
    catalog: LocationCatalog,
    tides: T,
    sun: S,
}

impl<T, S> TideFilterEngine<T, S>
where
    T: TideSource,
    S: SunCalculator,
{
    pub fn new(catalog: LocationCatalog, tides: T, sun: S) -> Self {
        Self {
            catalog,
            tides,
            sun,
        }
    }

    /// Locations this engine can resolve.
    pub fn catalog(&self) -> &LocationCatalog {
        &self.catalog
    }

    /// The tide source this engine fetches from.
    pub fn tide_source(&self) -> &T {
        &self.tides
    }

    /// The calculator this engine asks for sunrise/sunset.
    pub fn sun_calculator(&self) -> &S {
        &self.sun
    }

    /// Run the full pipeline for `query`.
    pub async fn analyze(&self, query: &TideQuery) -> Result<Vec<ResultRow>, AnalysisError> {
        let location = self
            .catalog
            .resolve(&query.location)
            .map_err(|_| AnalysisError::LocationNotFound(query.location.clone()))?;

        let begin = parse_query_date(&query.begin_date)?;
        let end = parse_query_date(&query.end_date)?;

        let fetched = self
            .tides
            .fetch(&location.station_id, &compact_date(begin), &compact_date(end))
            .await;
        let events = match fetched {
            Ok(events) => events,
            Err(TideError::NoData) => {
                info!(location = %location.name, "tide source has no data for range");
                return Ok(Vec::new());
            }
            Err(err) => return Err(err.into()),
        };
        let fetched_count = events.len();

        let candidates: Vec<TideEvent> = events
            .into_iter()
            .filter(|event| {
                let date = event.timestamp.date();
                begin <= date && date <= end && matches_tide_filter(event, query)
            })
            .collect();

        let sun_times = sun_times_by_date(&self.sun, location, &candidates)?;

        let rows: Vec<ResultRow> = candidates
            .iter()
            .filter_map(|event| {
                let sun = sun_times.get(&event.timestamp.date())?;
                in_time_window(event.timestamp.time(), sun, query.time_of_day)
                    .then(|| result_row(event, sun))
            })
            .collect();

        debug!(
            fetched = fetched_count,
            stage_one = candidates.len(),
            sun_dates = sun_times.len(),
            stage_two = rows.len(),
            "filter stages complete"
        );
        info!(
            location = %location.name,
            station = %location.station_id,
            rows = rows.len(),
            "tide analysis complete"
        );

        Ok(rows)
    }
}

fn parse_query_date(value: &str) -> Result<NaiveDate, AnalysisError> {
    parse_iso_date(value).map_err(|source| AnalysisError::InvalidDateFormat {
        value: value.to_string(),
        source,
    })
}

/// Stage 1: tide kind, one-sided height threshold and weekday.
pub fn matches_tide_filter(event: &TideEvent, query: &TideQuery) -> bool {
    if event.kind != query.tide_type {
        return false;
    }
    let height_ok = match query.tide_type {
        TideKind::Low => event.height_ft <= query.threshold_ft,
        TideKind::High => event.height_ft >= query.threshold_ft,
    };
    height_ok && query.weekdays.contains(&event.timestamp.weekday())
}

/// Stage 2: is a tide at clock time `time` inside the `time_of_day` window?
///
/// Only clock times are compared, so a buffered bound that crosses midnight
/// wraps rather than moving to the neighbouring date.
pub fn in_time_window(time: NaiveTime, sun: &SunTimes, time_of_day: TimeOfDay) -> bool {
    let buffer = Duration::hours(TWILIGHT_BUFFER_HOURS);
    match time_of_day {
        TimeOfDay::Daylight => {
            let start = (sun.sunrise - buffer).time();
            let end = (sun.sunset + buffer).time();
            start < time && time < end
        }
        TimeOfDay::Night => {
            let start = (sun.sunrise + buffer).time();
            let end = (sun.sunset - buffer).time();
            !(start < time && time < end)
        }
        TimeOfDay::Any => true,
    }
}

/// Compute sunrise/sunset once per distinct event date.
fn sun_times_by_date<S: SunCalculator>(
    sun: &S,
    location: &LocationRecord,
    events: &[TideEvent],
) -> Result<BTreeMap<NaiveDate, SunTimes>, SunError> {
    let mut by_date = BTreeMap::new();
    for event in events {
        if let Entry::Vacant(slot) = by_date.entry(event.timestamp.date()) {
            let date = *slot.key();
            slot.insert(sun.compute(location, date)?);
        }
    }
    Ok(by_date)
}

fn result_row(event: &TideEvent, sun: &SunTimes) -> ResultRow {
    ResultRow {
        tide_time: event.timestamp.format(ROW_TIME_FORMAT).to_string(),
        weekday: weekday_name(event.timestamp.weekday()).to_string(),
        height_ft: event.height_ft,
        sunrise: sun.sunrise.format(ROW_TIME_FORMAT).to_string(),
        sunset: sun.sunset.format(ROW_TIME_FORMAT).to_string(),
    }
}
