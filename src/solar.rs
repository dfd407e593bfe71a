//! Sunrise and sunset for a catalog location on a calendar date.
//!
//! Uses the NREL Solar Position Algorithm from `solar-positioning`, anchored at
//! local noon so the result always belongs to the requested local day.

use crate::{LocationRecord, SunTimes};
use chrono::{DateTime, Datelike, NaiveDate, TimeZone};
use chrono_tz::Tz;
use solar_positioning::{spa, time::DeltaT, types::SunriseResult, Horizon};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SunError {
    /// Midnight sun: the sun never sets on this date
    #[error("sun never sets at {location} on {date}")]
    PolarDay { location: String, date: NaiveDate },

    /// Polar night: the sun never rises on this date
    #[error("sun never rises at {location} on {date}")]
    PolarNight { location: String, date: NaiveDate },

    #[error("sunrise/sunset computation failed: {0}")]
    Computation(String),
}

/// Source of sunrise/sunset times.
///
/// Implementations must be pure in `(location, date)`; the engine relies on
/// that to compute each date once per query.
pub trait SunCalculator {
    fn compute(&self, location: &LocationRecord, date: NaiveDate) -> Result<SunTimes, SunError>;
}

/// SPA-based calculator for the standard sunrise/sunset horizon
/// (upper limb on the horizon, standard refraction).
#[derive(Clone, Copy, Debug, Default)]
pub struct SpaSunCalculator;

impl SunCalculator for SpaSunCalculator {
    fn compute(&self, location: &LocationRecord, date: NaiveDate) -> Result<SunTimes, SunError> {
        let noon = local_noon(location.timezone, date)?;
        let delta_t = DeltaT::estimate_from_date(date.year(), date.month())
            .map_err(|e| SunError::Computation(e.to_string()))?;

        let result = spa::sunrise_sunset_for_horizon(
            noon,
            location.latitude,
            location.longitude,
            delta_t,
            Horizon::SunriseSunset,
        )
        .map_err(|e| SunError::Computation(e.to_string()))?;

        match result {
            SunriseResult::RegularDay {
                sunrise, sunset, ..
            } => Ok(SunTimes {
                date,
                sunrise: sunrise.naive_local(),
                sunset: sunset.naive_local(),
            }),
            SunriseResult::AllDay { .. } => Err(SunError::PolarDay {
                location: location.name.clone(),
                date,
            }),
            SunriseResult::AllNight { .. } => Err(SunError::PolarNight {
                location: location.name.clone(),
                date,
            }),
        }
    }
}

fn local_noon(tz: Tz, date: NaiveDate) -> Result<DateTime<Tz>, SunError> {
    let naive = date
        .and_hms_opt(12, 0, 0)
        .ok_or_else(|| SunError::Computation(format!("no noon on {date}")))?;
    tz.from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| SunError::Computation(format!("noon on {date} does not exist in {tz}")))
}
