//! # Tide Finder Core Library
//!
//! This library answers one question: "at this stretch of coast, between these
//! dates, on these days of the week, when is the tide high (or low) enough, and
//! does it happen in daylight or at night?"
//!
//! ## Data Flow
//! 1. **Lookup**: resolve the location name to a NOAA station via [`locations`]
//! 2. **Fetch**: download high/low predictions for the date range via [`tide_data`]
//! 3. **Filter**: keep events of the requested type, height and weekday
//! 4. **Annotate**: compute sunrise/sunset once per surviving date via [`solar`]
//! 5. **Classify**: keep events inside the requested daylight/night window
//!
//! Steps 3-5 live in [`analysis`]; everything else is an adapter that the
//! engine receives by injection, so tests can swap in fixtures.
//!
//! ## Core Types
//! - [`TideQuery`]: what the caller asked for
//! - [`TideEvent`]: one predicted high or low water
//! - [`SunTimes`]: sunrise and sunset for one calendar date
//! - [`ResultRow`]: one matching event, formatted for display

use chrono::{NaiveDate, NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub mod analysis;
pub mod config;
pub mod form;
pub mod locations;
pub mod renderer;
pub mod server;
pub mod solar;
pub mod tide_data;

pub use locations::{LocationCatalog, LocationRecord};

/// Display format shared by tide times and sunrise/sunset in result rows.
pub const ROW_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Returned when a caller-supplied enum name is not recognized.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unrecognized {field}: {value:?}")]
pub struct UnknownVariant {
    pub field: &'static str,
    pub value: String,
}

/// Whether a tide event is a high or a low water.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TideKind {
    High,
    Low,
}

impl TideKind {
    /// Single-letter code used by NOAA in the `type` field ("H" / "L").
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "H" => Some(TideKind::High),
            "L" => Some(TideKind::Low),
            _ => None,
        }
    }
}

impl FromStr for TideKind {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "High" => Ok(TideKind::High),
            "Low" => Ok(TideKind::Low),
            other => Err(UnknownVariant {
                field: "tide type",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for TideKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TideKind::High => write!(f, "High"),
            TideKind::Low => write!(f, "Low"),
        }
    }
}

/// Which part of the day a matching tide must fall in.
///
/// Daylight and Night are both widened/narrowed by a one-hour twilight buffer;
/// see [`analysis::in_time_window`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeOfDay {
    Daylight,
    Night,
    Any,
}

impl FromStr for TimeOfDay {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Daylight" => Ok(TimeOfDay::Daylight),
            "Night" => Ok(TimeOfDay::Night),
            "Any" => Ok(TimeOfDay::Any),
            other => Err(UnknownVariant {
                field: "time of day",
                value: other.to_string(),
            }),
        }
    }
}

/// A validated request for matching tide events.
///
/// Dates are kept in the caller's ISO form (`YYYY-MM-DD`); the engine parses
/// them and reports `InvalidDateFormat` itself. `begin_date <= end_date` is
/// assumed, not checked.
#[derive(Clone, Debug, PartialEq)]
pub struct TideQuery {
    /// Exact catalog name, e.g. "San Francisco, CA"
    pub location: String,
    /// Minimum height for High, maximum height for Low (feet, MLLW)
    pub threshold_ft: f64,
    pub begin_date: String,
    pub end_date: String,
    /// Days of the week to keep; an empty set matches nothing
    pub weekdays: Vec<Weekday>,
    pub tide_type: TideKind,
    pub time_of_day: TimeOfDay,
}

/// One predicted high or low water, in station local time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TideEvent {
    pub timestamp: NaiveDateTime,
    pub height_ft: f64,
    pub kind: TideKind,
}

/// Sunrise and sunset for one calendar date, in the location's local time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SunTimes {
    pub date: NaiveDate,
    pub sunrise: NaiveDateTime,
    pub sunset: NaiveDateTime,
}

/// One tide event that passed every filter, ready for display.
///
/// Field names serialize to the column headers the web front end renders.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    #[serde(rename = "Tide Time")]
    pub tide_time: String,
    #[serde(rename = "Day of the week")]
    pub weekday: String,
    #[serde(rename = "Tide height (ft)")]
    pub height_ft: f64,
    #[serde(rename = "Sunrise")]
    pub sunrise: String,
    #[serde(rename = "Sunset")]
    pub sunset: String,
}

/// Full English weekday name ("Saturday"), as shown in result rows.
pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Map a full weekday name to its day; Monday is index 0, Sunday index 6.
pub fn weekday_from_name(name: &str) -> Result<Weekday, UnknownVariant> {
    match name {
        "Monday" => Ok(Weekday::Mon),
        "Tuesday" => Ok(Weekday::Tue),
        "Wednesday" => Ok(Weekday::Wed),
        "Thursday" => Ok(Weekday::Thu),
        "Friday" => Ok(Weekday::Fri),
        "Saturday" => Ok(Weekday::Sat),
        "Sunday" => Ok(Weekday::Sun),
        other => Err(UnknownVariant {
            field: "weekday",
            value: other.to_string(),
        }),
    }
}
