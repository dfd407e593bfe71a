//! Request form submitted by the web front end, and its validation into a
//! [`TideQuery`].
//!
//! The engine assumes clean enum inputs, so unknown weekday names, tide types
//! and time-of-day values are rejected here.

use crate::{weekday_from_name, TideQuery, TimeOfDay, UnknownVariant};
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum FormError {
    #[error(transparent)]
    UnknownVariant(#[from] UnknownVariant),

    #[error("invalid tide height {0:?}")]
    InvalidHeight(String),
}

/// Tide height as sent by the browser: a JSON number or a numeric string.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum HeightInput {
    Number(f64),
    Text(String),
}

impl HeightInput {
    fn feet(&self) -> Result<f64, FormError> {
        let value = match self {
            HeightInput::Number(n) => *n,
            HeightInput::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| FormError::InvalidHeight(s.clone()))?,
        };
        if value.is_finite() {
            Ok(value)
        } else {
            Err(FormError::InvalidHeight(value.to_string()))
        }
    }
}

/// JSON body of `POST /submit-form`.
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SubmitForm {
    pub location: String,
    pub tide_height: HeightInput,
    pub begin_date: String,
    pub end_date: String,
    /// Full weekday names, e.g. `["Saturday", "Sunday"]`
    #[serde(default)]
    pub days: Vec<String>,
    /// "High" or "Low"
    pub tide_type: String,
    /// "Daylight", "Night" or "Any"; absent means "Any"
    #[serde(default)]
    pub time_of_day: Option<String>,
}

impl SubmitForm {
    pub fn into_query(self) -> Result<TideQuery, FormError> {
        let threshold_ft = self.tide_height.feet()?;
        let weekdays = self
            .days
            .iter()
            .map(|name| weekday_from_name(name))
            .collect::<Result<Vec<_>, _>>()?;
        let tide_type = self.tide_type.parse()?;
        let time_of_day = match self.time_of_day.as_deref() {
            Some(value) => value.parse()?,
            None => TimeOfDay::Any,
        };

        Ok(TideQuery {
            location: self.location,
            threshold_ft,
            begin_date: self.begin_date,
            end_date: self.end_date,
            weekdays,
            tide_type,
            time_of_day,
        })
    }
}
