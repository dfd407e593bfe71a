//! # End-to-End Filtering Scenarios
//!
//! These tests run [`TideFilterEngine::analyze`] against a stub tide source and
//! a stub sun calculator, so every expectation below can be worked out by hand
//! from the fixture. The stubs count their calls, which is how lookup-before-
//! fetch and once-per-date sun computation are verified.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Weekday};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tide_finder_lib::analysis::{in_time_window, AnalysisError, TideFilterEngine};
use tide_finder_lib::locations::{LocationCatalog, LocationRecord};
use tide_finder_lib::solar::{SunCalculator, SunError};
use tide_finder_lib::tide_data::{TideError, TideSource};
use tide_finder_lib::{ResultRow, SunTimes, TideEvent, TideKind, TideQuery, TimeOfDay};

/// What the stub tide source answers with.
enum Answer {
    Events(Vec<TideEvent>),
    NoData,
    Provider(&'static str),
}

struct StubTides {
    answer: Answer,
    requests: Mutex<Vec<(String, String, String)>>,
}

impl StubTides {
    fn new(answer: Answer) -> Self {
        Self {
            answer,
            requests: Mutex::new(Vec::new()),
        }
    }

    fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl TideSource for StubTides {
    fn fetch(
        &self,
        station_id: &str,
        begin_date: &str,
        end_date: &str,
    ) -> impl Future<Output = Result<Vec<TideEvent>, TideError>> + Send {
        self.requests.lock().unwrap().push((
            station_id.to_string(),
            begin_date.to_string(),
            end_date.to_string(),
        ));
        let result = match &self.answer {
            Answer::Events(events) => Ok(events.clone()),
            Answer::NoData => Err(TideError::NoData),
            Answer::Provider(message) => Err(TideError::Provider(message.to_string())),
        };
        async move { result }
    }
}

/// Fixed 07:00 sunrise / 17:00 sunset on every date, counting calls.
struct CountingSun {
    calls: AtomicUsize,
    dates: Mutex<Vec<NaiveDate>>,
    polar: bool,
}

impl CountingSun {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            dates: Mutex::new(Vec::new()),
            polar: false,
        }
    }

    fn polar() -> Self {
        Self {
            polar: true,
            ..Self::new()
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SunCalculator for CountingSun {
    fn compute(&self, location: &LocationRecord, date: NaiveDate) -> Result<SunTimes, SunError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.dates.lock().unwrap().push(date);
        if self.polar {
            return Err(SunError::PolarNight {
                location: location.name.clone(),
                date,
            });
        }
        Ok(SunTimes {
            date,
            sunrise: date.and_hms_opt(7, 0, 0).unwrap(),
            sunset: date.and_hms_opt(17, 0, 0).unwrap(),
        })
    }
}

fn at(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
}

fn tide(s: &str, height_ft: f64, kind: TideKind) -> TideEvent {
    TideEvent {
        timestamp: at(s),
        height_ft,
        kind,
    }
}

/// Eight high/low events around the 2024-11-06..09 query window.
/// 2024-11-08 is a Friday, 2024-11-09 a Saturday, 2024-11-10 a Sunday.
fn fixture() -> Vec<TideEvent> {
    vec![
        tide("2024-11-08 05:10", 6.9, TideKind::High),
        tide("2024-11-08 11:20", 0.5, TideKind::Low),
        tide("2024-11-09 05:59", 6.6, TideKind::High),
        tide("2024-11-09 06:30", -0.2, TideKind::Low),
        tide("2024-11-09 10:12", 6.8, TideKind::High),
        tide("2024-11-09 16:30", 1.1, TideKind::Low),
        tide("2024-11-09 17:59", 6.5, TideKind::High),
        // Outside the requested range; must never be reported
        tide("2024-11-10 11:00", 7.2, TideKind::High),
    ]
}

fn all_days() -> Vec<Weekday> {
    vec![
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ]
}

fn weekend_daylight_query() -> TideQuery {
    TideQuery {
        location: "San Francisco, CA".into(),
        threshold_ft: 6.5,
        begin_date: "2024-11-06".into(),
        end_date: "2024-11-09".into(),
        weekdays: vec![Weekday::Sat, Weekday::Sun],
        tide_type: TideKind::High,
        time_of_day: TimeOfDay::Daylight,
    }
}

fn build_engine(tides: StubTides, sun: CountingSun) -> TideFilterEngine<StubTides, CountingSun> {
    TideFilterEngine::new(LocationCatalog::builtin(), tides, sun)
}

fn times(rows: &[ResultRow]) -> Vec<&str> {
    rows.iter().map(|r| r.tide_time.as_str()).collect()
}

#[tokio::test]
async fn weekend_daylight_high_tides_in_san_francisco() {
    let engine = build_engine(StubTides::new(Answer::Events(fixture())), CountingSun::new());

    let rows = engine.analyze(&weekend_daylight_query()).await.unwrap();

    // 05:59 is before sunrise - 1h; 17:59 is just inside sunset + 1h
    assert_eq!(times(&rows), vec!["2024-11-09 10:12", "2024-11-09 17:59"]);
    let first = &rows[0];
    assert_eq!(first.weekday, "Saturday");
    assert_eq!(first.height_ft, 6.8);
    assert_eq!(first.sunrise, "2024-11-09 07:00");
    assert_eq!(first.sunset, "2024-11-09 17:00");
}

#[tokio::test]
async fn station_and_compact_dates_are_sent_to_source() {
    let engine = build_engine(StubTides::new(Answer::Events(fixture())), CountingSun::new());

    engine.analyze(&weekend_daylight_query()).await.unwrap();

    let tides = engine.tide_source();
    let requests = tides.requests.lock().unwrap();
    assert_eq!(
        *requests,
        vec![(
            "9414290".to_string(),
            "20241106".to_string(),
            "20241109".to_string()
        )]
    );
}

#[tokio::test]
async fn sun_times_are_computed_once_per_date() {
    let sun = CountingSun::new();
    let engine = build_engine(StubTides::new(Answer::Events(fixture())), sun);
    let query = TideQuery {
        tide_type: TideKind::Low,
        threshold_ft: 10.0,
        weekdays: all_days(),
        time_of_day: TimeOfDay::Any,
        ..weekend_daylight_query()
    };

    let rows = engine.analyze(&query).await.unwrap();

    // Three lows over two dates
    assert_eq!(rows.len(), 3);
    let sun = engine.sun_calculator();
    assert_eq!(sun.calls(), 2);
    let dates = sun.dates.lock().unwrap();
    assert_eq!(
        *dates,
        vec![
            NaiveDate::from_ymd_opt(2024, 11, 8).unwrap(),
            NaiveDate::from_ymd_opt(2024, 11, 9).unwrap(),
        ]
    );
}

#[tokio::test]
async fn sun_is_only_computed_for_stage_one_survivors() {
    let engine = build_engine(StubTides::new(Answer::Events(fixture())), CountingSun::new());

    engine.analyze(&weekend_daylight_query()).await.unwrap();

    // Only Saturday highs survive stage 1, all on one date
    assert_eq!(engine.sun_calculator().calls(), 1);
}

#[tokio::test]
async fn empty_weekday_set_yields_nothing() {
    let engine = build_engine(StubTides::new(Answer::Events(fixture())), CountingSun::new());
    let query = TideQuery {
        weekdays: vec![],
        time_of_day: TimeOfDay::Any,
        threshold_ft: -100.0,
        ..weekend_daylight_query()
    };

    let rows = engine.analyze(&query).await.unwrap();

    assert!(rows.is_empty());
    assert_eq!(engine.sun_calculator().calls(), 0);
}

#[tokio::test]
async fn unknown_location_fails_before_any_external_call() {
    let engine = build_engine(StubTides::new(Answer::Events(fixture())), CountingSun::new());
    let query = TideQuery {
        location: "Atlantis, XX".into(),
        ..weekend_daylight_query()
    };

    let err = engine.analyze(&query).await.unwrap_err();

    assert!(matches!(err, AnalysisError::LocationNotFound(name) if name == "Atlantis, XX"));
    assert_eq!(engine.tide_source().request_count(), 0);
    assert_eq!(engine.sun_calculator().calls(), 0);
}

#[tokio::test]
async fn invalid_date_fails_before_fetch() {
    let engine = build_engine(StubTides::new(Answer::Events(fixture())), CountingSun::new());
    let query = TideQuery {
        end_date: "2024/11/09".into(),
        ..weekend_daylight_query()
    };

    let err = engine.analyze(&query).await.unwrap_err();

    assert!(matches!(err, AnalysisError::InvalidDateFormat { value, .. } if value == "2024/11/09"));
    assert_eq!(engine.tide_source().request_count(), 0);
}

#[tokio::test]
async fn any_time_of_day_keeps_every_stage_one_event() {
    let engine = build_engine(StubTides::new(Answer::Events(fixture())), CountingSun::new());
    let query = TideQuery {
        weekdays: all_days(),
        time_of_day: TimeOfDay::Any,
        ..weekend_daylight_query()
    };

    let rows = engine.analyze(&query).await.unwrap();

    assert_eq!(
        times(&rows),
        vec![
            "2024-11-08 05:10",
            "2024-11-09 05:59",
            "2024-11-09 10:12",
            "2024-11-09 17:59",
        ]
    );
}

#[tokio::test]
async fn night_low_tides_exclude_twilight() {
    let engine = build_engine(StubTides::new(Answer::Events(fixture())), CountingSun::new());
    let query = TideQuery {
        tide_type: TideKind::Low,
        threshold_ft: 2.0,
        weekdays: all_days(),
        time_of_day: TimeOfDay::Night,
        ..weekend_daylight_query()
    };

    let rows = engine.analyze(&query).await.unwrap();

    // Inner day window is (08:00, 16:00); 11:20 falls inside it
    assert_eq!(times(&rows), vec!["2024-11-09 06:30", "2024-11-09 16:30"]);
}

#[tokio::test]
async fn every_row_satisfies_the_query() {
    let fixture = fixture();
    for tide_type in [TideKind::High, TideKind::Low] {
        for time_of_day in [TimeOfDay::Daylight, TimeOfDay::Night, TimeOfDay::Any] {
            for threshold_ft in [-1.0, 0.5, 6.5, 7.0] {
                let engine = build_engine(
                    StubTides::new(Answer::Events(fixture.clone())),
                    CountingSun::new(),
                );
                let query = TideQuery {
                    tide_type,
                    time_of_day,
                    threshold_ft,
                    weekdays: vec![Weekday::Fri, Weekday::Sat],
                    ..weekend_daylight_query()
                };

                let rows = engine.analyze(&query).await.unwrap();

                for row in &rows {
                    let when = at(&row.tide_time);
                    match tide_type {
                        TideKind::High => assert!(row.height_ft >= threshold_ft),
                        TideKind::Low => assert!(row.height_ft <= threshold_ft),
                    }
                    assert!(query.weekdays.contains(&when.weekday()));
                    assert!(when.date() <= NaiveDate::from_ymd_opt(2024, 11, 9).unwrap());
                    let sun = SunTimes {
                        date: when.date(),
                        sunrise: at(&row.sunrise),
                        sunset: at(&row.sunset),
                    };
                    assert!(in_time_window(when.time(), &sun, time_of_day));
                }
                // Distinct dates bound the sun calls
                assert!(engine.sun_calculator().calls() <= 2);
            }
        }
    }
}

#[tokio::test]
async fn analyze_is_idempotent() {
    let engine = build_engine(StubTides::new(Answer::Events(fixture())), CountingSun::new());
    let query = weekend_daylight_query();

    let first = engine.analyze(&query).await.unwrap();
    let second = engine.analyze(&query).await.unwrap();

    assert_eq!(first, second);
    // Memoization is per query, not shared across queries
    assert_eq!(engine.sun_calculator().calls(), 2);
}

#[tokio::test]
async fn no_data_is_an_empty_answer() {
    let engine = build_engine(StubTides::new(Answer::NoData), CountingSun::new());

    let rows = engine.analyze(&weekend_daylight_query()).await.unwrap();

    assert!(rows.is_empty());
    assert_eq!(engine.sun_calculator().calls(), 0);
}

#[tokio::test]
async fn provider_failure_is_surfaced() {
    let engine = build_engine(
        StubTides::new(Answer::Provider("Station ID is invalid")),
        CountingSun::new(),
    );

    let err = engine.analyze(&weekend_daylight_query()).await.unwrap_err();

    assert!(matches!(
        err,
        AnalysisError::SourceUnavailable(TideError::Provider(_))
    ));
}

#[tokio::test]
async fn polar_dates_fail_the_query() {
    let engine = build_engine(StubTides::new(Answer::Events(fixture())), CountingSun::polar());

    let err = engine.analyze(&weekend_daylight_query()).await.unwrap_err();

    assert!(matches!(
        err,
        AnalysisError::Computation(SunError::PolarNight { .. })
    ));
}

