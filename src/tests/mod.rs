//! Scenario tests driving the full pipeline through test doubles.

mod analysis_tests;
