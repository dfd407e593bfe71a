//! # Result Table Rendering
//!
//! Plain-text rendering of result rows for the `--stdout` development mode, so
//! a query can be checked from a terminal without the web front end.
//!
//! Columns match the JSON keys the server returns.

use crate::ResultRow;

const HEADERS: [&str; 5] = [
    "Tide Time",
    "Day of the week",
    "Tide height (ft)",
    "Sunrise",
    "Sunset",
];

/// Render rows as an aligned text table with a header and separator line.
///
/// An empty slice renders a single "no matching tides" line instead of an
/// empty table.
pub fn render_table(rows: &[ResultRow]) -> String {
    if rows.is_empty() {
        return "No matching tides\n".to_string();
    }

    let cells: Vec<[String; 5]> = rows
        .iter()
        .map(|row| {
            [
                row.tide_time.clone(),
                row.weekday.clone(),
                format!("{:.2}", row.height_ft),
                row.sunrise.clone(),
                row.sunset.clone(),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(str::len);
    for line in &cells {
        for (width, cell) in widths.iter_mut().zip(line) {
            *width = (*width).max(cell.len());
        }
    }

    let mut out = String::new();
    push_line(&mut out, &HEADERS.map(str::to_string), &widths);
    let separator = widths.map(|w| "-".repeat(w));
    push_line(&mut out, &separator, &widths);
    for line in &cells {
        push_line(&mut out, line, &widths);
    }
    out
}

fn push_line(out: &mut String, cells: &[String; 5], widths: &[usize; 5]) {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths.iter().copied())
        .enumerate()
        .map(|(i, (cell, width))| {
            // Heights are right-aligned, everything else left-aligned
            if i == 2 {
                format!("{cell:>width$}")
            } else {
                format!("{cell:<width$}")
            }
        })
        .collect();
    out.push_str(padded.join("  ").trim_end());
    out.push('\n');
}
