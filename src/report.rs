//! # Hazard Table Rendering
//!
//! Terminal output for a [`HazardTable`]: one row per full hour with the
//! marine inputs and the three hazard levels, followed by the worst level of
//! each day. Undefined values print as `-`.

use crate::{HazardLevel, HazardRecord, HazardTable};
use chrono::{NaiveDate, Timelike};
use std::collections::BTreeMap;
use std::fmt::Write;

fn level_char(level: Option<HazardLevel>) -> char {
    level
        .and_then(|l| char::from_digit(l.as_u8() as u32, 10))
        .unwrap_or('-')
}

fn format_opt(value: Option<f64>, width: usize, precision: usize) -> String {
    match value {
        Some(v) => format!("{v:>width$.precision$}"),
        None => format!("{:>width$}", "-"),
    }
}

fn format_row(record: &HazardRecord) -> String {
    format!(
        "{}  {:>5.2}  {:>+6.2}  {}    {}    {}    {}",
        record.time.format("%a %d %H:%M"),
        record.conditions.hs,
        record.conditions.eta,
        format_opt(record.attendance_pct, 5, 0),
        level_char(record.attendance_level),
        level_char(record.rip_level),
        level_char(record.shorebreak_level),
    )
}

/// Worst (attendance, rip, shore-break) level per day.
fn daily_maxima(
    table: &HazardTable,
) -> BTreeMap<NaiveDate, [Option<HazardLevel>; 3]> {
    let mut days: BTreeMap<NaiveDate, [Option<HazardLevel>; 3]> = BTreeMap::new();
    for record in &table.records {
        let day = days.entry(record.time.date()).or_default();
        let levels = [
            record.attendance_level,
            record.rip_level,
            record.shorebreak_level,
        ];
        for (max, level) in day.iter_mut().zip(levels) {
            *max = (*max).max(level);
        }
    }
    days
}

/// Render the table as text.
pub fn format_report(table: &HazardTable) -> String {
    let mut out = String::new();

    if table.tide_offline {
        out.push_str("⚠ TIDE OFFLINE: synthetic tide, levels are indicative only\n\n");
    }
    if table.is_empty() {
        out.push_str("No forecast points.\n");
        return out;
    }

    out.push_str("time             Hs(m)  eta(m)  att%  ATT  RIP  SHB\n");
    for record in table.records.iter().filter(|r| r.time.minute() == 0) {
        // Infallible for String
        let _ = writeln!(out, "{}", format_row(record));
    }

    out.push_str("\nday         ATT  RIP  SHB\n");
    for (day, [att, rip, shb]) in daily_maxima(table) {
        let _ = writeln!(
            out,
            "{}  {}    {}    {}",
            day.format("%a %d %b"),
            level_char(att),
            level_char(rip),
            level_char(shb)
        );
    }

    if !table.dropped.is_empty() {
        let _ = writeln!(
            out,
            "\n{} grid points dropped for missing input coverage",
            table.dropped.len()
        );
    }
    out
}

/// Render the hazard table to the terminal.
pub fn draw_ascii(table: &HazardTable) {
    print!("{}", format_report(table));
}
