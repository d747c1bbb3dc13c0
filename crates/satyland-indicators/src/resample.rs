//! Calendar resampling of daily (or monthly) bars.
//!
//! Each output bar takes the first open, max high, min low, last close and
//! summed volume of its group, stamped with the last constituent bar's
//! timestamp. Groups are consecutive runs of bars sharing a period key, so
//! the input must already be in ascending order.

use analysis_core::Bar;
use chrono::{DateTime, Datelike, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    /// ISO week
    Week,
    Month,
    Quarter,
    Year,
}

impl Period {
    /// Grouping key; distinct periods never share a key across years.
    fn key(&self, ts: &DateTime<Utc>) -> i32 {
        match self {
            Period::Week => {
                let week = ts.iso_week();
                week.year() * 100 + week.week() as i32
            }
            Period::Month => ts.year() * 100 + ts.month() as i32,
            Period::Quarter => ts.year() * 10 + ((ts.month() as i32 - 1) / 3 + 1),
            Period::Year => ts.year(),
        }
    }
}

/// Aggregate bars into one bar per calendar period.
pub fn resample(bars: &[Bar], period: Period) -> Vec<Bar> {
    let mut out: Vec<Bar> = Vec::new();
    let mut current: Option<(i32, Vec<&Bar>)> = None;

    for bar in bars {
        let key = period.key(&bar.timestamp);

        match &mut current {
            Some((k, group)) if *k == key => group.push(bar),
            _ => {
                // Flush previous period
                if let Some((_, group)) = current.take() {
                    out.extend(merge(&group));
                }
                current = Some((key, vec![bar]));
            }
        }
    }

    if let Some((_, group)) = current {
        out.extend(merge(&group));
    }

    out
}

fn merge(group: &[&Bar]) -> Option<Bar> {
    let first = group.first()?;
    let last = group.last()?;

    let high = group.iter().map(|b| b.high).fold(f64::MIN, f64::max);
    let low = group.iter().map(|b| b.low).fold(f64::MAX, f64::min);
    let volume: f64 = group.iter().map(|b| b.volume).sum();

    Some(Bar {
        timestamp: last.timestamp,
        open: first.open,
        high,
        low,
        close: last.close,
        volume,
    })
}

pub fn to_weekly(daily: &[Bar]) -> Vec<Bar> {
    resample(daily, Period::Week)
}

pub fn to_monthly(daily: &[Bar]) -> Vec<Bar> {
    resample(daily, Period::Month)
}

/// Quarterly bars; accepts daily or monthly input.
pub fn to_quarterly(bars: &[Bar]) -> Vec<Bar> {
    resample(bars, Period::Quarter)
}

pub fn to_yearly(bars: &[Bar]) -> Vec<Bar> {
    resample(bars, Period::Year)
}
