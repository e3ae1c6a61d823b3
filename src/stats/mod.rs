//! Aggregation helpers shared by the per-family stats functions.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate};
use serde::Serialize;

/// Months shown in trend charts.
pub const TREND_MONTHS: usize = 6;

/// Round to two decimals.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `part / total * 100` rounded to two decimals, `0.0` when `total` is zero.
pub fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round2(part as f64 / total as f64 * 100.0)
}

/// Same as [`percentage`] for amounts.
pub fn ratio_percent(part: f64, total: f64) -> f64 {
    if total <= 0.0 {
        return 0.0;
    }
    round2(part / total * 100.0)
}

/// Mean rounded to two decimals, `0.0` for an empty input.
pub fn average<I>(values: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        return 0.0;
    }
    round2(sum / count as f64)
}

/// Count occurrences of each key.
pub fn breakdown<I, K>(keys: I) -> BTreeMap<String, usize>
where
    I: IntoIterator<Item = K>,
    K: AsRef<str>,
{
    let mut counts = BTreeMap::new();
    for key in keys {
        *counts.entry(key.as_ref().to_string()).or_insert(0) += 1;
    }
    counts
}

/// Parse an RFC 3339 timestamp or a plain `YYYY-MM-DD` date.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.date_naive());
    }
    NaiveDate::parse_from_str(value.get(..10)?, "%Y-%m-%d").ok()
}

/// `"YYYY-MM"` month key of a date string.
pub fn month_key(value: &str) -> Option<String> {
    parse_date(value).map(|d| d.format("%Y-%m").to_string())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyCount {
    pub month: String,
    pub count: usize,
}

/// Group dates by month and keep the latest `months` entries, oldest first.
/// Unparsable dates are skipped.
pub fn monthly_trend<I, S>(dates: I, months: usize) -> Vec<MonthlyCount>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let grouped = breakdown(dates.into_iter().filter_map(|d| month_key(d.as_ref())));
    let skip = grouped.len().saturating_sub(months);
    grouped
        .into_iter()
        .skip(skip)
        .map(|(month, count)| MonthlyCount { month, count })
        .collect()
}

/// Sort newest first by a date string; unparsable dates sort last.
pub fn sort_by_date_desc<T, F>(items: &mut [T], date_of: F)
where
    F: Fn(&T) -> &str,
{
    items.sort_by(|a, b| parse_date(date_of(b)).cmp(&parse_date(date_of(a))));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_rounds_and_handles_zero() {
        assert_eq!(percentage(1, 3), 33.33);
        assert_eq!(percentage(2, 3), 66.67);
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(5, 5), 100.0);
    }

    #[test]
    fn test_average() {
        assert_eq!(average(vec![1.0, 2.0, 4.0]), 2.33);
        assert_eq!(average(Vec::<f64>::new()), 0.0);
    }

    #[test]
    fn test_breakdown_sums_to_total() {
        let keys = ["dog", "cat", "dog", "rabbit", "dog"];
        let counts = breakdown(keys);
        assert_eq!(counts["dog"], 3);
        assert_eq!(counts.values().sum::<usize>(), keys.len());
    }

    #[test]
    fn test_month_key_accepts_both_formats() {
        assert_eq!(month_key("2024-03-15T10:00:00Z").as_deref(), Some("2024-03"));
        assert_eq!(month_key("2024-11-02").as_deref(), Some("2024-11"));
        assert_eq!(month_key("soon"), None);
    }

    #[test]
    fn test_monthly_trend_keeps_latest_months() {
        let dates = [
            "2024-01-05", "2024-02-05", "2024-03-05", "2024-04-05", "2024-05-05",
            "2024-06-05", "2024-07-05", "2024-07-20", "not-a-date",
        ];
        let trend = monthly_trend(dates, TREND_MONTHS);
        assert_eq!(trend.len(), 6);
        assert_eq!(trend[0].month, "2024-02");
        assert_eq!(
            trend[5],
            MonthlyCount {
                month: "2024-07".to_string(),
                count: 2
            }
        );
    }

    #[test]
    fn test_sort_by_date_desc() {
        let mut dates = vec!["2024-01-01", "bad", "2024-06-01", "2023-12-31"];
        sort_by_date_desc(&mut dates, |d| *d);
        assert_eq!(dates, vec!["2024-06-01", "2024-01-01", "2023-12-31", "bad"]);
    }
}
