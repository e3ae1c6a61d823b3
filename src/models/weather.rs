//! Weather reports used to plan outdoor activity.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::repository::{Entity, Record};
use crate::stats::{average, breakdown, sort_by_date_desc};

/// Above this temperature (Celsius) outdoor time is restricted.
pub const HEAT_LIMIT_C: f64 = 30.0;
/// Below this temperature (Celsius) outdoor time is restricted.
pub const COLD_LIMIT_C: f64 = -5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    Sunny,
    Cloudy,
    Rainy,
    Stormy,
    Snowy,
}

impl Condition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::Sunny => "sunny",
            Condition::Cloudy => "cloudy",
            Condition::Rainy => "rainy",
            Condition::Stormy => "stormy",
            Condition::Snowy => "snowy",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherReport {
    pub location: String,
    pub date: String,
    pub temperature_c: f64,
    pub condition: Condition,
    #[serde(default)]
    pub humidity: u8,
    #[serde(default)]
    pub wind_kph: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutdoorSafety {
    pub safe: bool,
    pub warnings: Vec<String>,
}

impl WeatherReport {
    pub fn outdoor_safety(&self) -> OutdoorSafety {
        let mut warnings = Vec::new();
        if self.temperature_c > HEAT_LIMIT_C {
            warnings.push(format!(
                "Heat: {:.1}°C, limit walks and provide shade and water",
                self.temperature_c
            ));
        }
        if self.temperature_c < COLD_LIMIT_C {
            warnings.push(format!(
                "Cold: {:.1}°C, keep short-coated animals indoors",
                self.temperature_c
            ));
        }
        if matches!(self.condition, Condition::Stormy | Condition::Snowy) {
            warnings.push(format!(
                "{} conditions, avoid outdoor activity",
                self.condition.as_str()
            ));
        }
        if let Some(alert) = &self.alert {
            warnings.push(format!("Weather alert: {}", alert));
        }

        OutdoorSafety {
            safe: warnings.is_empty(),
            warnings,
        }
    }
}

impl Entity for WeatherReport {
    const ID_PREFIX: &'static str = "wx";
    const STORAGE_KEY: &'static str = "weather_reports";
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherStats {
    pub reports: usize,
    pub average_temperature_c: f64,
    pub unsafe_days: usize,
    pub by_condition: BTreeMap<String, usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest: Option<Record<WeatherReport>>,
}

pub fn calculate_weather_stats(reports: &[Record<WeatherReport>]) -> WeatherStats {
    let mut sorted = reports.to_vec();
    sort_by_date_desc(&mut sorted, |r| r.date.as_str());

    WeatherStats {
        reports: reports.len(),
        average_temperature_c: average(reports.iter().map(|r| r.temperature_c)),
        unsafe_days: reports.iter().filter(|r| !r.outdoor_safety().safe).count(),
        by_condition: breakdown(reports.iter().map(|r| r.condition.as_str())),
        latest: sorted.into_iter().next(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(date: &str, temperature_c: f64, condition: Condition) -> Record<WeatherReport> {
        Record::new(
            format!("wx-{}", date),
            WeatherReport {
                location: "Portland".to_string(),
                date: date.to_string(),
                temperature_c,
                condition,
                humidity: 60,
                wind_kph: 10.0,
                alert: None,
            },
        )
    }

    #[test]
    fn test_outdoor_safety() {
        assert!(report("2024-06-01", 22.0, Condition::Sunny).outdoor_safety().safe);
        assert!(!report("2024-06-01", 30.5, Condition::Sunny).outdoor_safety().safe);
        assert!(!report("2024-01-01", -6.0, Condition::Cloudy).outdoor_safety().safe);
        assert!(!report("2024-06-01", 18.0, Condition::Stormy).outdoor_safety().safe);

        let mut alerted = report("2024-06-01", 18.0, Condition::Rainy);
        alerted.alert = Some("Flood watch".to_string());
        let safety = alerted.outdoor_safety();
        assert_eq!(safety.warnings, vec!["Weather alert: Flood watch".to_string()]);
    }

    #[test]
    fn test_weather_stats() {
        let reports = vec![
            report("2024-06-01", 20.0, Condition::Sunny),
            report("2024-06-03", 32.0, Condition::Sunny),
            report("2024-06-02", 17.0, Condition::Rainy),
        ];
        let stats = calculate_weather_stats(&reports);
        assert_eq!(stats.reports, 3);
        assert_eq!(stats.average_temperature_c, 23.0);
        assert_eq!(stats.unsafe_days, 1);
        assert_eq!(stats.latest.unwrap().date, "2024-06-03");
    }
}
