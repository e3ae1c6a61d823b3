//! Weather reports and outdoor safety checks.

use crate::errors::AppError;
use crate::models::{calculate_weather_stats, Condition, OutdoorSafety, WeatherReport, WeatherStats};
use crate::repository::ids::counter_id;
use crate::repository::{JsonPatch, JsonRepository, Record};
use crate::stats::sort_by_date_desc;
use crate::store::Storage;

use super::require;

/// Weather reports for the shelter's locations.
#[derive(Clone)]
pub struct WeatherService {
    reports: JsonRepository<WeatherReport>,
}

impl WeatherService {
    pub fn new(storage: Storage) -> Self {
        Self::with_seed(storage, default_weather_reports())
    }

    pub fn with_seed(storage: Storage, seed: Vec<Record<WeatherReport>>) -> Self {
        Self {
            reports: JsonRepository::with_seed(storage, seed),
        }
    }

    pub async fn list_reports(&self) -> Result<Vec<Record<WeatherReport>>, AppError> {
        self.reports.list().await
    }

    pub async fn add_report(&self, report: WeatherReport) -> Result<String, AppError> {
        require(&report.location, "Location")?;
        if report.humidity > 100 {
            return Err(AppError::Validation(format!(
                "Humidity {} is out of range",
                report.humidity
            )));
        }
        self.reports.add(report).await
    }

    pub async fn update_report(
        &self,
        id: &str,
        patch: &JsonPatch,
    ) -> Result<Option<Record<WeatherReport>>, AppError> {
        self.reports.update(id, patch).await
    }

    pub async fn delete_report(&self, id: &str) -> Result<bool, AppError> {
        self.reports.delete(id).await
    }

    /// Most recent report for `location`, matched case-insensitively.
    pub async fn latest_for(
        &self,
        location: &str,
    ) -> Result<Option<Record<WeatherReport>>, AppError> {
        let mut reports = self
            .reports
            .filter(|r| r.location.eq_ignore_ascii_case(location))
            .await?;
        sort_by_date_desc(&mut reports, |r| r.date.as_str());
        Ok(reports.into_iter().next())
    }

    /// Safety of the latest report for `location`, if there is one.
    pub async fn outdoor_safety(&self, location: &str) -> Result<Option<OutdoorSafety>, AppError> {
        Ok(self.latest_for(location).await?.map(|r| r.outdoor_safety()))
    }

    pub async fn stats(&self) -> Result<WeatherStats, AppError> {
        Ok(calculate_weather_stats(&self.reports.list().await?))
    }
}

pub fn default_weather_reports() -> Vec<Record<WeatherReport>> {
    let rows = [
        ("Portland", "2024-05-20", 18.0, Condition::Cloudy, 72, 12.0, None),
        ("Portland", "2024-05-21", 24.5, Condition::Sunny, 48, 8.0, None),
        (
            "Portland",
            "2024-05-22",
            15.0,
            Condition::Stormy,
            90,
            46.0,
            Some("Wind advisory until 8 PM"),
        ),
        ("Salem", "2024-05-22", 31.5, Condition::Sunny, 30, 5.0, None),
    ];
    rows.into_iter()
        .enumerate()
        .map(|(i, (location, date, temperature_c, condition, humidity, wind_kph, alert))| {
            Record::new(
                counter_id("wx", i + 1),
                WeatherReport {
                    location: location.to_string(),
                    date: date.to_string(),
                    temperature_c,
                    condition,
                    humidity,
                    wind_kph,
                    alert: alert.map(str::to_string),
                },
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_latest_and_safety() {
        let service = WeatherService::new(Storage::in_memory());
        let latest = service.latest_for("portland").await.unwrap().unwrap();
        assert_eq!(latest.id, "wx-3");

        let safety = service.outdoor_safety("Portland").await.unwrap().unwrap();
        assert!(!safety.safe);
        assert_eq!(safety.warnings.len(), 2);
        assert!(service.outdoor_safety("Eugene").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_stats_over_seed() {
        let service = WeatherService::new(Storage::in_memory());
        let stats = service.stats().await.unwrap();
        assert_eq!(stats.reports, 4);
        assert_eq!(stats.unsafe_days, 2);
        assert_eq!(stats.average_temperature_c, 22.25);
    }
}
