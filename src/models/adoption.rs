//! Completed adoptions, the source of the adoption analytics dashboard.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::PetType;
use crate::repository::{Entity, Record};
use crate::stats::{
    average, breakdown, monthly_trend, percentage, round2, MonthlyCount, TREND_MONTHS,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdoptionRecord {
    pub pet_id: String,
    pub pet_name: String,
    pub pet_type: PetType,
    pub adopter_id: String,
    pub adopted_at: String,
    pub days_in_shelter: u32,
    #[serde(default)]
    pub adoption_fee: f64,
    #[serde(default)]
    pub returned: bool,
}

impl Entity for AdoptionRecord {
    const ID_PREFIX: &'static str = "adopt";
    const STORAGE_KEY: &'static str = "adoption_records";

    fn on_create(&mut self, now: &str) {
        if self.adopted_at.is_empty() {
            self.adopted_at = now.to_string();
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdoptionAnalytics {
    pub total_adoptions: usize,
    pub by_pet_type: BTreeMap<String, usize>,
    pub monthly_trend: Vec<MonthlyCount>,
    pub average_days_in_shelter: f64,
    pub total_fees: f64,
    pub returned: usize,
    pub return_rate: f64,
}

pub fn calculate_adoption_analytics(records: &[Record<AdoptionRecord>]) -> AdoptionAnalytics {
    let returned = records.iter().filter(|r| r.returned).count();

    AdoptionAnalytics {
        total_adoptions: records.len(),
        by_pet_type: breakdown(records.iter().map(|r| r.pet_type.as_str())),
        monthly_trend: monthly_trend(records.iter().map(|r| r.adopted_at.as_str()), TREND_MONTHS),
        average_days_in_shelter: average(records.iter().map(|r| f64::from(r.days_in_shelter))),
        total_fees: round2(records.iter().map(|r| r.adoption_fee).sum()),
        returned,
        return_rate: percentage(returned, records.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(
        pet_type: PetType,
        adopted_at: &str,
        days: u32,
        returned: bool,
    ) -> Record<AdoptionRecord> {
        Record::new(
            format!("adopt-{}", adopted_at),
            AdoptionRecord {
                pet_id: "pet-1".to_string(),
                pet_name: "Milo".to_string(),
                pet_type,
                adopter_id: "user-1".to_string(),
                adopted_at: adopted_at.to_string(),
                days_in_shelter: days,
                adoption_fee: 75.5,
                returned,
            },
        )
    }

    #[test]
    fn test_adoption_analytics() {
        let records = vec![
            record(PetType::Dog, "2024-01-10", 10, false),
            record(PetType::Dog, "2024-01-22", 20, true),
            record(PetType::Cat, "2024-02-03", 31, false),
        ];
        let analytics = calculate_adoption_analytics(&records);

        assert_eq!(analytics.total_adoptions, 3);
        assert_eq!(analytics.by_pet_type["Dog"], 2);
        assert_eq!(analytics.monthly_trend.len(), 2);
        assert_eq!(analytics.monthly_trend[0].count, 2);
        assert_eq!(analytics.average_days_in_shelter, 20.33);
        assert_eq!(analytics.total_fees, 226.5);
        assert_eq!(analytics.return_rate, 33.33);
    }

    #[test]
    fn test_adoption_analytics_empty() {
        let analytics = calculate_adoption_analytics(&[]);
        assert_eq!(analytics.total_adoptions, 0);
        assert_eq!(analytics.return_rate, 0.0);
        assert!(analytics.monthly_trend.is_empty());
    }
}
