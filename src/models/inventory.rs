//! Shelter supplies.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::repository::{Entity, Record};
use crate::stats::{breakdown, round2};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InventoryCategory {
    Food,
    Medical,
    Bedding,
    Toys,
    Cleaning,
    Other,
}

impl InventoryCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            InventoryCategory::Food => "food",
            InventoryCategory::Medical => "medical",
            InventoryCategory::Bedding => "bedding",
            InventoryCategory::Toys => "toys",
            InventoryCategory::Cleaning => "cleaning",
            InventoryCategory::Other => "other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub name: String,
    pub category: InventoryCategory,
    pub quantity: u32,
    pub unit: String,
    pub reorder_level: u32,
    #[serde(default)]
    pub unit_cost: f64,
    #[serde(default)]
    pub supplier: String,
    #[serde(default)]
    pub last_restocked: String,
}

impl InventoryItem {
    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.reorder_level
    }

    /// Add or remove stock. The quantity never goes below zero.
    pub fn adjust(&mut self, delta: i64) -> Result<u32, AppError> {
        let next = i64::from(self.quantity) + delta;
        if next < 0 {
            return Err(AppError::Validation(format!(
                "Only {} {} of {} in stock",
                self.quantity, self.unit, self.name
            )));
        }
        self.quantity = u32::try_from(next)
            .map_err(|_| AppError::Validation(format!("Quantity {} is too large", next)))?;
        Ok(self.quantity)
    }

    pub fn stock_value(&self) -> f64 {
        f64::from(self.quantity) * self.unit_cost
    }
}

impl Entity for InventoryItem {
    const ID_PREFIX: &'static str = "inv";
    const STORAGE_KEY: &'static str = "inventory_items";
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryStats {
    pub total_items: usize,
    pub low_stock: usize,
    pub out_of_stock: usize,
    pub total_value: f64,
    pub by_category: BTreeMap<String, usize>,
}

pub fn calculate_inventory_stats(items: &[Record<InventoryItem>]) -> InventoryStats {
    InventoryStats {
        total_items: items.len(),
        low_stock: items.iter().filter(|i| i.is_low_stock()).count(),
        out_of_stock: items.iter().filter(|i| i.quantity == 0).count(),
        total_value: round2(items.iter().map(|i| i.stock_value()).sum()),
        by_category: breakdown(items.iter().map(|i| i.category.as_str())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(quantity: u32, reorder_level: u32, unit_cost: f64) -> Record<InventoryItem> {
        Record::new(
            format!("inv-{}", quantity),
            InventoryItem {
                name: "Dry kibble".to_string(),
                category: InventoryCategory::Food,
                quantity,
                unit: "bags".to_string(),
                reorder_level,
                unit_cost,
                supplier: String::new(),
                last_restocked: String::new(),
            },
        )
    }

    #[test]
    fn test_adjust_refuses_negative_stock() {
        let mut kibble = item(3, 5, 1.0).fields;
        assert_eq!(kibble.adjust(-3).unwrap(), 0);
        assert!(matches!(kibble.adjust(-1), Err(AppError::Validation(_))));
        assert_eq!(kibble.adjust(10).unwrap(), 10);
    }

    #[test]
    fn test_inventory_stats() {
        let items = vec![item(0, 5, 10.0), item(4, 5, 2.5), item(20, 5, 1.25)];
        let stats = calculate_inventory_stats(&items);
        assert_eq!(stats.total_items, 3);
        assert_eq!(stats.low_stock, 2);
        assert_eq!(stats.out_of_stock, 1);
        assert_eq!(stats.total_value, 35.0);
        assert_eq!(stats.by_category["food"], 3);
    }
}
