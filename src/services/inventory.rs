//! Supply inventory and stock adjustments.

use chrono::Utc;

use crate::errors::AppError;
use crate::models::{calculate_inventory_stats, InventoryCategory, InventoryItem, InventoryStats};
use crate::repository::ids::counter_id;
use crate::repository::{JsonPatch, JsonRepository, Record};
use crate::store::Storage;

use super::require;

/// Shelter supplies.
#[derive(Clone)]
pub struct InventoryService {
    items: JsonRepository<InventoryItem>,
}

impl InventoryService {
    pub fn new(storage: Storage) -> Self {
        Self::with_seed(storage, default_inventory())
    }

    pub fn with_seed(storage: Storage, seed: Vec<Record<InventoryItem>>) -> Self {
        Self {
            items: JsonRepository::with_seed(storage, seed),
        }
    }

    pub async fn list_items(&self) -> Result<Vec<Record<InventoryItem>>, AppError> {
        self.items.list().await
    }

    pub async fn get_item(&self, id: &str) -> Result<Option<Record<InventoryItem>>, AppError> {
        self.items.get(id).await
    }

    pub async fn add_item(&self, item: InventoryItem) -> Result<String, AppError> {
        require(&item.name, "Item name")?;
        require(&item.unit, "Unit")?;
        self.items.add(item).await
    }

    pub async fn update_item(
        &self,
        id: &str,
        patch: &JsonPatch,
    ) -> Result<Option<Record<InventoryItem>>, AppError> {
        self.items.update(id, patch).await
    }

    pub async fn delete_item(&self, id: &str) -> Result<bool, AppError> {
        self.items.delete(id).await
    }

    /// Add (`delta > 0`) or consume stock. Going below zero is a `Validation`
    /// error and leaves the item unchanged.
    pub async fn adjust_quantity(
        &self,
        id: &str,
        delta: i64,
    ) -> Result<Option<Record<InventoryItem>>, AppError> {
        let now = Utc::now().to_rfc3339();
        let updated = self
            .items
            .update_with(id, |item| {
                item.adjust(delta)?;
                if delta > 0 {
                    item.last_restocked = now;
                }
                Ok(())
            })
            .await?;

        if let Some(item) = &updated {
            if item.is_low_stock() {
                tracing::warn!(
                    "{} is low: {} {} left (reorder at {})",
                    item.name,
                    item.quantity,
                    item.unit,
                    item.reorder_level
                );
            }
        }
        Ok(updated)
    }

    pub async fn low_stock_items(&self) -> Result<Vec<Record<InventoryItem>>, AppError> {
        self.items.filter(|i| i.is_low_stock()).await
    }

    pub async fn stats(&self) -> Result<InventoryStats, AppError> {
        Ok(calculate_inventory_stats(&self.items.list().await?))
    }
}

pub fn default_inventory() -> Vec<Record<InventoryItem>> {
    let rows = [
        ("Adult dry dog food", InventoryCategory::Food, 40, "bags", 10, 38.0, "PetSupply Co"),
        ("Kitten wet food", InventoryCategory::Food, 6, "cases", 8, 24.5, "PetSupply Co"),
        ("Flea treatment", InventoryCategory::Medical, 15, "doses", 20, 12.0, "VetMed Direct"),
        ("Fleece blankets", InventoryCategory::Bedding, 55, "pieces", 15, 6.0, "Donated"),
        ("Disinfectant", InventoryCategory::Cleaning, 0, "gallons", 5, 18.75, "CleanPro"),
    ];
    rows.into_iter()
        .enumerate()
        .map(|(i, (name, category, quantity, unit, reorder_level, unit_cost, supplier))| {
            Record::new(
                counter_id("inv", i + 1),
                InventoryItem {
                    name: name.to_string(),
                    category,
                    quantity,
                    unit: unit.to_string(),
                    reorder_level,
                    unit_cost,
                    supplier: supplier.to_string(),
                    last_restocked: "2024-04-01T00:00:00Z".to_string(),
                },
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_adjust_quantity() {
        let service = InventoryService::new(Storage::in_memory());
        let item = service.adjust_quantity("inv-2", 10).await.unwrap().unwrap();
        assert_eq!(item.quantity, 16);
        assert_ne!(item.last_restocked, "2024-04-01T00:00:00Z");

        let item = service.adjust_quantity("inv-2", -16).await.unwrap().unwrap();
        assert_eq!(item.quantity, 0);

        assert!(matches!(
            service.adjust_quantity("inv-2", -1).await,
            Err(AppError::Validation(_))
        ));
        assert_eq!(service.get_item("inv-2").await.unwrap().unwrap().quantity, 0);
        assert!(service.adjust_quantity("inv-99", 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_low_stock_and_stats() {
        let service = InventoryService::new(Storage::in_memory());
        let low: Vec<String> = service
            .low_stock_items()
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.id)
            .collect();
        assert_eq!(low, vec!["inv-2", "inv-3", "inv-5"]);

        let stats = service.stats().await.unwrap();
        assert_eq!(stats.out_of_stock, 1);
        assert_eq!(stats.total_value, 2177.0);
    }
}
