//! Donations and fundraising campaigns.

use crate::errors::AppError;
use crate::models::{
    calculate_donation_stats, campaign_progress, Campaign, CampaignKind, CampaignProgress,
    Donation, DonationStats, PaymentMethod,
};
use crate::repository::ids::counter_id;
use crate::repository::{JsonPatch, JsonRepository, Record};
use crate::stats::sort_by_date_desc;
use crate::store::Storage;

use super::require;

/// Donations and the campaigns they fund.
#[derive(Clone)]
pub struct DonationService {
    donations: JsonRepository<Donation>,
    campaigns: JsonRepository<Campaign>,
}

impl DonationService {
    pub fn new(storage: Storage) -> Self {
        Self::with_seed(storage, default_donations(), default_campaigns())
    }

    pub fn with_seed(
        storage: Storage,
        donations: Vec<Record<Donation>>,
        campaigns: Vec<Record<Campaign>>,
    ) -> Self {
        Self {
            donations: JsonRepository::with_seed(storage.clone(), donations),
            campaigns: JsonRepository::with_seed(storage, campaigns),
        }
    }

    /// Newest donation first.
    pub async fn list_donations(&self) -> Result<Vec<Record<Donation>>, AppError> {
        let mut donations = self.donations.list().await?;
        sort_by_date_desc(&mut donations, |d| d.donated_at.as_str());
        Ok(donations)
    }

    pub async fn get_donation(&self, id: &str) -> Result<Option<Record<Donation>>, AppError> {
        self.donations.get(id).await
    }

    /// Store a donation and credit its campaign.
    ///
    /// The donation and the campaign total are separate collections; a
    /// failure crediting the campaign leaves the donation stored.
    pub async fn record_donation(&self, donation: Donation) -> Result<String, AppError> {
        require(&donation.donor_name, "Donor name")?;
        if !donation.amount.is_finite() || donation.amount <= 0.0 {
            return Err(AppError::Validation(format!(
                "Donation amount must be positive, got {}",
                donation.amount
            )));
        }

        if let Some(campaign_id) = &donation.campaign_id {
            let campaign = self
                .campaigns
                .get(campaign_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Campaign {} not found", campaign_id)))?;
            if !campaign.active {
                return Err(AppError::Validation(format!(
                    "Campaign '{}' is closed",
                    campaign.title
                )));
            }
        }

        let amount = donation.amount;
        let campaign_id = donation.campaign_id.clone();
        let id = self.donations.add(donation).await?;

        if let Some(campaign_id) = campaign_id {
            let credited = self
                .campaigns
                .update_with(&campaign_id, |campaign| {
                    campaign.credit(amount);
                    Ok(())
                })
                .await?;
            if credited.is_none() {
                tracing::warn!(
                    "Campaign {} disappeared before donation {} was credited",
                    campaign_id,
                    id
                );
            }
        }

        Ok(id)
    }

    pub async fn update_donation(
        &self,
        id: &str,
        patch: &JsonPatch,
    ) -> Result<Option<Record<Donation>>, AppError> {
        self.donations.update(id, patch).await
    }

    pub async fn delete_donation(&self, id: &str) -> Result<bool, AppError> {
        self.donations.delete(id).await
    }

    pub async fn list_campaigns(&self) -> Result<Vec<Record<Campaign>>, AppError> {
        self.campaigns.list().await
    }

    pub async fn get_campaign(&self, id: &str) -> Result<Option<Record<Campaign>>, AppError> {
        self.campaigns.get(id).await
    }

    pub async fn add_campaign(&self, campaign: Campaign) -> Result<String, AppError> {
        require(&campaign.title, "Campaign title")?;
        if campaign.goal <= 0.0 {
            return Err(AppError::Validation("Campaign goal must be positive".to_string()));
        }
        self.campaigns.add(campaign).await
    }

    pub async fn update_campaign(
        &self,
        id: &str,
        patch: &JsonPatch,
    ) -> Result<Option<Record<Campaign>>, AppError> {
        self.campaigns.update(id, patch).await
    }

    pub async fn delete_campaign(&self, id: &str) -> Result<bool, AppError> {
        self.campaigns.delete(id).await
    }

    /// Progress of every active campaign.
    pub async fn active_campaigns(&self) -> Result<Vec<CampaignProgress>, AppError> {
        Ok(self
            .campaigns
            .filter(|c| c.active)
            .await?
            .iter()
            .map(campaign_progress)
            .collect())
    }

    pub async fn stats(&self) -> Result<DonationStats, AppError> {
        let donations = self.donations.list().await?;
        let campaigns = self.campaigns.list().await?;
        Ok(calculate_donation_stats(&donations, &campaigns))
    }
}

pub fn default_campaigns() -> Vec<Record<Campaign>> {
    vec![
        Record::new(
            counter_id("camp", 1),
            Campaign {
                title: "Emergency Surgery Fund".to_string(),
                description: "Covers unexpected surgeries for shelter animals.".to_string(),
                kind: CampaignKind::Medical,
                goal: 5000.0,
                raised: 3250.0,
                donor_count: 41,
                active: true,
                ends_at: Some("2024-12-31".to_string()),
                created_at: "2024-01-05T00:00:00Z".to_string(),
            },
        ),
        Record::new(
            counter_id("camp", 2),
            Campaign {
                title: "New Cat Wing".to_string(),
                description: "Build-out of a second cattery.".to_string(),
                kind: CampaignKind::Facility,
                goal: 20000.0,
                raised: 8400.0,
                donor_count: 97,
                active: true,
                ends_at: None,
                created_at: "2023-11-01T00:00:00Z".to_string(),
            },
        ),
    ]
}

pub fn default_donations() -> Vec<Record<Donation>> {
    let rows = [
        ("Emily Chen", 100.0, PaymentMethod::Card, Some("camp-1"), true, "2024-01-12T14:00:00Z"),
        (
            "Marcus Webb",
            250.0,
            PaymentMethod::BankTransfer,
            Some("camp-2"),
            false,
            "2024-02-03T10:30:00Z",
        ),
        ("Anonymous", 20.0, PaymentMethod::Cash, None, false, "2024-02-18T16:45:00Z"),
        ("Rosa Diaz", 50.0, PaymentMethod::Paypal, Some("camp-1"), true, "2024-03-07T09:10:00Z"),
        ("Emily Chen", 100.0, PaymentMethod::Card, Some("camp-1"), true, "2024-04-12T14:00:00Z"),
    ];
    rows.into_iter()
        .enumerate()
        .map(|(i, (donor, amount, method, campaign, recurring, at))| {
            Record::new(
                counter_id("don", i + 1),
                Donation {
                    donor_name: donor.to_string(),
                    donor_email: None,
                    amount,
                    method,
                    campaign_id: campaign.map(str::to_string),
                    recurring,
                    message: None,
                    donated_at: at.to_string(),
                },
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn donation(amount: f64, campaign_id: Option<&str>) -> Donation {
        Donation {
            donor_name: "Test Donor".to_string(),
            donor_email: Some("donor@example.com".to_string()),
            amount,
            method: PaymentMethod::Card,
            campaign_id: campaign_id.map(str::to_string),
            recurring: false,
            message: None,
            donated_at: String::new(),
        }
    }

    #[tokio::test]
    async fn test_record_donation_credits_campaign() {
        let service = DonationService::new(Storage::in_memory());
        let id = service.record_donation(donation(75.0, Some("camp-1"))).await.unwrap();

        let stored = service.get_donation(&id).await.unwrap().unwrap();
        assert!(!stored.donated_at.is_empty());
        let campaign = service.get_campaign("camp-1").await.unwrap().unwrap();
        assert_eq!(campaign.raised, 3325.0);
        assert_eq!(campaign.donor_count, 42);
    }

    #[tokio::test]
    async fn test_general_fund_donation_leaves_campaigns() {
        let service = DonationService::new(Storage::in_memory());
        let before = service.list_campaigns().await.unwrap();
        service.record_donation(donation(30.0, None)).await.unwrap();
        assert_eq!(service.list_campaigns().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_record_donation_rejects_bad_input() {
        let service = DonationService::new(Storage::in_memory());
        assert!(service.record_donation(donation(0.0, None)).await.is_err());
        assert!(service.record_donation(donation(-5.0, None)).await.is_err());
        assert!(matches!(
            service.record_donation(donation(10.0, Some("camp-9"))).await,
            Err(AppError::NotFound(_))
        ));
        assert_eq!(service.list_donations().await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_stats_over_seed() {
        let service = DonationService::new(Storage::in_memory());
        let stats = service.stats().await.unwrap();
        assert_eq!(stats.total_raised, 520.0);
        assert_eq!(stats.donation_count, 5);
        assert_eq!(stats.unique_donors, 4);
        assert_eq!(stats.average_donation, 104.0);
        assert_eq!(stats.campaigns[0].percent, 65.0);
        assert_eq!(stats.campaigns[1].percent, 42.0);
    }
}
