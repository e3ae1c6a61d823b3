//! Donations and fundraising campaigns.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::repository::{Entity, Record};
use crate::stats::{
    average, breakdown, monthly_trend, ratio_percent, round2, MonthlyCount, TREND_MONTHS,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentMethod {
    Card,
    Paypal,
    BankTransfer,
    Cash,
    Other,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Card => "card",
            PaymentMethod::Paypal => "paypal",
            PaymentMethod::BankTransfer => "bank-transfer",
            PaymentMethod::Cash => "cash",
            PaymentMethod::Other => "other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Donation {
    pub donor_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub donor_email: Option<String>,
    pub amount: f64,
    pub method: PaymentMethod,
    /// Campaign credited with this donation; `None` goes to the general fund
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campaign_id: Option<String>,
    #[serde(default)]
    pub recurring: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub donated_at: String,
}

impl Entity for Donation {
    const ID_PREFIX: &'static str = "don";
    const STORAGE_KEY: &'static str = "donations";

    fn on_create(&mut self, now: &str) {
        if self.donated_at.is_empty() {
            self.donated_at = now.to_string();
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignKind {
    General,
    Medical,
    Facility,
    Emergency,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub kind: CampaignKind,
    pub goal: f64,
    #[serde(default)]
    pub raised: f64,
    #[serde(default)]
    pub donor_count: u32,
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ends_at: Option<String>,
    #[serde(default)]
    pub created_at: String,
}

impl Campaign {
    /// Credit one donation.
    pub fn credit(&mut self, amount: f64) {
        self.raised = round2(self.raised + amount);
        self.donor_count += 1;
    }
}

impl Entity for Campaign {
    const ID_PREFIX: &'static str = "camp";
    const STORAGE_KEY: &'static str = "donation_campaigns";

    fn on_create(&mut self, now: &str) {
        if self.created_at.is_empty() {
            self.created_at = now.to_string();
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignProgress {
    pub campaign_id: String,
    pub title: String,
    pub goal: f64,
    pub raised: f64,
    /// May exceed 100 once a goal is passed
    pub percent: f64,
    pub active: bool,
}

pub fn campaign_progress(campaign: &Record<Campaign>) -> CampaignProgress {
    CampaignProgress {
        campaign_id: campaign.id.clone(),
        title: campaign.title.clone(),
        goal: campaign.goal,
        raised: campaign.raised,
        percent: ratio_percent(campaign.raised, campaign.goal),
        active: campaign.active,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationStats {
    pub total_raised: f64,
    pub donation_count: usize,
    pub unique_donors: usize,
    pub average_donation: f64,
    pub recurring_donors: usize,
    pub by_method: BTreeMap<String, usize>,
    pub monthly_trend: Vec<MonthlyCount>,
    pub campaigns: Vec<CampaignProgress>,
}

pub fn calculate_donation_stats(
    donations: &[Record<Donation>],
    campaigns: &[Record<Campaign>],
) -> DonationStats {
    let unique_donors: BTreeSet<String> = donations
        .iter()
        .map(|d| {
            d.donor_email
                .clone()
                .unwrap_or_else(|| d.donor_name.to_lowercase())
        })
        .collect();

    DonationStats {
        total_raised: round2(donations.iter().map(|d| d.amount).sum()),
        donation_count: donations.len(),
        unique_donors: unique_donors.len(),
        average_donation: average(donations.iter().map(|d| d.amount)),
        recurring_donors: donations.iter().filter(|d| d.recurring).count(),
        by_method: breakdown(donations.iter().map(|d| d.method.as_str())),
        monthly_trend: monthly_trend(donations.iter().map(|d| d.donated_at.as_str()), TREND_MONTHS),
        campaigns: campaigns.iter().map(campaign_progress).collect(),
    }
}
