//! Block storage cost estimate
//!
//! Flat price per provisioned GB, summed over a volume listing.

use crate::model::Volume;
use opsdeck_config::VolumeCostSettings;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeCostCalculator {
    pub rate_per_gb: f64,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeCostItem {
    pub volume_id: String,
    pub name: String,
    pub size_gb: u64,
    pub cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeCostReport {
    pub currency: String,
    pub rate_per_gb: f64,
    pub items: Vec<VolumeCostItem>,
    pub total_gb: u64,
    pub total: f64,
}

impl VolumeCostReport {
    /// Total formatted to cents, e.g. `7.00 USD`
    pub fn total_display(&self) -> String {
        format!("{:.2} {}", self.total, self.currency)
    }
}

impl VolumeCostCalculator {
    pub fn new(rate_per_gb: f64, currency: impl Into<String>) -> Self {
        Self {
            rate_per_gb,
            currency: currency.into(),
        }
    }

    pub fn from_settings(settings: &VolumeCostSettings) -> Self {
        Self::new(settings.rate_per_gb, settings.currency.clone())
    }

    pub fn cost_of(&self, size_gb: u64) -> f64 {
        round_cents(size_gb as f64 * self.rate_per_gb)
    }

    pub fn line_items(&self, volumes: &[Volume]) -> Vec<VolumeCostItem> {
        volumes
            .iter()
            .map(|v| VolumeCostItem {
                volume_id: v.id.clone(),
                name: v.name.clone(),
                size_gb: v.size_gb,
                cost: self.cost_of(v.size_gb),
            })
            .collect()
    }

    pub fn report(&self, volumes: &[Volume]) -> VolumeCostReport {
        let items = self.line_items(volumes);
        let total_gb: u64 = items.iter().map(|i| i.size_gb).sum();

        VolumeCostReport {
            currency: self.currency.clone(),
            rate_per_gb: self.rate_per_gb,
            items,
            total_gb,
            // Priced on the summed size so per-item rounding does not drift
            total: self.cost_of(total_gb),
        }
    }
}

fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}
