//! Green coffee profiles

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::generate_id;

/// A reusable green bean profile
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GreenCoffee {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchase_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flavour_notes: Option<String>,
    /// Remaining green beans in grams
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub inventory: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low_stock_alert: Option<LowStockAlert>,
}

/// Low stock alert configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LowStockAlert {
    #[serde(with = "rust_decimal::serde::float")]
    pub threshold_grams: Decimal,
    pub enabled: bool,
}

impl GreenCoffee {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: generate_id(),
            name: name.into(),
            origin: None,
            altitude: None,
            processing_method: None,
            purchase_date: None,
            flavour_notes: None,
            inventory: None,
            low_stock_alert: None,
        }
    }

    /// True when an enabled alert's threshold has been reached
    pub fn is_low_stock(&self) -> bool {
        match (&self.low_stock_alert, self.inventory) {
            (Some(alert), Some(remaining)) if alert.enabled => remaining <= alert.threshold_grams,
            _ => false,
        }
    }

    /// Deduct roasted green weight from the tracked inventory, stopping at zero.
    /// Coffees without inventory tracking are left alone.
    pub fn consume(&mut self, grams: Decimal) {
        if let Some(remaining) = self.inventory {
            self.inventory = Some((remaining - grams).max(Decimal::ZERO));
        }
    }
}
