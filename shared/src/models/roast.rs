//! Roast session records

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{DataPoint, DataPointType, GreenCoffee};
use crate::ledger;
use crate::types::generate_id;

/// One roasting session, complete or in progress
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Roast {
    pub id: String,
    pub coffee_id: String,
    /// Name of the coffee when the roast was started. Later coffee edits do
    /// not rewrite it.
    pub coffee_name: String,
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    /// Seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    /// Insertion order; sort by timestamp when order matters
    pub data_points: Vec<DataPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Grams
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub green_weight: Option<Decimal>,
    /// Grams
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub roasted_weight: Option<Decimal>,
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub weight_loss_percent: Option<Decimal>,
}

impl Roast {
    /// Start a new in-memory roast for the selected coffee
    pub fn new(coffee: &GreenCoffee, start_time: DateTime<Utc>) -> Self {
        Self {
            id: generate_id(),
            coffee_id: coffee.id.clone(),
            coffee_name: coffee.name.clone(),
            start_time,
            end_time: None,
            duration: None,
            data_points: Vec::new(),
            notes: None,
            green_weight: None,
            roasted_weight: None,
            weight_loss_percent: None,
        }
    }

    /// Close the roast with the ledger snapshot and the timer reading
    pub fn complete(&mut self, end_time: DateTime<Utc>, duration: u32, data_points: Vec<DataPoint>) {
        self.end_time = Some(end_time);
        self.duration = Some(duration);
        self.data_points = data_points;
    }

    pub fn is_complete(&self) -> bool {
        self.end_time.is_some()
    }

    /// Set both weights; non-positive values are treated as absent and the
    /// loss percentage is recomputed.
    pub fn set_weights(&mut self, green: Option<Decimal>, roasted: Option<Decimal>) {
        self.green_weight = green.filter(|g| *g > Decimal::ZERO);
        self.roasted_weight = roasted.filter(|r| *r > Decimal::ZERO);
        self.weight_loss_percent = weight_loss_percent(self.green_weight, self.roasted_weight);
    }

    /// Calendar day of the start time (UTC), used for calendar grouping
    pub fn date(&self) -> NaiveDate {
        self.start_time.date_naive()
    }

    pub fn max_temperature(&self) -> Option<Decimal> {
        ledger::max_temperature(&self.data_points)
    }

    pub fn first_of_type(&self, kind: DataPointType) -> Option<&DataPoint> {
        ledger::first_of_type(&self.data_points, kind)
    }
}

/// Weight loss percentage of a roast.
///
/// `None` when either weight is missing or not positive; zero when the
/// roasted weight is not below the green weight.
pub fn weight_loss_percent(green: Option<Decimal>, roasted: Option<Decimal>) -> Option<Decimal> {
    let green = green.filter(|g| *g > Decimal::ZERO)?;
    let roasted = roasted.filter(|r| *r > Decimal::ZERO)?;
    if roasted >= green {
        return Some(Decimal::ZERO);
    }
    Some(((green - roasted) / green) * Decimal::from(100))
}

/// Group roasts by the UTC calendar day they started on
pub fn group_by_date(roasts: &[Roast]) -> BTreeMap<NaiveDate, Vec<&Roast>> {
    let mut groups: BTreeMap<NaiveDate, Vec<&Roast>> = BTreeMap::new();
    for roast in roasts {
        groups.entry(roast.date()).or_default().push(roast);
    }
    groups
}

/// Roasts started on the given day, in their stored order
pub fn roasts_on(roasts: &[Roast], date: NaiveDate) -> Vec<&Roast> {
    roasts.iter().filter(|r| r.date() == date).collect()
}
