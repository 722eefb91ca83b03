//! Saved roasts: calendar views and detail-view edits

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use shared::{group_by_date, roasts_on, DataPointUpdate, KeyValueStore, Roast, Storage};

use crate::error::{AppError, AppResult};

pub struct RoastHistory<'a, S: KeyValueStore> {
    storage: &'a mut Storage<S>,
}

impl<'a, S: KeyValueStore> RoastHistory<'a, S> {
    pub fn new(storage: &'a mut Storage<S>) -> Self {
        Self { storage }
    }

    pub fn roasts(&self) -> Vec<Roast> {
        self.storage.roasts()
    }

    pub fn get(&self, roast_id: &str) -> AppResult<Roast> {
        self.storage
            .roast_by_id(roast_id)
            .ok_or_else(|| AppError::NotFound(format!("Roast {}", roast_id)))
    }

    /// Roasts keyed by the UTC day they started on
    pub fn roasts_by_date(&self) -> BTreeMap<NaiveDate, Vec<Roast>> {
        let roasts = self.storage.roasts();
        group_by_date(&roasts)
            .into_iter()
            .map(|(date, group)| (date, group.into_iter().cloned().collect()))
            .collect()
    }

    pub fn roasts_on(&self, date: NaiveDate) -> Vec<Roast> {
        let roasts = self.storage.roasts();
        roasts_on(&roasts, date).into_iter().cloned().collect()
    }

    /// Days in `year`/`month` that have at least one roast
    pub fn roast_days_in_month(&self, year: i32, month: u32) -> Vec<NaiveDate> {
        use chrono::Datelike;

        self.roasts_by_date()
            .into_keys()
            .filter(|d| d.year() == year && d.month() == month)
            .collect()
    }

    /// Edit a point of a saved roast. `Ok(false)` when either id is unknown.
    pub fn update_point(
        &mut self,
        roast_id: &str,
        point_id: &str,
        update: DataPointUpdate,
    ) -> AppResult<bool> {
        self.edit(roast_id, |roast| {
            match roast.data_points.iter_mut().find(|p| p.id == point_id) {
                Some(point) => {
                    point.apply(update);
                    true
                }
                None => false,
            }
        })
    }

    pub fn delete_point(&mut self, roast_id: &str, point_id: &str) -> AppResult<bool> {
        self.edit(roast_id, |roast| {
            let before = roast.data_points.len();
            roast.data_points.retain(|p| p.id != point_id);
            roast.data_points.len() != before
        })
    }

    pub fn set_weights(
        &mut self,
        roast_id: &str,
        green: Option<Decimal>,
        roasted: Option<Decimal>,
    ) -> AppResult<bool> {
        self.edit(roast_id, |roast| {
            roast.set_weights(green, roasted);
            true
        })
    }

    pub fn set_notes(&mut self, roast_id: &str, notes: &str) -> AppResult<bool> {
        self.edit(roast_id, |roast| {
            roast.notes = (!notes.trim().is_empty()).then(|| notes.to_string());
            true
        })
    }

    pub fn delete(&mut self, roast_id: &str) -> AppResult<()> {
        self.storage.delete_roast(roast_id)?;
        tracing::info!("Deleted roast {}", roast_id);
        Ok(())
    }

    /// Load, modify and re-save one roast. Nothing is written when the roast
    /// is missing or `change` reports no change.
    fn edit<F>(&mut self, roast_id: &str, change: F) -> AppResult<bool>
    where
        F: FnOnce(&mut Roast) -> bool,
    {
        let mut roast = match self.storage.roast_by_id(roast_id) {
            Some(roast) => roast,
            None => return Ok(false),
        };

        if !change(&mut roast) {
            return Ok(false);
        }

        self.storage.save_roast(&roast)?;
        Ok(true)
    }
}
