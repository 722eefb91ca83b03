//! In-memory event ledger for the active (or loaded) roast
//!
//! The ledger keeps data points in insertion order. It never reorders the
//! backing sequence; callers that need chronological order ask for
//! [`EventLedger::chronological`]. Updates and deletes that miss are silent
//! no-ops so the ledger stays usable during a live session.

use rust_decimal::Decimal;

use crate::models::{DataPoint, DataPointType, DataPointUpdate, NewDataPoint};
use crate::types::generate_id;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventLedger {
    points: Vec<DataPoint>,
}

impl EventLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap points loaded from a persisted roast
    pub fn from_points(points: Vec<DataPoint>) -> Self {
        Self { points }
    }

    /// Assign a fresh id and push the point at the end
    pub fn append(&mut self, point: NewDataPoint) -> &DataPoint {
        if point.kind.is_milestone() && self.has_type(point.kind) {
            tracing::warn!(
                "Recording a second {} milestone at {}s",
                point.kind,
                point.timestamp
            );
        }

        let index = self.points.len();
        self.points.push(point.into_data_point(generate_id()));
        &self.points[index]
    }

    /// Replace the supplied fields of the matching point.
    /// Returns `false` when no point has this id.
    pub fn update(&mut self, id: &str, update: DataPointUpdate) -> bool {
        match self.points.iter_mut().find(|p| p.id == id) {
            Some(point) => {
                point.apply(update);
                true
            }
            None => {
                tracing::debug!("Ignoring update for unknown data point {}", id);
                false
            }
        }
    }

    /// Remove the matching point. Returns `false` when no point has this id.
    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.points.len();
        self.points.retain(|p| p.id != id);
        before != self.points.len()
    }

    pub fn get(&self, id: &str) -> Option<&DataPoint> {
        self.points.iter().find(|p| p.id == id)
    }

    pub fn points(&self) -> &[DataPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn max_temperature(&self) -> Option<Decimal> {
        max_temperature(&self.points)
    }

    pub fn first_of_type(&self, kind: DataPointType) -> Option<&DataPoint> {
        first_of_type(&self.points, kind)
    }

    pub fn has_type(&self, kind: DataPointType) -> bool {
        self.points.iter().any(|p| p.kind == kind)
    }

    pub fn count_of_type(&self, kind: DataPointType) -> usize {
        self.points.iter().filter(|p| p.kind == kind).count()
    }

    /// Gate for single-use actions: milestones may be recorded once
    pub fn can_append(&self, kind: DataPointType) -> bool {
        !kind.is_milestone() || !self.has_type(kind)
    }

    pub fn chronological(&self) -> Vec<&DataPoint> {
        chronological(&self.points)
    }

    pub fn into_points(self) -> Vec<DataPoint> {
        self.points
    }
}

/// Greatest temperature among points whose type carries one
pub fn max_temperature(points: &[DataPoint]) -> Option<Decimal> {
    points
        .iter()
        .filter(|p| p.kind.carries_temperature())
        .filter_map(|p| p.temperature)
        .max()
}

/// Earliest inserted point of the given type
pub fn first_of_type(points: &[DataPoint], kind: DataPointType) -> Option<&DataPoint> {
    points.iter().find(|p| p.kind == kind)
}

/// Points sorted by timestamp; equal timestamps keep insertion order
pub fn chronological(points: &[DataPoint]) -> Vec<&DataPoint> {
    let mut sorted: Vec<&DataPoint> = points.iter().collect();
    sorted.sort_by_key(|p| p.timestamp);
    sorted
}
