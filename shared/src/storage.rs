//! Storage codec over a string-keyed store
//!
//! Each logical collection lives in its own blob:
//!
//! | Key              | Content                              |
//! |------------------|--------------------------------------|
//! | `coffee_roasts`  | JSON array of [`Roast`], newest first |
//! | `green_coffees`  | JSON array of [`GreenCoffee`]         |
//! | `roast_settings` | `{ "buttons": [CustomButton] }`       |
//!
//! Loads are fail-closed per collection: a blob that does not validate is
//! logged and treated as empty. Writes rewrite the whole collection after a
//! capacity check. There is no locking; two writers doing read-modify-write
//! at the same time can lose an update.

use std::collections::BTreeMap;

use crate::error::{SchemaError, StorageError};
use crate::models::{ButtonUpdate, CustomButton, GreenCoffee, NewCustomButton, Roast, RoastSettings};
use crate::types::{generate_id, StorageLimits, StorageStatus};
use crate::validation::{
    parse_green_coffees, parse_roasts, parse_settings, validate_new_button, validate_voice_note_size,
};

pub const ROASTS_KEY: &str = "coffee_roasts";
pub const COFFEES_KEY: &str = "green_coffees";
pub const SETTINGS_KEY: &str = "roast_settings";

/// A persisted string-keyed store
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&mut self, key: &str, value: String) -> Result<(), StorageError>;

    fn remove(&mut self, key: &str) -> Result<(), StorageError>;

    /// Sum of the lengths of every key and value currently stored
    fn total_chars(&self) -> Result<usize, StorageError>;
}

/// Store kept entirely in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }

    fn total_chars(&self) -> Result<usize, StorageError> {
        Ok(self.entries.iter().map(|(k, v)| k.len() + v.len()).sum())
    }
}

/// Roast, coffee and settings persistence over a [`KeyValueStore`]
#[derive(Debug)]
pub struct Storage<S> {
    store: S,
    limits: StorageLimits,
}

impl<S: KeyValueStore> Storage<S> {
    pub fn new(store: S) -> Self {
        Self::with_limits(store, StorageLimits::default())
    }

    pub fn with_limits(store: S, limits: StorageLimits) -> Self {
        Self { store, limits }
    }

    pub fn limits(&self) -> &StorageLimits {
        &self.limits
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    // ========================================================================
    // Roasts
    // ========================================================================

    /// All roasts, newest first. Empty when missing or invalid.
    pub fn roasts(&self) -> Vec<Roast> {
        self.load(ROASTS_KEY, parse_roasts).unwrap_or_default()
    }

    pub fn roast_by_id(&self, id: &str) -> Option<Roast> {
        self.roasts().into_iter().find(|r| r.id == id)
    }

    /// Upsert by id: replace in place, or prepend a new roast
    pub fn save_roast(&mut self, roast: &Roast) -> Result<(), StorageError> {
        for point in &roast.data_points {
            if let Some(payload) = &point.voice_note {
                validate_voice_note_size(payload, self.limits.max_voice_note_chars).map_err(|e| {
                    tracing::error!("Rejected roast {}: {}", roast.id, e);
                    e
                })?;
            }
        }

        let mut roasts = self.roasts();
        match roasts.iter().position(|r| r.id == roast.id) {
            Some(index) => roasts[index] = roast.clone(),
            None => roasts.insert(0, roast.clone()),
        }

        self.write(ROASTS_KEY, &roasts)?;
        tracing::info!("Saved roast {} ({} data points)", roast.id, roast.data_points.len());
        Ok(())
    }

    pub fn delete_roast(&mut self, id: &str) -> Result<(), StorageError> {
        let roasts: Vec<Roast> = self.roasts().into_iter().filter(|r| r.id != id).collect();
        self.write(ROASTS_KEY, &roasts)
    }

    // ========================================================================
    // Green Coffees
    // ========================================================================

    pub fn green_coffees(&self) -> Vec<GreenCoffee> {
        self.load(COFFEES_KEY, parse_green_coffees).unwrap_or_default()
    }

    pub fn green_coffee_by_id(&self, id: &str) -> Option<GreenCoffee> {
        self.green_coffees().into_iter().find(|c| c.id == id)
    }

    /// Upsert by id: replace in place, or append a new coffee
    pub fn save_green_coffee(&mut self, coffee: &GreenCoffee) -> Result<(), StorageError> {
        let mut coffees = self.green_coffees();
        match coffees.iter().position(|c| c.id == coffee.id) {
            Some(index) => coffees[index] = coffee.clone(),
            None => coffees.push(coffee.clone()),
        }
        self.write(COFFEES_KEY, &coffees)
    }

    pub fn delete_green_coffee(&mut self, id: &str) -> Result<(), StorageError> {
        let coffees: Vec<GreenCoffee> = self
            .green_coffees()
            .into_iter()
            .filter(|c| c.id != id)
            .collect();
        self.write(COFFEES_KEY, &coffees)
    }

    pub fn low_stock_coffees(&self) -> Vec<GreenCoffee> {
        self.green_coffees()
            .into_iter()
            .filter(GreenCoffee::is_low_stock)
            .collect()
    }

    // ========================================================================
    // Settings
    // ========================================================================

    /// Resolved settings; always contains every built-in button once
    pub fn settings(&self) -> RoastSettings {
        let persisted = self.load(SETTINGS_KEY, parse_settings).unwrap_or_default();
        RoastSettings::reconcile(&persisted)
    }

    pub fn save_settings(&mut self, settings: &RoastSettings) -> Result<(), StorageError> {
        self.write(SETTINGS_KEY, settings)
    }

    /// Store a new user button and return it
    pub fn add_custom_button(&mut self, fields: NewCustomButton) -> Result<CustomButton, StorageError> {
        validate_new_button(&fields).map_err(|reason| StorageError::InvalidInput(reason.to_string()))?;

        let button = CustomButton {
            id: generate_id(),
            name: fields.name.trim().to_string(),
            short_name: crate::models::truncate_short_name(&fields.short_name),
            kind: fields.kind,
            color: fields.color,
            enabled: fields.enabled,
            is_built_in: false,
            speed_unit: fields.speed_unit,
        };

        let mut settings = self.settings();
        settings.buttons.push(button.clone());
        self.save_settings(&settings)?;
        Ok(button)
    }

    /// Patch a built-in or custom button. Unknown ids are ignored.
    pub fn update_button(&mut self, id: &str, update: ButtonUpdate) -> Result<(), StorageError> {
        let mut settings = self.settings();
        match settings.buttons.iter_mut().find(|b| b.id == id) {
            Some(button) => update.apply_to(button),
            None => return Ok(()),
        }
        self.save_settings(&settings)
    }

    /// Remove a custom button; built-ins are never removed
    pub fn delete_custom_button(&mut self, id: &str) -> Result<(), StorageError> {
        let mut settings = self.settings();
        settings.buttons.retain(|b| b.is_built_in || b.id != id);
        self.save_settings(&settings)
    }

    // ========================================================================
    // Capacity
    // ========================================================================

    /// Approximate usage for the "storage nearly full" banner
    pub fn storage_status(&self) -> StorageStatus {
        let used = self.used_bytes();
        let ratio = used as f64 / self.limits.quota_bytes as f64;
        StorageStatus {
            used,
            estimated: self.limits.quota_bytes,
            percentage: ratio * 100.0,
            is_near_limit: ratio >= self.limits.warn_ratio,
        }
    }

    /// Check that `additional_chars` more characters would still fit.
    /// Used before accepting a freshly recorded voice note.
    pub fn ensure_room_for(&self, additional_chars: usize) -> Result<(), StorageError> {
        let projected = self.used_bytes() + additional_chars * 2;
        self.check_projection(projected)
    }

    fn used_bytes(&self) -> usize {
        match self.store.total_chars() {
            Ok(chars) => chars * 2,
            Err(e) => {
                tracing::warn!("Could not measure storage usage: {}", e);
                0
            }
        }
    }

    fn check_projection(&self, projected: usize) -> Result<(), StorageError> {
        let limit = self.limits.quota_bytes as f64 * self.limits.reject_ratio;
        if projected as f64 >= limit {
            return Err(StorageError::QuotaExceeded {
                projected_bytes: projected,
                quota_bytes: self.limits.quota_bytes,
            });
        }
        Ok(())
    }

    // ========================================================================
    // Raw Access
    // ========================================================================

    fn load<T>(
        &self,
        key: &'static str,
        parse: fn(&'static str, &str) -> Result<T, SchemaError>,
    ) -> Option<T> {
        let raw = match self.store.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::error!("Failed to read {}: {}", key, e);
                return None;
            }
        };

        match parse(key, &raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Discarding invalid {} blob: {}", key, e);
                None
            }
        }
    }

    /// Serialize and store one collection. Writes that would grow usage to
    /// the rejection threshold are refused; writes that shrink it always pass
    /// so the user can free space.
    fn write<T: serde::Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<(), StorageError> {
        let json = serde_json::to_string(value)?;

        let current = self.used_bytes();
        let existing = self
            .store
            .get(key)?
            .map(|v| (key.len() + v.len()) * 2)
            .unwrap_or(0);
        let projected = (current.saturating_sub(existing)) + (key.len() + json.len()) * 2;

        if projected > current {
            self.check_projection(projected).map_err(|e| {
                tracing::error!("Rejected write to {}: {}", key, e);
                e
            })?;
        }

        self.store.set(key, json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CustomButtonType, DataPointType, NewDataPoint, BUILT_IN_BUTTON_IDS};
    use crate::EventLedger;
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn storage() -> Storage<MemoryStore> {
        Storage::new(MemoryStore::new())
    }

    fn roast_for(coffee: &GreenCoffee) -> Roast {
        let mut ledger = EventLedger::new();
        ledger.append(NewDataPoint::new(DataPointType::Charge, 0).with_temperature(Decimal::from(200)));
        ledger.append(NewDataPoint::new(DataPointType::FirstCrack, 480));
        let mut roast = Roast::new(coffee, Utc::now());
        roast.complete(Utc::now(), 600, ledger.into_points());
        roast
    }

    fn new_button(name: &str) -> NewCustomButton {
        NewCustomButton {
            name: name.to_string(),
            short_name: "Mark".to_string(),
            kind: CustomButtonType::Marker,
            color: "180 50% 45%".to_string(),
            enabled: true,
            speed_unit: None,
        }
    }

    #[test]
    fn test_empty_store() {
        let storage = storage();
        assert!(storage.roasts().is_empty());
        assert!(storage.green_coffees().is_empty());
        assert_eq!(storage.settings(), RoastSettings::default());
        assert!(storage.roast_by_id("missing").is_none());
    }

    #[test]
    fn test_roast_round_trip() {
        let mut storage = storage();
        let roast = roast_for(&GreenCoffee::new("Guji"));
        storage.save_roast(&roast).unwrap();

        assert_eq!(storage.roasts().len(), 1);
        assert_eq!(storage.roast_by_id(&roast.id), Some(roast));
    }

    #[test]
    fn test_new_roasts_are_prepended_and_updates_keep_position() {
        let mut storage = storage();
        let coffee = GreenCoffee::new("Guji");
        let first = roast_for(&coffee);
        let mut second = roast_for(&coffee);
        storage.save_roast(&first).unwrap();
        storage.save_roast(&second).unwrap();

        second.notes = Some("bright".to_string());
        storage.save_roast(&second).unwrap();

        let ids: Vec<String> = storage.roasts().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![second.id.clone(), first.id.clone()]);
        assert_eq!(storage.roasts()[0].notes.as_deref(), Some("bright"));
    }

    #[test]
    fn test_coffees_are_appended() {
        let mut storage = storage();
        let a = GreenCoffee::new("A");
        let mut b = GreenCoffee::new("B");
        storage.save_green_coffee(&a).unwrap();
        storage.save_green_coffee(&b).unwrap();
        b.origin = Some("Peru".to_string());
        storage.save_green_coffee(&b).unwrap();

        let coffees = storage.green_coffees();
        assert_eq!(coffees.len(), 2);
        assert_eq!(coffees[0].id, a.id);
        assert_eq!(coffees[1].origin.as_deref(), Some("Peru"));

        storage.delete_green_coffee(&a.id).unwrap();
        assert_eq!(storage.green_coffees().len(), 1);
    }

    #[test]
    fn test_delete_roast_twice() {
        let mut storage = storage();
        let roast = roast_for(&GreenCoffee::new("Guji"));
        storage.save_roast(&roast).unwrap();
        storage.delete_roast(&roast.id).unwrap();
        storage.delete_roast(&roast.id).unwrap();
        assert!(storage.roasts().is_empty());
    }

    #[test]
    fn test_invalid_blob_is_discarded_per_collection() {
        let mut store = MemoryStore::new();
        store
            .set(
                ROASTS_KEY,
                r#"[{"id":"r1","coffeeId":"c1","coffeeName":"Guji","startTime":"2024-03-01T09:00:00Z"}]"#
                    .to_string(),
            )
            .unwrap();
        store
            .set(COFFEES_KEY, r#"[{"id":"c1","name":"Guji"}]"#.to_string())
            .unwrap();
        store.set(SETTINGS_KEY, "{oops".to_string()).unwrap();

        let storage = Storage::new(store);
        assert!(storage.roasts().is_empty());
        assert_eq!(storage.green_coffees().len(), 1);
        assert_eq!(storage.settings(), RoastSettings::default());
    }

    #[test]
    fn test_oversized_voice_note_rejected_without_write() {
        let mut storage = storage();
        let coffee = GreenCoffee::new("Guji");
        let mut roast = roast_for(&coffee);
        roast.data_points.push(
            NewDataPoint::new(DataPointType::Voice, 300)
                .with_voice_note("a".repeat(600_000))
                .into_data_point(generate_id()),
        );

        let err = storage.save_roast(&roast).unwrap_err();
        assert!(matches!(err, StorageError::VoiceNoteTooLarge { .. }));
        assert!(storage.store().get(ROASTS_KEY).unwrap().is_none());
    }

    #[test]
    fn test_quota_rejects_growth_but_allows_shrinking() {
        let limits = StorageLimits {
            quota_bytes: 4_000,
            ..StorageLimits::default()
        };
        let mut storage = Storage::with_limits(MemoryStore::new(), limits);
        let coffee = GreenCoffee::new("Guji");

        let mut saved = Vec::new();
        let err = loop {
            let mut roast = roast_for(&coffee);
            roast.notes = Some("n".repeat(200));
            match storage.save_roast(&roast) {
                Ok(()) => saved.push(roast.id),
                Err(e) => break e,
            }
        };
        assert!(matches!(err, StorageError::QuotaExceeded { .. }));
        assert!(err.is_capacity());
        assert!(!saved.is_empty());
        assert_eq!(storage.roasts().len(), saved.len());

        storage.delete_roast(&saved[0]).unwrap();
        assert_eq!(storage.roasts().len(), saved.len() - 1);
    }

    #[test]
    fn test_storage_status() {
        let mut storage = Storage::with_limits(
            MemoryStore::new(),
            StorageLimits {
                quota_bytes: 1_000,
                ..StorageLimits::default()
            },
        );
        assert_eq!(storage.storage_status().used, 0);
        assert!(!storage.storage_status().is_near_limit);

        storage.store.set("filler", "x".repeat(400)).unwrap();
        let status = storage.storage_status();
        assert_eq!(status.used, (6 + 400) * 2);
        assert!(status.is_near_limit);
        assert!(status.percentage > 80.0);
        assert!(storage.ensure_room_for(10).is_ok());
        assert!(storage.ensure_room_for(100).is_err());
    }

    #[test]
    fn test_custom_button_lifecycle() {
        let mut storage = storage();
        let created = storage.add_custom_button(new_button("Dry End")).unwrap();
        assert!(!created.is_built_in);

        let settings = storage.settings();
        assert_eq!(settings.buttons.len(), BUILT_IN_BUTTON_IDS.len() + 1);
        assert_eq!(settings.buttons.last().unwrap().id, created.id);

        storage.update_button(&created.id, ButtonUpdate::enabled(false)).unwrap();
        assert!(!storage.settings().button(&created.id).unwrap().enabled);

        storage.delete_custom_button(&created.id).unwrap();
        assert!(storage.settings().button(&created.id).is_none());
    }

    #[test]
    fn test_built_ins_survive_delete_and_keep_toggle() {
        let mut storage = storage();
        storage.update_button("voice", ButtonUpdate::enabled(false)).unwrap();
        storage.delete_custom_button("voice").unwrap();

        let voice = storage.settings().button("voice").cloned().unwrap();
        assert!(!voice.enabled);
    }

    #[test]
    fn test_built_in_fields_other_than_enabled_are_not_persisted_through() {
        let mut storage = storage();
        storage
            .update_button(
                "temp",
                ButtonUpdate {
                    name: Some("Bean Temp".to_string()),
                    ..ButtonUpdate::default()
                },
            )
            .unwrap();
        assert_eq!(storage.settings().button("temp").unwrap().name, "Temperature");
    }

    #[test]
    fn test_add_custom_button_validates_input() {
        let mut storage = storage();
        let mut fields = new_button(" ");
        assert!(matches!(
            storage.add_custom_button(fields.clone()),
            Err(StorageError::InvalidInput(_))
        ));
        fields.name = "Turning Point".to_string();
        fields.short_name = "Turning".to_string();
        let created = storage.add_custom_button(fields).unwrap();
        assert_eq!(created.short_name, "Turni");
    }

    #[test]
    fn test_low_stock_coffees() {
        let mut storage = storage();
        let mut low = GreenCoffee::new("Low");
        low.inventory = Some(Decimal::from(100));
        low.low_stock_alert = Some(crate::models::LowStockAlert {
            threshold_grams: Decimal::from(250),
            enabled: true,
        });
        storage.save_green_coffee(&low).unwrap();
        storage.save_green_coffee(&GreenCoffee::new("Plenty")).unwrap();

        let flagged = storage.low_stock_coffees();
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].id, low.id);
    }
}
