//! WebAssembly module for the Coffee Roast Logger
//!
//! Provides the browser build with:
//! - A `localStorage`-backed roast store
//! - The roast timer driven by `Date.now()`
//! - Weight loss and display formatting helpers

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use shared::{
    format_elapsed as format_mm_ss, parse_settings, Clock, CustomButton, GreenCoffee,
    KeyValueStore, RoastSettings, SessionTimer, Storage, StorageError, StorageLimits,
    StorageStatus,
};
use std::time::Duration;
use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript glue
pub use shared::models::*;
pub use shared::types::*;

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    web_sys::console::debug_1(&JsValue::from_str("roast logger module loaded"));
}

fn to_js(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

// ============================================================================
// localStorage
// ============================================================================

/// `window.localStorage` as a key-value store
pub struct LocalStorageStore {
    storage: web_sys::Storage,
}

fn backend(err: JsValue) -> StorageError {
    StorageError::Backend(err.as_string().unwrap_or_else(|| format!("{:?}", err)))
}

impl LocalStorageStore {
    pub fn open() -> Result<Self, StorageError> {
        let window = web_sys::window()
            .ok_or_else(|| StorageError::Backend("no window object".to_string()))?;
        let storage = window
            .local_storage()
            .map_err(backend)?
            .ok_or_else(|| StorageError::Backend("localStorage is unavailable".to_string()))?;
        Ok(Self { storage })
    }
}

impl KeyValueStore for LocalStorageStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.storage.get_item(key).map_err(backend)
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StorageError> {
        self.storage.set_item(key, &value).map_err(backend)
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.storage.remove_item(key).map_err(backend)
    }

    fn total_chars(&self) -> Result<usize, StorageError> {
        let len = self.storage.length().map_err(backend)?;
        let mut total = 0;
        for i in 0..len {
            if let Some(key) = self.storage.key(i).map_err(backend)? {
                let value = self.storage.get_item(&key).map_err(backend)?.unwrap_or_default();
                total += key.len() + value.len();
            }
        }
        Ok(total)
    }
}

/// Roast store exposed to JavaScript; values cross the boundary as JSON
#[wasm_bindgen]
pub struct RoastStore {
    inner: Storage<LocalStorageStore>,
}

#[wasm_bindgen]
impl RoastStore {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<RoastStore, JsValue> {
        let store = LocalStorageStore::open().map_err(to_js)?;
        Ok(Self {
            inner: Storage::with_limits(store, StorageLimits::default()),
        })
    }

    pub fn roasts_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.inner.roasts()).map_err(to_js)
    }

    pub fn save_roast_json(&mut self, roast_json: &str) -> Result<(), JsValue> {
        let roast: Roast = serde_json::from_str(roast_json).map_err(to_js)?;
        self.inner.save_roast(&roast).map_err(to_js)
    }

    pub fn delete_roast(&mut self, id: &str) -> Result<(), JsValue> {
        self.inner.delete_roast(id).map_err(to_js)
    }

    pub fn green_coffees_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.inner.green_coffees()).map_err(to_js)
    }

    pub fn save_green_coffee_json(&mut self, coffee_json: &str) -> Result<(), JsValue> {
        let coffee: GreenCoffee = serde_json::from_str(coffee_json).map_err(to_js)?;
        self.inner.save_green_coffee(&coffee).map_err(to_js)
    }

    pub fn settings_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.inner.settings()).map_err(to_js)
    }

    pub fn storage_status_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.inner.storage_status()).map_err(to_js)
    }

    /// Check before accepting a recorded voice note of `chars` characters
    pub fn has_room_for(&self, chars: usize) -> bool {
        self.inner.ensure_room_for(chars).is_ok()
    }
}

/// Storage usage of `localStorage` as JSON
#[wasm_bindgen]
pub fn storage_status_json() -> Result<String, JsValue> {
    let store = LocalStorageStore::open().map_err(to_js)?;
    let status: StorageStatus = Storage::new(store).storage_status();
    serde_json::to_string(&status).map_err(to_js)
}

// ============================================================================
// Timer
// ============================================================================

/// Wall clock from `Date.now()`, relative to when it was created
#[derive(Debug, Clone)]
pub struct JsClock {
    origin_ms: f64,
}

impl Default for JsClock {
    fn default() -> Self {
        Self {
            origin_ms: js_sys::Date::now(),
        }
    }
}

impl Clock for JsClock {
    fn now(&self) -> Duration {
        let ms = (js_sys::Date::now() - self.origin_ms).max(0.0);
        Duration::from_millis(ms as u64)
    }
}

/// Roast timer for the page; the page polls `elapsed_seconds` on its own
/// animation cadence.
#[wasm_bindgen]
pub struct WasmRoastTimer {
    inner: SessionTimer<JsClock>,
}

#[wasm_bindgen]
impl WasmRoastTimer {
    #[wasm_bindgen(constructor)]
    pub fn new() -> WasmRoastTimer {
        Self {
            inner: SessionTimer::new(JsClock::default()),
        }
    }

    pub fn start(&mut self) -> bool {
        self.inner.start()
    }

    pub fn pause(&mut self) -> bool {
        self.inner.pause()
    }

    pub fn resume(&mut self) -> bool {
        self.inner.resume()
    }

    pub fn stop(&mut self) -> bool {
        self.inner.stop()
    }

    pub fn reset(&mut self) {
        self.inner.reset()
    }

    pub fn elapsed_seconds(&self) -> u32 {
        u32::try_from(self.inner.elapsed_seconds()).unwrap_or(u32::MAX)
    }

    pub fn display(&self) -> String {
        format_mm_ss(self.inner.elapsed_seconds())
    }

    pub fn state(&self) -> String {
        self.inner.state().as_str().to_string()
    }
}

impl Default for WasmRoastTimer {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Weight loss percentage; NaN when either weight is missing or not positive
#[wasm_bindgen]
pub fn weight_loss_percent(green_weight: f64, roasted_weight: f64) -> f64 {
    let green = Decimal::try_from(green_weight).ok();
    let roasted = Decimal::try_from(roasted_weight).ok();
    shared::weight_loss_percent(green, roasted)
        .and_then(|loss| loss.to_f64())
        .unwrap_or(f64::NAN)
}

/// Timer display `MM:SS`
#[wasm_bindgen]
pub fn format_elapsed(seconds: u32) -> String {
    format_mm_ss(seconds as u64)
}

fn reconcile_settings(persisted_json: &str) -> Vec<CustomButton> {
    let persisted = parse_settings("roast_settings", persisted_json).unwrap_or_default();
    RoastSettings::reconcile(&persisted).buttons
}

/// Merge a persisted `{ buttons: [...] }` blob with the built-in buttons.
/// An invalid blob yields the defaults.
#[wasm_bindgen]
pub fn reconcile_settings_json(persisted_json: &str) -> Result<String, JsValue> {
    let buttons = reconcile_settings(persisted_json);
    serde_json::to_string(&RoastSettings { buttons }).map_err(to_js)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weight_loss_percent() {
        assert!((weight_loss_percent(200.0, 170.0) - 15.0).abs() < 1e-9);
        assert_eq!(weight_loss_percent(200.0, 210.0), 0.0);
        assert!(weight_loss_percent(0.0, 170.0).is_nan());
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(0), "00:00");
        assert_eq!(format_elapsed(605), "10:05");
    }

    #[test]
    fn test_reconcile_keeps_enabled_flags_and_custom_buttons() {
        let persisted = r#"{"buttons":[
            {"id":"drum-speed","name":"x","shortName":"x","type":"speed","color":"0 0% 0%","enabled":true,"isBuiltIn":true},
            {"id":"c1","name":"Gas","shortName":"Gas","type":"marker","color":"10 50% 50%","enabled":true,"isBuiltIn":false}
        ]}"#;
        let buttons = reconcile_settings(persisted);
        assert_eq!(buttons.len(), shared::BUILT_IN_BUTTON_IDS.len() + 1);

        let drum = buttons.iter().find(|b| b.id == "drum-speed").unwrap();
        assert!(drum.enabled);
        assert_eq!(drum.name, "Drum Speed");
        assert_eq!(buttons.last().unwrap().id, "c1");
    }

    #[test]
    fn test_reconcile_invalid_blob_gives_defaults() {
        let buttons = reconcile_settings("not json");
        assert_eq!(buttons, RoastSettings::default().buttons);
    }
}
