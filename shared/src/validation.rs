//! Validation utilities for the roast logger
//!
//! Load-time schema checks for persisted blobs, plus input checks for
//! user-created buttons and voice note payloads.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{SchemaError, StorageError};
use crate::models::{CustomButton, GreenCoffee, NewCustomButton, Roast};
use crate::types::format_bytes;

// ============================================================================
// Persisted Blob Validation
// ============================================================================

fn parse<T: DeserializeOwned>(key: &'static str, raw: &str) -> Result<T, SchemaError> {
    serde_json::from_str(raw).map_err(|source| SchemaError::Malformed { key, source })
}

fn invalid(key: &'static str, reason: impl Into<String>) -> SchemaError {
    SchemaError::Invalid {
        key,
        reason: reason.into(),
    }
}

/// Validate the `coffee_roasts` blob. Any bad entry invalidates the whole
/// collection.
pub fn parse_roasts(key: &'static str, raw: &str) -> Result<Vec<Roast>, SchemaError> {
    let roasts: Vec<Roast> = parse(key, raw)?;

    for (index, roast) in roasts.iter().enumerate() {
        if roast.id.trim().is_empty() {
            return Err(invalid(key, format!("roast #{} has an empty id", index)));
        }
        if let Some(end) = roast.end_time {
            if end < roast.start_time {
                return Err(invalid(key, format!("roast {} ends before it starts", roast.id)));
            }
        }
        if roast.data_points.iter().any(|p| p.id.trim().is_empty()) {
            return Err(invalid(
                key,
                format!("roast {} has a data point with an empty id", roast.id),
            ));
        }
    }

    Ok(roasts)
}

/// Validate the `green_coffees` blob
pub fn parse_green_coffees(key: &'static str, raw: &str) -> Result<Vec<GreenCoffee>, SchemaError> {
    let coffees: Vec<GreenCoffee> = parse(key, raw)?;

    if let Some(index) = coffees.iter().position(|c| c.id.trim().is_empty()) {
        return Err(invalid(key, format!("coffee #{} has an empty id", index)));
    }

    Ok(coffees)
}

#[derive(Deserialize)]
struct PersistedSettings {
    buttons: Vec<CustomButton>,
}

/// Validate the `roast_settings` blob and return its stored buttons,
/// before reconciliation
pub fn parse_settings(key: &'static str, raw: &str) -> Result<Vec<CustomButton>, SchemaError> {
    let settings: PersistedSettings = parse(key, raw)?;

    if let Some(index) = settings.buttons.iter().position(|b| b.id.trim().is_empty()) {
        return Err(invalid(key, format!("button #{} has an empty id", index)));
    }

    Ok(settings.buttons)
}

// ============================================================================
// Capacity Validation
// ============================================================================

/// Reject encoded voice notes longer than `max_chars`
pub fn validate_voice_note_size(payload: &str, max_chars: usize) -> Result<(), StorageError> {
    if payload.len() > max_chars {
        return Err(StorageError::VoiceNoteTooLarge {
            actual: format_bytes(payload.len()),
            max: format_bytes(max_chars),
        });
    }
    Ok(())
}

// ============================================================================
// Button Validation
// ============================================================================

/// Validate an HSL triple such as `"180 50% 45%"`
pub fn validate_hsl_color(color: &str) -> Result<(), &'static str> {
    let parts: Vec<&str> = color.split_whitespace().collect();
    if parts.len() != 3 {
        return Err("Color must be an HSL triple like \"180 50% 45%\"");
    }

    let hue: f64 = parts[0].parse().map_err(|_| "Invalid hue")?;
    if !(0.0..=360.0).contains(&hue) {
        return Err("Hue must be between 0 and 360");
    }

    for part in &parts[1..] {
        let value: f64 = part
            .strip_suffix('%')
            .ok_or("Saturation and lightness must be percentages")?
            .parse()
            .map_err(|_| "Invalid percentage")?;
        if !(0.0..=100.0).contains(&value) {
            return Err("Percentages must be between 0 and 100");
        }
    }

    Ok(())
}

/// Validate a user-created button before it is stored
pub fn validate_new_button(button: &NewCustomButton) -> Result<(), &'static str> {
    if button.name.trim().is_empty() {
        return Err("Name is required");
    }
    if button.short_name.trim().is_empty() {
        return Err("Short name is required");
    }
    validate_hsl_color(&button.color)
}
