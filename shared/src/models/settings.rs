//! Quick-action button configuration and its reconciliation

use serde::{Deserialize, Serialize};

use super::DataPointType;
use crate::types::SpeedUnit;

/// Ids of the canonical built-in buttons, in display order
pub const BUILT_IN_BUTTON_IDS: [&str; 8] = [
    "temp",
    "note",
    "charge",
    "first-crack",
    "second-crack",
    "voice",
    "drum-speed",
    "fan-speed",
];

/// Maximum displayed length of a button's short name
pub const SHORT_NAME_MAX_CHARS: usize = 5;

/// What a button records when pressed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CustomButtonType {
    Marker,
    Temperature,
    Speed,
}

/// A quick-action descriptor, either built in or user created
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CustomButton {
    pub id: String,
    pub name: String,
    pub short_name: String,
    #[serde(rename = "type")]
    pub kind: CustomButtonType,
    /// `"H S% L%"`
    pub color: String,
    pub enabled: bool,
    pub is_built_in: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed_unit: Option<SpeedUnit>,
}

impl CustomButton {
    fn built_in(
        id: &str,
        name: &str,
        short_name: &str,
        kind: CustomButtonType,
        color: &str,
        enabled: bool,
        speed_unit: Option<SpeedUnit>,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            short_name: short_name.to_string(),
            kind,
            color: color.to_string(),
            enabled,
            is_built_in: true,
            speed_unit,
        }
    }

    /// Data point type recorded by a built-in button
    pub fn built_in_point_type(&self) -> Option<DataPointType> {
        if !self.is_built_in {
            return None;
        }
        match self.id.as_str() {
            "temp" => Some(DataPointType::Temperature),
            "note" => Some(DataPointType::Note),
            "charge" => Some(DataPointType::Charge),
            "first-crack" => Some(DataPointType::FirstCrack),
            "second-crack" => Some(DataPointType::SecondCrack),
            "voice" => Some(DataPointType::Voice),
            "drum-speed" => Some(DataPointType::DrumSpeed),
            "fan-speed" => Some(DataPointType::FanSpeed),
            _ => None,
        }
    }
}

pub fn is_built_in_id(id: &str) -> bool {
    BUILT_IN_BUTTON_IDS.contains(&id)
}

/// The canonical built-in buttons with their default enablement
pub fn built_in_buttons() -> Vec<CustomButton> {
    use CustomButtonType::*;

    vec![
        CustomButton::built_in("temp", "Temperature", "Temp", Temperature, "25 50% 40%", true, None),
        CustomButton::built_in("note", "Note", "Note", Marker, "270 40% 55%", true, None),
        CustomButton::built_in("charge", "Charge", "Chrg", Temperature, "200 55% 45%", true, None),
        CustomButton::built_in("first-crack", "First Crack", "1st", Marker, "0 55% 50%", true, None),
        CustomButton::built_in("second-crack", "Second Crack", "2nd", Marker, "30 65% 45%", true, None),
        CustomButton::built_in("voice", "Voice Note", "Voice", Marker, "150 45% 40%", true, None),
        CustomButton::built_in(
            "drum-speed",
            "Drum Speed",
            "Drum",
            Speed,
            "210 40% 50%",
            false,
            Some(SpeedUnit::Rpm),
        ),
        CustomButton::built_in(
            "fan-speed",
            "Fan Speed",
            "Fan",
            Speed,
            "190 45% 45%",
            false,
            Some(SpeedUnit::Percent),
        ),
    ]
}

/// Resolved button configuration handed to the UI
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoastSettings {
    pub buttons: Vec<CustomButton>,
}

impl Default for RoastSettings {
    fn default() -> Self {
        Self {
            buttons: built_in_buttons(),
        }
    }
}

impl RoastSettings {
    /// Merge persisted buttons against the canonical built-ins.
    ///
    /// Built-ins come first in canonical order and take only `enabled` from a
    /// stored entry with the same id. Custom buttons follow verbatim in stored
    /// order. Stored custom entries that reuse a built-in id are skipped so
    /// every built-in id appears exactly once.
    pub fn reconcile(persisted: &[CustomButton]) -> Self {
        let mut buttons: Vec<CustomButton> = built_in_buttons()
            .into_iter()
            .map(|mut canonical| {
                if let Some(stored) = persisted.iter().find(|b| b.id == canonical.id) {
                    canonical.enabled = stored.enabled;
                }
                canonical
            })
            .collect();

        buttons.extend(
            persisted
                .iter()
                .filter(|b| !b.is_built_in && !is_built_in_id(&b.id))
                .cloned(),
        );

        Self { buttons }
    }

    pub fn button(&self, id: &str) -> Option<&CustomButton> {
        self.buttons.iter().find(|b| b.id == id)
    }

    pub fn enabled_buttons(&self) -> impl Iterator<Item = &CustomButton> {
        self.buttons.iter().filter(|b| b.enabled)
    }

    pub fn built_in(&self) -> impl Iterator<Item = &CustomButton> {
        self.buttons.iter().filter(|b| b.is_built_in)
    }

    pub fn custom(&self) -> impl Iterator<Item = &CustomButton> {
        self.buttons.iter().filter(|b| !b.is_built_in)
    }
}

/// Fields for a user-created button
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCustomButton {
    pub name: String,
    pub short_name: String,
    #[serde(rename = "type")]
    pub kind: CustomButtonType,
    pub color: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub speed_unit: Option<SpeedUnit>,
}

fn default_enabled() -> bool {
    true
}

/// Partial edit of a button
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ButtonUpdate {
    pub name: Option<String>,
    pub short_name: Option<String>,
    pub color: Option<String>,
    pub enabled: Option<bool>,
    pub speed_unit: Option<SpeedUnit>,
}

impl ButtonUpdate {
    pub fn enabled(enabled: bool) -> Self {
        Self {
            enabled: Some(enabled),
            ..Self::default()
        }
    }

    pub fn apply_to(self, button: &mut CustomButton) {
        if let Some(name) = self.name {
            button.name = name;
        }
        if let Some(short_name) = self.short_name {
            button.short_name = truncate_short_name(&short_name);
        }
        if let Some(color) = self.color {
            button.color = color;
        }
        if let Some(enabled) = self.enabled {
            button.enabled = enabled;
        }
        if let Some(unit) = self.speed_unit {
            button.speed_unit = Some(unit);
        }
    }
}

/// Trim and cap a short name at [`SHORT_NAME_MAX_CHARS`] characters
pub fn truncate_short_name(short_name: &str) -> String {
    short_name.trim().chars().take(SHORT_NAME_MAX_CHARS).collect()
}
