//! Timestamped events recorded during a roast

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::SpeedUnit;

/// Closed set of data point tags
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum DataPointType {
    Temperature,
    Note,
    FirstCrack,
    SecondCrack,
    Voice,
    Charge,
    Custom,
    DrumSpeed,
    FanSpeed,
    Speed,
}

impl DataPointType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataPointType::Temperature => "temperature",
            DataPointType::Note => "note",
            DataPointType::FirstCrack => "first-crack",
            DataPointType::SecondCrack => "second-crack",
            DataPointType::Voice => "voice",
            DataPointType::Charge => "charge",
            DataPointType::Custom => "custom",
            DataPointType::DrumSpeed => "drum-speed",
            DataPointType::FanSpeed => "fan-speed",
            DataPointType::Speed => "speed",
        }
    }

    /// Milestones are expected at most once per roast
    pub fn is_milestone(&self) -> bool {
        matches!(
            self,
            DataPointType::Charge | DataPointType::FirstCrack | DataPointType::SecondCrack
        )
    }

    /// Types whose `temperature` field takes part in max-temperature queries
    pub fn carries_temperature(&self) -> bool {
        matches!(self, DataPointType::Temperature | DataPointType::Charge)
    }

    pub fn carries_speed(&self) -> bool {
        matches!(
            self,
            DataPointType::DrumSpeed | DataPointType::FanSpeed | DataPointType::Speed
        )
    }

    /// Human readable label used in timelines and exports
    pub fn label(&self) -> &'static str {
        match self {
            DataPointType::Temperature => "Temperature",
            DataPointType::Note => "Note",
            DataPointType::FirstCrack => "First Crack",
            DataPointType::SecondCrack => "Second Crack",
            DataPointType::Voice => "Voice Note",
            DataPointType::Charge => "Charge",
            DataPointType::Custom => "Custom",
            DataPointType::DrumSpeed => "Drum Speed",
            DataPointType::FanSpeed => "Fan Speed",
            DataPointType::Speed => "Speed",
        }
    }
}

impl std::fmt::Display for DataPointType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One event within a roast. Payload fields are present only for the
/// types that use them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DataPoint {
    pub id: String,
    /// Seconds since the roast started
    pub timestamp: u32,
    #[serde(rename = "type")]
    pub kind: DataPointType,
    /// Degrees Celsius
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub temperature: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Encoded audio (data URL) or a device file URI
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_note_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_button_id: Option<String>,
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub speed_value: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed_unit: Option<SpeedUnit>,
}

impl DataPoint {
    /// Apply a partial update; fields left as `None` are untouched
    pub fn apply(&mut self, update: DataPointUpdate) {
        if let Some(timestamp) = update.timestamp {
            self.timestamp = timestamp;
        }
        if let Some(temperature) = update.temperature {
            self.temperature = Some(temperature);
        }
        if let Some(note) = update.note {
            self.note = Some(note);
        }
        if let Some(speed_value) = update.speed_value {
            self.speed_value = Some(speed_value);
        }
        if let Some(speed_unit) = update.speed_unit {
            self.speed_unit = Some(speed_unit);
        }
    }

    pub fn has_voice_note(&self) -> bool {
        self.voice_note.is_some() || self.voice_note_uri.is_some()
    }
}

/// A data point before the ledger assigns its id
#[derive(Debug, Clone, PartialEq)]
pub struct NewDataPoint {
    pub timestamp: u32,
    pub kind: DataPointType,
    pub temperature: Option<Decimal>,
    pub note: Option<String>,
    pub voice_note: Option<String>,
    pub voice_note_uri: Option<String>,
    pub custom_button_id: Option<String>,
    pub speed_value: Option<Decimal>,
    pub speed_unit: Option<SpeedUnit>,
}

impl NewDataPoint {
    pub fn new(kind: DataPointType, timestamp: u32) -> Self {
        Self {
            timestamp,
            kind,
            temperature: None,
            note: None,
            voice_note: None,
            voice_note_uri: None,
            custom_button_id: None,
            speed_value: None,
            speed_unit: None,
        }
    }

    pub fn with_temperature(mut self, temperature: Decimal) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn with_voice_note(mut self, payload: impl Into<String>) -> Self {
        self.voice_note = Some(payload.into());
        self
    }

    pub fn with_voice_note_uri(mut self, uri: impl Into<String>) -> Self {
        self.voice_note_uri = Some(uri.into());
        self
    }

    pub fn with_custom_button(mut self, button_id: impl Into<String>) -> Self {
        self.custom_button_id = Some(button_id.into());
        self
    }

    pub fn with_speed(mut self, value: Decimal, unit: SpeedUnit) -> Self {
        self.speed_value = Some(value);
        self.speed_unit = Some(unit);
        self
    }

    pub(crate) fn into_data_point(self, id: String) -> DataPoint {
        DataPoint {
            id,
            timestamp: self.timestamp,
            kind: self.kind,
            temperature: self.temperature,
            note: self.note,
            voice_note: self.voice_note,
            voice_note_uri: self.voice_note_uri,
            custom_button_id: self.custom_button_id,
            speed_value: self.speed_value,
            speed_unit: self.speed_unit,
        }
    }
}

/// Partial edit of an existing data point. The type and id never change.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataPointUpdate {
    pub timestamp: Option<u32>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub temperature: Option<Decimal>,
    pub note: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub speed_value: Option<Decimal>,
    pub speed_unit: Option<SpeedUnit>,
}

impl DataPointUpdate {
    pub fn note(note: impl Into<String>) -> Self {
        Self {
            note: Some(note.into()),
            ..Self::default()
        }
    }

    pub fn temperature(temperature: Decimal) -> Self {
        Self {
            temperature: Some(temperature),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.timestamp.is_none()
            && self.temperature.is_none()
            && self.note.is_none()
            && self.speed_value.is_none()
            && self.speed_unit.is_none()
    }
}
