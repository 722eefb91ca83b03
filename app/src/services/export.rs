//! Roast summary and CSV timeline export

use std::io::Write;

use rust_decimal::Decimal;
use serde::Serialize;
use shared::{
    chronological, format_duration, format_timestamp, DataPoint, DataPointType, Roast,
    RoastSettings,
};

use crate::error::AppResult;

/// Headline numbers shown above a roast's timeline
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoastSummary {
    pub coffee_name: String,
    pub charge_time: Option<u32>,
    pub charge_temperature: Option<Decimal>,
    pub first_crack_time: Option<u32>,
    pub second_crack_time: Option<u32>,
    pub max_temperature: Option<Decimal>,
    pub duration: Option<u32>,
    pub green_weight: Option<Decimal>,
    pub roasted_weight: Option<Decimal>,
    pub weight_loss_percent: Option<Decimal>,
}

impl RoastSummary {
    pub fn of(roast: &Roast) -> Self {
        let charge = roast.first_of_type(DataPointType::Charge);
        Self {
            coffee_name: roast.coffee_name.clone(),
            charge_time: charge.map(|p| p.timestamp),
            charge_temperature: charge.and_then(|p| p.temperature),
            first_crack_time: roast
                .first_of_type(DataPointType::FirstCrack)
                .map(|p| p.timestamp),
            second_crack_time: roast
                .first_of_type(DataPointType::SecondCrack)
                .map(|p| p.timestamp),
            max_temperature: roast.max_temperature(),
            duration: roast.duration,
            green_weight: roast.green_weight,
            roasted_weight: roast.roasted_weight,
            weight_loss_percent: roast.weight_loss_percent,
        }
    }

    /// Plain-text rendering for terminals
    pub fn lines(&self) -> Vec<String> {
        let time = |t: Option<u32>| t.map(format_timestamp).unwrap_or_else(|| "-".to_string());
        let value = |v: Option<Decimal>, unit: &str| {
            v.map(|v| format!("{}{}", v.round_dp(1).normalize(), unit))
                .unwrap_or_else(|| "-".to_string())
        };

        let mut charge = time(self.charge_time);
        if let Some(t) = self.charge_temperature {
            charge = format!("{} @ {}°C", charge, t.round_dp(1).normalize());
        }

        let duration = format_duration(self.duration);
        vec![
            format!("Coffee:        {}", self.coffee_name),
            format!("Charge:        {}", charge),
            format!("First crack:   {}", time(self.first_crack_time)),
            format!("Second crack:  {}", time(self.second_crack_time)),
            format!("Max temp:      {}", value(self.max_temperature, "°C")),
            format!(
                "Duration:      {}",
                if duration.is_empty() { "-" } else { duration.as_str() }
            ),
            format!("Green weight:  {}", value(self.green_weight, "g")),
            format!("Roasted:       {}", value(self.roasted_weight, "g")),
            format!("Weight loss:   {}", value(self.weight_loss_percent, "%")),
        ]
    }
}

/// Timeline label; custom buttons show their own name
pub fn point_label(point: &DataPoint, settings: &RoastSettings) -> String {
    point
        .custom_button_id
        .as_deref()
        .and_then(|id| settings.button(id))
        .map(|b| b.name.clone())
        .unwrap_or_else(|| point.kind.label().to_string())
}

#[derive(Debug, Serialize)]
struct TimelineRow {
    #[serde(rename = "Time")]
    time: String,
    #[serde(rename = "Event Type")]
    event_type: String,
    #[serde(rename = "Temperature (°C)")]
    temperature: String,
    #[serde(rename = "Speed Value")]
    speed: String,
    #[serde(rename = "Notes")]
    notes: String,
}

impl TimelineRow {
    fn from_point(point: &DataPoint, settings: &RoastSettings) -> Self {
        let speed = point
            .speed_value
            .map(|value| {
                let unit = point.speed_unit.map(|u| u.as_str()).unwrap_or_default();
                format!("{}{}", value.normalize(), unit)
            })
            .unwrap_or_default();

        let notes = match point.note.as_deref().filter(|n| !n.is_empty()) {
            Some(note) => note.to_string(),
            None if point.has_voice_note() => "[Voice Note]".to_string(),
            None => String::new(),
        };

        Self {
            time: format_timestamp(point.timestamp),
            event_type: point_label(point, settings),
            temperature: point
                .temperature
                .map(|t| t.normalize().to_string())
                .unwrap_or_default(),
            speed,
            notes,
        }
    }
}

/// Write the roast's points, oldest first, as CSV
pub fn export_timeline_csv<W: Write>(
    roast: &Roast,
    settings: &RoastSettings,
    out: W,
) -> AppResult<()> {
    let mut writer = csv::Writer::from_writer(out);
    for point in chronological(&roast.data_points) {
        writer.serialize(TimelineRow::from_point(point, settings))?;
    }

    if roast.data_points.is_empty() {
        writer.write_record(["Time", "Event Type", "Temperature (°C)", "Speed Value", "Notes"])?;
    }

    writer.flush()?;
    tracing::debug!("Exported {} points of roast {}", roast.data_points.len(), roast.id);
    Ok(())
}

/// CSV timeline as a string
pub fn timeline_csv_string(roast: &Roast, settings: &RoastSettings) -> AppResult<String> {
    let mut buf = Vec::new();
    export_timeline_csv(roast, settings, &mut buf)?;
    String::from_utf8(buf).map_err(|e| crate::error::AppError::Internal(e.to_string()))
}

/// Default file name for an exported timeline
pub fn export_file_name(roast: &Roast) -> String {
    let name: String = roast
        .coffee_name
        .chars()
        .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect();
    format!("roast-{}-{}.csv", name.trim_matches('-'), roast.date())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use shared::{EventLedger, GreenCoffee, NewDataPoint, SpeedUnit};

    fn sample() -> Roast {
        let coffee = GreenCoffee::new("Colombia Huila");
        let mut roast = Roast::new(&coffee, Utc.with_ymd_and_hms(2024, 5, 2, 7, 30, 0).unwrap());

        let mut ledger = EventLedger::new();
        ledger.append(NewDataPoint::new(DataPointType::FirstCrack, 480));
        ledger.append(NewDataPoint::new(DataPointType::Charge, 0).with_temperature(Decimal::from(200)));
        ledger.append(NewDataPoint::new(DataPointType::Temperature, 240).with_temperature(Decimal::from(165)));
        ledger.append(NewDataPoint::new(DataPointType::Voice, 300).with_voice_note("data:audio/webm;base64,AA=="));
        roast.complete(Utc::now(), 600, ledger.into_points());
        roast
    }

    #[test]
    fn test_summary() {
        let summary = RoastSummary::of(&sample());
        assert_eq!(summary.charge_time, Some(0));
        assert_eq!(summary.charge_temperature, Some(Decimal::from(200)));
        assert_eq!(summary.first_crack_time, Some(480));
        assert_eq!(summary.second_crack_time, None);
        assert_eq!(summary.max_temperature, Some(Decimal::from(200)));
        assert!(summary.lines().iter().any(|l| l.contains("10m 0s")));
    }

    #[test]
    fn test_csv_is_sorted_with_voice_placeholder() {
        let csv = timeline_csv_string(&sample(), &RoastSettings::default()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "Time,Event Type,Temperature (°C),Speed Value,Notes");
        assert_eq!(lines[1], "0:00,Charge,200,,");
        assert_eq!(lines[2], "4:00,Temperature,165,,");
        assert_eq!(lines[3], "5:00,Voice Note,,,[Voice Note]");
        assert_eq!(lines[4], "8:00,First Crack,,,");
    }

    #[test]
    fn test_text_note_wins_over_voice_placeholder() {
        let mut roast = sample();
        let mut ledger = EventLedger::from_points(roast.data_points.clone());
        ledger.append(
            NewDataPoint::new(DataPointType::Voice, 420)
                .with_voice_note("data:audio/webm;base64,AA==")
                .with_note("smoke picking up"),
        );
        ledger.append(NewDataPoint::new(DataPointType::DrumSpeed, 430).with_speed(Decimal::from(55), SpeedUnit::Rpm));
        ledger.append(NewDataPoint::new(DataPointType::FanSpeed, 440).with_speed(Decimal::new(375, 1), SpeedUnit::Unitless));
        roast.data_points = ledger.into_points();

        let csv = timeline_csv_string(&roast, &RoastSettings::default()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[4], "7:00,Voice Note,,,smoke picking up");
        assert_eq!(lines[5], "7:10,Drum Speed,,55rpm,");
        assert_eq!(lines[6], "7:20,Fan Speed,,37.5,");
    }

    #[test]
    fn test_file_name() {
        assert_eq!(export_file_name(&sample()), "roast-colombia-huila-2024-05-02.csv");
    }
}
