//! Roast history and export tests
//!
//! Tests for saved roasts including:
//! - Detail-view edits re-persisted through the file store
//! - Calendar grouping
//! - CSV export with custom button labels

use std::path::PathBuf;
use std::str::FromStr;

use chrono::{NaiveDate, TimeZone, Utc};
use proptest::prelude::*;
use roastlog::services::export::timeline_csv_string;
use roastlog::services::{RoastHistory, RoastSummary};
use roastlog::FileStore;
use rust_decimal::Decimal;
use shared::{
    weight_loss_percent, CustomButtonType, DataPointType, DataPointUpdate, EventLedger,
    GreenCoffee, MemoryStore, NewCustomButton, NewDataPoint, Roast, Storage,
};

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn store_path() -> PathBuf {
    std::env::temp_dir()
        .join(format!("roastlog-history-{}", uuid::Uuid::new_v4()))
        .join("roastlog.json")
}

fn finished_roast(coffee: &GreenCoffee) -> Roast {
    let mut roast = Roast::new(coffee, Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap());
    let mut ledger = EventLedger::new();
    ledger.append(NewDataPoint::new(DataPointType::Charge, 0).with_temperature(dec("200")));
    ledger.append(NewDataPoint::new(DataPointType::Note, 90).with_note("yellowing"));
    ledger.append(NewDataPoint::new(DataPointType::FirstCrack, 480));
    roast.complete(Utc.with_ymd_and_hms(2024, 3, 1, 9, 11, 0).unwrap(), 660, ledger.into_points());
    roast
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_edits_survive_reopen() {
        let path = store_path();
        let coffee = GreenCoffee::new("Honduras");
        let roast = finished_roast(&coffee);
        let note_id = roast.data_points[1].id.clone();
        let crack_id = roast.data_points[2].id.clone();

        {
            let mut storage = Storage::new(FileStore::open(&path).unwrap());
            storage.save_roast(&roast).unwrap();

            let mut history = RoastHistory::new(&mut storage);
            assert!(history
                .update_point(&roast.id, &note_id, DataPointUpdate::note("yellow at 1:30"))
                .unwrap());
            assert!(history.delete_point(&roast.id, &crack_id).unwrap());
            assert!(!history.delete_point(&roast.id, &crack_id).unwrap());
            assert!(history
                .set_weights(&roast.id, Some(dec("250")), Some(dec("210")))
                .unwrap());
            assert!(history.set_notes(&roast.id, "sweet, round").unwrap());
        }

        let storage = Storage::new(FileStore::open(&path).unwrap());
        let saved = storage.roast_by_id(&roast.id).unwrap();
        assert_eq!(saved.data_points.len(), 2);
        assert_eq!(saved.data_points[1].note.as_deref(), Some("yellow at 1:30"));
        assert_eq!(saved.weight_loss_percent, Some(dec("16")));
        assert_eq!(saved.notes.as_deref(), Some("sweet, round"));
        assert_eq!(saved.start_time, roast.start_time);
    }

    #[test]
    fn test_delete_roast() {
        let mut storage = Storage::new(MemoryStore::new());
        let coffee = GreenCoffee::new("Honduras");
        let keep = finished_roast(&coffee);
        let gone = finished_roast(&coffee);
        storage.save_roast(&keep).unwrap();
        storage.save_roast(&gone).unwrap();

        let mut history = RoastHistory::new(&mut storage);
        history.delete(&gone.id).unwrap();

        let remaining = history.roasts();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, keep.id);
    }

    #[test]
    fn test_calendar_day_lookup() {
        let mut storage = Storage::new(MemoryStore::new());
        storage.save_roast(&finished_roast(&GreenCoffee::new("A"))).unwrap();

        let history = RoastHistory::new(&mut storage);
        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(history.roasts_on(day).len(), 1);
        assert!(history.roasts_on(day.succ_opt().unwrap()).is_empty());
    }

    #[test]
    fn test_summary_of_saved_roast() {
        let summary = RoastSummary::of(&finished_roast(&GreenCoffee::new("Peru")));
        assert_eq!(summary.coffee_name, "Peru");
        assert_eq!(summary.charge_temperature, Some(dec("200")));
        assert_eq!(summary.first_crack_time, Some(480));
        assert_eq!(summary.duration, Some(660));
    }

    #[test]
    fn test_export_uses_custom_button_names() {
        let mut storage = Storage::new(MemoryStore::new());
        let button = storage
            .add_custom_button(NewCustomButton {
                name: "Gas Up".to_string(),
                short_name: "Gas+".to_string(),
                kind: CustomButtonType::Marker,
                color: "10 60% 50%".to_string(),
                enabled: true,
                speed_unit: None,
            })
            .unwrap();

        let mut roast = finished_roast(&GreenCoffee::new("Peru"));
        let mut ledger = EventLedger::from_points(roast.data_points.clone());
        ledger.append(NewDataPoint::new(DataPointType::Custom, 30).with_custom_button(button.id.clone()));
        roast.data_points = ledger.into_points();

        let csv = timeline_csv_string(&roast, &storage.settings()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[2], "0:30,Gas Up,,,");
        assert_eq!(lines[3], "1:30,Note,,,yellowing");
    }

    #[test]
    fn test_export_of_empty_roast_has_header() {
        let roast = Roast::new(&GreenCoffee::new("Peru"), Utc::now());
        let csv = timeline_csv_string(&roast, &Default::default()).unwrap();
        assert_eq!(csv.trim_end(), "Time,Event Type,Temperature (°C),Speed Value,Notes");
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Weight loss is within 0..100 whenever both weights are positive
        #[test]
        fn prop_weight_loss_bounded(green in 1u32..5_000, roasted in 1u32..5_000) {
            let loss = weight_loss_percent(Some(Decimal::from(green)), Some(Decimal::from(roasted))).unwrap();
            prop_assert!(loss >= Decimal::ZERO);
            prop_assert!(loss < Decimal::from(100));
            if roasted >= green {
                prop_assert_eq!(loss, Decimal::ZERO);
            }
        }

        /// Exported rows come out in timestamp order
        #[test]
        fn prop_export_rows_sorted(stamps in prop::collection::vec(0u32..3_600, 1..30)) {
            let mut roast = Roast::new(&GreenCoffee::new("Peru"), Utc::now());
            let mut ledger = EventLedger::new();
            for ts in &stamps {
                ledger.append(NewDataPoint::new(DataPointType::Note, *ts).with_note("n"));
            }
            roast.data_points = ledger.into_points();

            let csv = timeline_csv_string(&roast, &Default::default()).unwrap();
            let mut times = Vec::new();
            for line in csv.lines().skip(1) {
                let cell = line.split(',').next().unwrap();
                let (m, s) = cell.split_once(':').unwrap();
                times.push(m.parse::<u32>().unwrap() * 60 + s.parse::<u32>().unwrap());
            }
            let mut expected = stamps.clone();
            expected.sort();
            prop_assert_eq!(times, expected);
        }
    }
}
