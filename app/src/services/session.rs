//! Live roast session
//!
//! Ties the timer, the elapsed-time ticker and the event ledger together
//! for one roast, and hands the finished roast to storage.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use shared::{
    validate_voice_note_size, Clock, CustomButton, CustomButtonType, DataPoint, DataPointType,
    DataPointUpdate, EventLedger, GreenCoffee, KeyValueStore, NewDataPoint, Roast, RoastSettings,
    SessionTimer, SpeedUnit, Storage, SystemClock, TimerState,
};
use tokio::sync::watch;

use super::recorder::VoiceNote;
use super::ticker::{lock_timer, ElapsedTicker, SharedTimer};
use crate::error::{AppError, AppResult};

/// Value captured by the dialog a button opens
#[derive(Debug, Clone, PartialEq)]
pub enum ButtonInput {
    None,
    Temperature(Decimal),
    Note(String),
    Speed(Decimal),
}

pub struct RoastSession<C: Clock + Send + 'static = SystemClock> {
    roast: Roast,
    settings: RoastSettings,
    ledger: EventLedger,
    timer: SharedTimer<C>,
    ticker: ElapsedTicker,
    poll_interval: Duration,
    /// End time and duration, fixed when the timer stops
    finished: Option<(DateTime<Utc>, u32)>,
    saved: Option<Roast>,
    stock_deducted: bool,
}

impl RoastSession<SystemClock> {
    pub fn begin(coffee: &GreenCoffee, settings: RoastSettings, poll_interval: Duration) -> Self {
        Self::with_clock(coffee, settings, poll_interval, SystemClock::default())
    }
}

impl<C: Clock + Send + 'static> RoastSession<C> {
    pub fn with_clock(
        coffee: &GreenCoffee,
        settings: RoastSettings,
        poll_interval: Duration,
        clock: C,
    ) -> Self {
        let roast = Roast::new(coffee, Utc::now());
        tracing::info!("New roast {} for {}", roast.id, roast.coffee_name);

        Self {
            roast,
            settings,
            ledger: EventLedger::new(),
            timer: Arc::new(Mutex::new(SessionTimer::new(clock))),
            ticker: ElapsedTicker::new(),
            poll_interval,
            finished: None,
            saved: None,
            stock_deducted: false,
        }
    }

    /// The draft roast; data points live in [`Self::ledger`] until stop
    pub fn roast(&self) -> &Roast {
        &self.roast
    }

    pub fn ledger(&self) -> &EventLedger {
        &self.ledger
    }

    pub fn settings(&self) -> &RoastSettings {
        &self.settings
    }

    // ========================================================================
    // Timer
    // ========================================================================

    pub fn start(&mut self) -> bool {
        if !lock_timer(&self.timer).start() {
            return false;
        }
        self.roast.start_time = Utc::now();
        self.ticker.publish(0);
        self.ticker.start(Arc::clone(&self.timer), self.poll_interval);
        true
    }

    pub fn pause(&mut self) -> bool {
        if !lock_timer(&self.timer).pause() {
            return false;
        }
        self.ticker.cancel();
        self.ticker.publish(self.elapsed_seconds() as u64);
        true
    }

    pub fn resume(&mut self) -> bool {
        if !lock_timer(&self.timer).resume() {
            return false;
        }
        self.ticker.start(Arc::clone(&self.timer), self.poll_interval);
        true
    }

    pub fn toggle_pause(&mut self) -> bool {
        match self.timer_state() {
            TimerState::Running => self.pause(),
            TimerState::Paused => self.resume(),
            _ => false,
        }
    }

    /// Back to zero; recorded points are kept
    pub fn reset(&mut self) {
        lock_timer(&self.timer).reset();
        self.ticker.cancel();
        self.ticker.publish(0);
    }

    pub fn timer_state(&self) -> TimerState {
        lock_timer(&self.timer).state()
    }

    pub fn elapsed_seconds(&self) -> u32 {
        let seconds = lock_timer(&self.timer).elapsed_seconds();
        u32::try_from(seconds).unwrap_or(u32::MAX)
    }

    /// Display value, refreshed at the poll interval while running
    pub fn watch_elapsed(&self) -> watch::Receiver<u64> {
        self.ticker.subscribe()
    }

    // ========================================================================
    // Recording
    // ========================================================================

    /// Append a point stamped with the current elapsed time
    pub fn record(&mut self, point: NewDataPoint) -> &DataPoint {
        self.ledger.append(point)
    }

    fn now(&self, kind: DataPointType) -> NewDataPoint {
        NewDataPoint::new(kind, self.elapsed_seconds())
    }

    pub fn record_temperature(&mut self, celsius: Decimal) -> String {
        let point = self.now(DataPointType::Temperature).with_temperature(celsius);
        self.record(point).id.clone()
    }

    pub fn record_note(&mut self, text: impl Into<String>) -> String {
        let point = self.now(DataPointType::Note).with_note(text);
        self.record(point).id.clone()
    }

    /// Record a milestone. `None` when it was already recorded in this
    /// session.
    pub fn mark(&mut self, milestone: DataPointType) -> Option<String> {
        self.mark_with(milestone, None)
    }

    fn mark_with(&mut self, milestone: DataPointType, temperature: Option<Decimal>) -> Option<String> {
        if !self.ledger.can_append(milestone) {
            tracing::debug!("{} already recorded", milestone.label());
            return None;
        }
        let mut point = self.now(milestone);
        point.temperature = temperature;
        Some(self.record(point).id.clone())
    }

    /// Store a finished voice note once there is room for it.
    ///
    /// On a capacity error the note is dropped and nothing is recorded.
    pub fn attach_voice_note<S: KeyValueStore>(
        &mut self,
        note: VoiceNote,
        storage: &Storage<S>,
    ) -> AppResult<String> {
        if let VoiceNote::Encoded(payload) = &note {
            validate_voice_note_size(payload, storage.limits().max_voice_note_chars)?;
        }
        storage.ensure_room_for(note.stored_chars())?;

        let point = note.into_data_point(self.elapsed_seconds());
        Ok(self.record(point).id.clone())
    }

    /// Record what a quick-action button stands for.
    ///
    /// `Ok(None)` when a milestone button is pressed a second time.
    pub fn press(&mut self, button_id: &str, input: ButtonInput) -> AppResult<Option<String>> {
        let button = self
            .settings
            .button(button_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Button {}", button_id)))?;

        match button.built_in_point_type() {
            Some(kind) => self.press_built_in(&button, kind, input),
            None => self.press_custom(&button, input).map(Some),
        }
    }

    fn press_built_in(
        &mut self,
        button: &CustomButton,
        kind: DataPointType,
        input: ButtonInput,
    ) -> AppResult<Option<String>> {
        match (kind, input) {
            (DataPointType::Temperature, ButtonInput::Temperature(t)) => {
                Ok(Some(self.record_temperature(t)))
            }
            (DataPointType::Note, ButtonInput::Note(text)) => Ok(Some(self.record_note(text))),
            (DataPointType::Charge, ButtonInput::Temperature(t)) => {
                Ok(self.mark_with(DataPointType::Charge, Some(t)))
            }
            (DataPointType::Charge | DataPointType::FirstCrack | DataPointType::SecondCrack, ButtonInput::None) => {
                Ok(self.mark(kind))
            }
            (DataPointType::Voice, _) => Err(AppError::Validation(
                "Voice notes are added when a recording finishes".to_string(),
            )),
            (DataPointType::DrumSpeed | DataPointType::FanSpeed, ButtonInput::Speed(value)) => {
                let unit = button.speed_unit.unwrap_or_default();
                let point = self.now(kind).with_speed(value, unit);
                Ok(Some(self.record(point).id.clone()))
            }
            (kind, input) => Err(mismatch(kind.label(), &input)),
        }
    }

    fn press_custom(&mut self, button: &CustomButton, input: ButtonInput) -> AppResult<String> {
        let point = match (button.kind, input) {
            (CustomButtonType::Marker, ButtonInput::None) => self.now(DataPointType::Custom),
            (CustomButtonType::Marker, ButtonInput::Note(text)) => {
                self.now(DataPointType::Custom).with_note(text)
            }
            (CustomButtonType::Temperature, ButtonInput::Temperature(t)) => {
                self.now(DataPointType::Temperature).with_temperature(t)
            }
            (CustomButtonType::Speed, ButtonInput::Speed(value)) => {
                let unit = button.speed_unit.unwrap_or(SpeedUnit::Unitless);
                self.now(DataPointType::Speed).with_speed(value, unit)
            }
            (_, input) => return Err(mismatch(&button.name, &input)),
        };

        let point = point.with_custom_button(button.id.clone());
        Ok(self.record(point).id.clone())
    }

    pub fn update_point(&mut self, id: &str, update: DataPointUpdate) -> bool {
        self.ledger.update(id, update)
    }

    pub fn delete_point(&mut self, id: &str) -> bool {
        self.ledger.delete(id)
    }

    // ========================================================================
    // Completion
    // ========================================================================

    pub fn set_weights(&mut self, green: Option<Decimal>, roasted: Option<Decimal>) {
        self.roast.set_weights(green, roasted);
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) {
        let notes = notes.into();
        self.roast.notes = (!notes.trim().is_empty()).then_some(notes);
    }

    /// Stop the timer and persist the completed roast.
    ///
    /// With `deduct_inventory`, the green weight is taken off the coffee's
    /// stock, at most once per session. If saving fails the session stays
    /// usable and `stop` can be called again; once saved, further calls
    /// return the saved roast without writing it again.
    pub fn stop<S: KeyValueStore>(
        &mut self,
        storage: &mut Storage<S>,
        deduct_inventory: bool,
    ) -> AppResult<Roast> {
        let (end_time, duration) = match (self.timer_state(), self.finished) {
            (TimerState::Running | TimerState::Paused, _) => {
                lock_timer(&self.timer).stop();
                self.ticker.cancel();
                let duration = self.elapsed_seconds();
                self.ticker.publish(duration as u64);
                let finished = (Utc::now(), duration);
                self.finished = Some(finished);
                finished
            }
            (_, Some(finished)) => finished,
            _ => return Err(AppError::NoActiveSession),
        };

        let roast = match &self.saved {
            Some(roast) => roast.clone(),
            None => {
                let mut roast = self.roast.clone();
                roast.complete(end_time, duration, self.ledger.points().to_vec());
                storage.save_roast(&roast)?;
                tracing::info!(
                    "Roast {} finished after {}s with {} data points",
                    roast.id,
                    duration,
                    roast.data_points.len()
                );
                self.saved = Some(roast.clone());
                roast
            }
        };

        if deduct_inventory && !self.stock_deducted {
            if let Some(grams) = roast.green_weight {
                deduct(storage, &roast.coffee_id, grams)?;
            }
            self.stock_deducted = true;
        }

        Ok(roast)
    }
}

fn deduct<S: KeyValueStore>(storage: &mut Storage<S>, coffee_id: &str, grams: Decimal) -> AppResult<()> {
    match storage.green_coffee_by_id(coffee_id) {
        Some(mut coffee) if coffee.inventory.is_some() => {
            coffee.consume(grams);
            storage.save_green_coffee(&coffee)?;
            if coffee.is_low_stock() {
                tracing::warn!("{} is running low", coffee.name);
            }
        }
        Some(_) => {}
        None => tracing::debug!("Coffee {} no longer exists; inventory unchanged", coffee_id),
    }
    Ok(())
}

fn mismatch(target: &str, input: &ButtonInput) -> AppError {
    let expected = match input {
        ButtonInput::None => "no value",
        ButtonInput::Temperature(_) => "a temperature",
        ButtonInput::Note(_) => "a note",
        ButtonInput::Speed(_) => "a speed",
    };
    AppError::Validation(format!("{} does not take {}", target, expected))
}
