//! Roast session timer
//!
//! Elapsed time is always derived from a clock reading, never from counted
//! ticks, so a host that suspends between polls still reads the right value.
//!
//! ```text
//! Idle -> Running <-> Paused -> Stopped
//! ```
//!
//! Transitions whose precondition does not hold are no-ops.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Source of "now" for the timer
pub trait Clock {
    /// Time since an arbitrary fixed origin
    fn now(&self) -> Duration;
}

/// Monotonic clock backed by [`Instant`]
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Clock advanced by hand, for simulations and tests
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    millis: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.millis.fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_millis(self.millis.load(Ordering::SeqCst))
    }
}

/// Timer states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Idle,
    Running,
    Paused,
    Stopped,
}

impl TimerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerState::Idle => "idle",
            TimerState::Running => "running",
            TimerState::Paused => "paused",
            TimerState::Stopped => "stopped",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionTimer<C: Clock = SystemClock> {
    clock: C,
    state: TimerState,
    /// Clock reading at the last start/resume
    anchor: Duration,
    /// Time accumulated before the last pause
    carried: Duration,
    /// Final reading once stopped
    frozen: Duration,
}

impl Default for SessionTimer<SystemClock> {
    fn default() -> Self {
        Self::new(SystemClock::default())
    }
}

impl<C: Clock> SessionTimer<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            state: TimerState::Idle,
            anchor: Duration::ZERO,
            carried: Duration::ZERO,
            frozen: Duration::ZERO,
        }
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    /// `Idle`/`Stopped` -> `Running`, from zero
    pub fn start(&mut self) -> bool {
        if !matches!(self.state, TimerState::Idle | TimerState::Stopped) {
            return false;
        }
        self.anchor = self.clock.now();
        self.carried = Duration::ZERO;
        self.frozen = Duration::ZERO;
        self.transition(TimerState::Running);
        true
    }

    /// `Running` -> `Paused`, carrying the time run so far
    pub fn pause(&mut self) -> bool {
        if self.state != TimerState::Running {
            return false;
        }
        self.carried += self.clock.now().saturating_sub(self.anchor);
        self.transition(TimerState::Paused);
        true
    }

    /// `Paused` -> `Running`; requires time carried from a prior run
    pub fn resume(&mut self) -> bool {
        if self.state != TimerState::Paused || self.carried.is_zero() {
            return false;
        }
        self.anchor = self.clock.now();
        self.transition(TimerState::Running);
        true
    }

    /// `Running`/`Paused` -> `Stopped`, freezing the elapsed value
    pub fn stop(&mut self) -> bool {
        if !matches!(self.state, TimerState::Running | TimerState::Paused) {
            return false;
        }
        self.frozen = self.elapsed();
        self.transition(TimerState::Stopped);
        true
    }

    /// Any state -> `Idle`, everything zeroed
    pub fn reset(&mut self) {
        self.anchor = Duration::ZERO;
        self.carried = Duration::ZERO;
        self.frozen = Duration::ZERO;
        self.transition(TimerState::Idle);
    }

    pub fn elapsed(&self) -> Duration {
        match self.state {
            TimerState::Idle => Duration::ZERO,
            TimerState::Running => self.carried + self.clock.now().saturating_sub(self.anchor),
            TimerState::Paused => self.carried,
            TimerState::Stopped => self.frozen,
        }
    }

    /// Whole seconds elapsed, floored
    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed().as_secs()
    }

    fn transition(&mut self, to: TimerState) {
        tracing::debug!("Roast timer {} -> {}", self.state.as_str(), to.as_str());
        self.state = to;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timer() -> (SessionTimer<ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        (SessionTimer::new(clock.clone()), clock)
    }

    #[test]
    fn test_start_and_read() {
        let (mut timer, clock) = timer();
        assert_eq!(timer.elapsed_seconds(), 0);
        assert!(timer.start());
        clock.advance(Duration::from_millis(3_050));
        assert_eq!(timer.elapsed_seconds(), 3);
    }

    #[test]
    fn test_pause_excludes_paused_time() {
        let (mut timer, clock) = timer();
        timer.start();
        clock.advance(Duration::from_secs(2));
        assert!(timer.pause());
        clock.advance(Duration::from_secs(2));
        assert_eq!(timer.elapsed_seconds(), 2);
        assert!(timer.resume());
        clock.advance(Duration::from_secs(2));
        assert_eq!(timer.elapsed_seconds(), 4);
    }

    #[test]
    fn test_elapsed_floors_sub_second_remainders() {
        let (mut timer, clock) = timer();
        timer.start();
        clock.advance(Duration::from_millis(700));
        timer.pause();
        timer.resume();
        clock.advance(Duration::from_millis(700));
        assert_eq!(timer.elapsed_seconds(), 1);
    }

    #[test]
    fn test_invalid_transitions_are_no_ops() {
        let (mut timer, clock) = timer();
        assert!(!timer.pause());
        assert!(!timer.resume());
        assert!(!timer.stop());
        assert_eq!(timer.state(), TimerState::Idle);

        timer.start();
        clock.advance(Duration::from_secs(5));
        assert!(!timer.start());
        assert!(!timer.resume());
        assert_eq!(timer.elapsed_seconds(), 5);

        timer.pause();
        assert!(!timer.start());
        assert!(!timer.pause());
        assert_eq!(timer.state(), TimerState::Paused);
    }

    #[test]
    fn test_resume_requires_prior_run() {
        let (mut timer, _clock) = timer();
        timer.start();
        // Paused with nothing carried
        timer.pause();
        assert!(!timer.resume());
        assert_eq!(timer.state(), TimerState::Paused);
    }

    #[test]
    fn test_stop_freezes_elapsed() {
        let (mut timer, clock) = timer();
        timer.start();
        clock.advance(Duration::from_secs(600));
        assert!(timer.stop());
        clock.advance(Duration::from_secs(60));
        assert_eq!(timer.elapsed_seconds(), 600);
        assert_eq!(timer.state(), TimerState::Stopped);
    }

    #[test]
    fn test_stop_from_paused() {
        let (mut timer, clock) = timer();
        timer.start();
        clock.advance(Duration::from_secs(90));
        timer.pause();
        clock.advance(Duration::from_secs(30));
        assert!(timer.stop());
        assert_eq!(timer.elapsed_seconds(), 90);
    }

    #[test]
    fn test_restart_after_stop_begins_at_zero() {
        let (mut timer, clock) = timer();
        timer.start();
        clock.advance(Duration::from_secs(10));
        timer.stop();
        assert!(timer.start());
        assert_eq!(timer.elapsed_seconds(), 0);
        clock.advance(Duration::from_secs(1));
        assert_eq!(timer.elapsed_seconds(), 1);
    }

    #[test]
    fn test_reset_from_any_state() {
        let (mut timer, clock) = timer();
        timer.start();
        clock.advance(Duration::from_secs(10));
        timer.pause();
        timer.reset();
        assert_eq!(timer.state(), TimerState::Idle);
        assert_eq!(timer.elapsed_seconds(), 0);
        assert!(!timer.resume());
    }
}
