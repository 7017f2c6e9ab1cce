//! Phase scheduler implementation.
//!
//! The scheduler is a tick-driven state machine. It has no internal
//! thread or timer - the caller delivers one `tick()` per time unit
//! (the CLI run loop ticks once per second). Each tick decrements the
//! remaining count by exactly 1; the decrement is authoritative for
//! timing, wall-clock timestamps are bookkeeping for the session log.
//!
//! ## State Transitions
//!
//! ```text
//! Idle --start--> Ready --> Study --> Rest --> (next set | Complete --> Idle)
//! ```
//!
//! Automatic transitions arm a settle window: a brief feedback pause
//! during which ticks are swallowed before the next countdown begins.
//! `pause()` and `reset()` cancel the window.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::cycle::CycleConfig;
use crate::error::ConfigError;
use crate::events::{Event, StudyInterval};

/// Default feedback pause between automatic phase transitions.
pub const DEFAULT_SETTLE_MS: u64 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Ready,
    Study,
    Rest,
    /// All sets finished. Transient: the scheduler auto-resets to
    /// `Idle` within the completing tick.
    Complete,
}

impl Phase {
    pub fn label(self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Ready => "ready",
            Phase::Study => "study",
            Phase::Rest => "rest",
            Phase::Complete => "complete",
        }
    }
}

/// Cyclic phase scheduler: Ready -> Study -> Rest across N sets.
///
/// State is mutated only by the command methods (`start`, `pause`,
/// `reset`, `set_config`) and by `tick()`. Serializable so the CLI can
/// persist it between invocations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseScheduler {
    config: CycleConfig,
    phase: Phase,
    /// 1-indexed; wiped back to 1 on reset.
    current_set: u32,
    total_units: u64,
    remaining_units: u64,
    running: bool,
    /// Feedback pause between automatic transitions, in milliseconds.
    #[serde(default = "default_settle_ms")]
    settle_ms: u64,
    /// End of the pending settle window (epoch ms). `Some` only while
    /// an auto-advanced phase waits for its countdown to begin.
    #[serde(default)]
    settle_until_ms: Option<u64>,
    /// When the current phase began running. `None` iff the phase has
    /// not started counting down since the last reset.
    #[serde(default)]
    phase_started_at: Option<DateTime<Utc>>,
}

fn default_settle_ms() -> u64 {
    DEFAULT_SETTLE_MS
}

impl PhaseScheduler {
    /// Create an idle scheduler.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if the config is out of
    /// range; no scheduler is constructed in that case.
    pub fn new(config: CycleConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            phase: Phase::Idle,
            current_set: 1,
            total_units: config.ready_secs,
            remaining_units: config.ready_secs,
            running: false,
            settle_ms: DEFAULT_SETTLE_MS,
            settle_until_ms: None,
            phase_started_at: None,
        })
    }

    /// Override the settle window. Zero disables it.
    pub fn with_settle_ms(mut self, settle_ms: u64) -> Self {
        self.settle_ms = settle_ms;
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn current_set(&self) -> u32 {
        self.current_set
    }

    pub fn remaining_units(&self) -> u64 {
        self.remaining_units
    }

    pub fn total_units(&self) -> u64 {
        self.total_units
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn config(&self) -> &CycleConfig {
        &self.config
    }

    pub fn settle_ms(&self) -> u64 {
        self.settle_ms
    }

    /// True while an auto-advanced phase is waiting out its settle
    /// window.
    pub fn settling(&self) -> bool {
        self.settle_until_ms.is_some()
    }

    /// Would `reset()` or a config change throw away a run in
    /// progress? The caller decides whether to ask for confirmation;
    /// the scheduler never blocks on it.
    pub fn would_discard_progress(&self) -> bool {
        self.phase != Phase::Idle
    }

    /// 0.0 .. 1.0 progress within the current phase.
    pub fn progress(&self) -> f64 {
        if self.total_units == 0 {
            return 0.0;
        }
        1.0 - (self.remaining_units as f64 / self.total_units as f64)
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            phase: self.phase,
            set: self.current_set,
            remaining_secs: self.remaining_units,
            total_secs: self.total_units,
            running: self.running,
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// From `Idle`: begin the run at set 1, Ready phase. From a paused
    /// phase: resume from the exact remaining count. While running
    /// (settle window included): no-op.
    pub fn start(&mut self) -> Option<Event> {
        if self.running {
            return None;
        }
        match self.phase {
            Phase::Idle => {
                self.enter(Phase::Ready);
                self.running = true;
                Some(Event::PhaseStarted {
                    phase: self.phase,
                    set: self.current_set,
                    duration_secs: self.total_units,
                    at: Utc::now(),
                })
            }
            _ => {
                self.running = true;
                Some(Event::Resumed {
                    phase: self.phase,
                    remaining_secs: self.remaining_units,
                    at: Utc::now(),
                })
            }
        }
    }

    /// Stop consuming ticks; phase and remaining count are unchanged.
    /// Cancels a pending settle window.
    pub fn pause(&mut self) -> Option<Event> {
        if !self.running {
            return None;
        }
        self.running = false;
        self.settle_until_ms = None;
        Some(Event::Paused {
            phase: self.phase,
            remaining_secs: self.remaining_units,
            at: Utc::now(),
        })
    }

    /// Back to `Idle`, set 1, ready duration. Cancels any pending tick
    /// consumption and settle window; no transition fires afterwards.
    pub fn reset(&mut self) -> Event {
        self.reset_state();
        Event::Reset { at: Utc::now() }
    }

    /// Swap the config and reset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] and makes no state change
    /// if the candidate is invalid.
    pub fn set_config(&mut self, config: CycleConfig) -> Result<Event, ConfigError> {
        config.validate()?;
        self.config = config;
        Ok(self.reset())
    }

    /// Consume one time unit.
    ///
    /// Returns the events produced by this tick - usually none or one,
    /// several when zero-duration phases cascade through within the
    /// same tick. Ticks while paused, idle, or inside a settle window
    /// return nothing and mutate nothing.
    pub fn tick(&mut self) -> Vec<Event> {
        if !self.running {
            return Vec::new();
        }
        if let Some(until) = self.settle_until_ms {
            if now_ms() < until {
                return Vec::new();
            }
            self.settle_until_ms = None;
        }
        if self.remaining_units == 0 {
            return Vec::new();
        }
        self.remaining_units -= 1;
        if self.remaining_units > 0 {
            return Vec::new();
        }
        let mut events = Vec::new();
        self.advance(&mut events);
        events
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Natural-completion transition chain. A phase entered with zero
    /// duration completes within the same tick, so the loop continues
    /// until a positive-duration phase is armed or the run ends.
    fn advance(&mut self, events: &mut Vec<Event>) {
        loop {
            let now = Utc::now();
            events.push(Event::PhaseCompleted {
                phase: self.phase,
                set: self.current_set,
                at: now,
            });
            match self.phase {
                Phase::Study => {
                    if self.total_units > 0 {
                        events.push(Event::StudyCompleted {
                            interval: StudyInterval {
                                started_at: self.phase_started_at.unwrap_or(now),
                                ended_at: now,
                                duration_secs: self.total_units,
                                set_number: self.current_set,
                            },
                        });
                    }
                    self.auto_enter(Phase::Rest, events);
                }
                Phase::Ready => {
                    self.auto_enter(Phase::Study, events);
                }
                Phase::Rest => {
                    if self.current_set < self.config.total_sets {
                        self.current_set += 1;
                        self.auto_enter(Phase::Ready, events);
                    } else {
                        self.phase = Phase::Complete;
                        events.push(Event::RunCompleted {
                            sets: self.config.total_sets,
                            at: now,
                        });
                        self.reset_state();
                        return;
                    }
                }
                Phase::Idle | Phase::Complete => return,
            }
            if self.remaining_units > 0 {
                return;
            }
        }
    }

    fn auto_enter(&mut self, phase: Phase, events: &mut Vec<Event>) {
        self.enter(phase);
        events.push(Event::PhaseStarted {
            phase: self.phase,
            set: self.current_set,
            duration_secs: self.total_units,
            at: Utc::now(),
        });
        if self.remaining_units > 0 && self.settle_ms > 0 {
            self.settle_until_ms = Some(now_ms() + self.settle_ms);
        }
    }

    fn enter(&mut self, phase: Phase) {
        let secs = match phase {
            Phase::Ready => self.config.ready_secs,
            Phase::Study => self.config.study_secs,
            Phase::Rest => self.config.rest_secs,
            Phase::Idle | Phase::Complete => 0,
        };
        self.phase = phase;
        self.total_units = secs;
        self.remaining_units = secs;
        self.phase_started_at = Some(Utc::now());
    }

    fn reset_state(&mut self) {
        self.phase = Phase::Idle;
        self.current_set = 1;
        self.total_units = self.config.ready_secs;
        self.remaining_units = self.config.ready_secs;
        self.running = false;
        self.settle_until_ms = None;
        self.phase_started_at = None;
    }
}

impl Default for PhaseScheduler {
    fn default() -> Self {
        let config = CycleConfig::default();
        Self {
            config,
            phase: Phase::Idle,
            current_set: 1,
            total_units: config.ready_secs,
            remaining_units: config.ready_secs,
            running: false,
            settle_ms: DEFAULT_SETTLE_MS,
            settle_until_ms: None,
            phase_started_at: None,
        }
    }
}

fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduler(ready: u64, study: u64, rest: u64, sets: u32) -> PhaseScheduler {
        PhaseScheduler::new(CycleConfig::new(ready, study, rest, sets).unwrap())
            .unwrap()
            .with_settle_ms(0)
    }

    #[test]
    fn starts_idle_with_ready_duration() {
        let s = scheduler(5, 10, 5, 2);
        assert_eq!(s.phase(), Phase::Idle);
        assert_eq!(s.current_set(), 1);
        assert_eq!(s.remaining_units(), 5);
        assert_eq!(s.total_units(), 5);
        assert!(!s.is_running());
        assert!(!s.would_discard_progress());
    }

    #[test]
    fn start_pause_resume() {
        let mut s = scheduler(5, 10, 5, 1);
        assert!(matches!(s.start(), Some(Event::PhaseStarted { .. })));
        assert_eq!(s.phase(), Phase::Ready);
        assert!(s.is_running());

        assert!(matches!(s.pause(), Some(Event::Paused { .. })));
        assert!(!s.is_running());
        assert!(s.pause().is_none());

        assert!(matches!(s.start(), Some(Event::Resumed { .. })));
        assert!(s.is_running());
        assert!(s.start().is_none());
    }

    #[test]
    fn pause_preserves_remaining_exactly() {
        let mut s = scheduler(5, 10, 5, 1);
        s.start();
        s.tick();
        s.tick();
        assert_eq!(s.remaining_units(), 3);
        s.pause();
        assert!(s.tick().is_empty());
        assert_eq!(s.remaining_units(), 3);
        s.start();
        s.tick();
        assert_eq!(s.remaining_units(), 2);
    }

    #[test]
    fn reset_goes_idle_and_wipes_set() {
        let mut s = scheduler(2, 3, 2, 3);
        s.start();
        for _ in 0..8 {
            s.tick();
        }
        assert_eq!(s.current_set(), 2);
        assert!(matches!(s.reset(), Event::Reset { .. }));
        assert_eq!(s.phase(), Phase::Idle);
        assert_eq!(s.current_set(), 1);
        assert_eq!(s.remaining_units(), 2);
        assert!(!s.is_running());
    }

    #[test]
    fn no_tick_fires_after_reset() {
        let mut s = scheduler(2, 3, 2, 1);
        s.start();
        s.tick();
        s.reset();
        assert!(s.tick().is_empty());
        assert_eq!(s.phase(), Phase::Idle);
        assert_eq!(s.remaining_units(), 2);
    }

    #[test]
    fn settle_window_swallows_ticks() {
        let mut s = PhaseScheduler::new(CycleConfig::new(1, 3, 1, 1).unwrap())
            .unwrap()
            .with_settle_ms(60_000);
        s.start();
        let events = s.tick();
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::PhaseStarted { phase: Phase::Study, .. })));
        assert!(s.settling());
        // Inside the window: swallowed, nothing decremented.
        assert!(s.tick().is_empty());
        assert_eq!(s.remaining_units(), 3);
        // Re-entrant start during the window is a no-op.
        assert!(s.start().is_none());
    }

    #[test]
    fn pause_cancels_settle_window() {
        let mut s = PhaseScheduler::new(CycleConfig::new(1, 3, 1, 1).unwrap())
            .unwrap()
            .with_settle_ms(60_000);
        s.start();
        s.tick();
        assert!(s.settling());
        s.pause();
        assert!(!s.settling());
        s.start();
        s.tick();
        assert_eq!(s.remaining_units(), 2);
    }

    #[test]
    fn reset_cancels_settle_window() {
        let mut s = PhaseScheduler::new(CycleConfig::new(1, 3, 1, 1).unwrap())
            .unwrap()
            .with_settle_ms(60_000);
        s.start();
        s.tick();
        assert!(s.settling());
        s.reset();
        assert!(!s.settling());
        assert!(s.tick().is_empty());
        assert_eq!(s.phase(), Phase::Idle);
    }

    #[test]
    fn set_config_rejects_invalid_without_state_change() {
        let mut s = scheduler(5, 10, 5, 2);
        s.start();
        s.tick();
        let bad = CycleConfig {
            ready_secs: 0,
            study_secs: 10,
            rest_secs: 5,
            total_sets: 2,
        };
        assert!(s.set_config(bad).is_err());
        assert_eq!(s.phase(), Phase::Ready);
        assert_eq!(s.remaining_units(), 4);
        assert_eq!(s.config().ready_secs, 5);
    }

    #[test]
    fn set_config_applies_and_resets() {
        let mut s = scheduler(5, 10, 5, 2);
        s.start();
        let next = CycleConfig::new(7, 20, 10, 3).unwrap();
        assert!(matches!(s.set_config(next), Ok(Event::Reset { .. })));
        assert_eq!(s.phase(), Phase::Idle);
        assert_eq!(s.remaining_units(), 7);
    }

    #[test]
    fn snapshot_reflects_state() {
        let s = scheduler(5, 10, 5, 2);
        match s.snapshot() {
            Event::StateSnapshot {
                phase,
                set,
                remaining_secs,
                total_secs,
                running,
                ..
            } => {
                assert_eq!(phase, Phase::Idle);
                assert_eq!(set, 1);
                assert_eq!(remaining_secs, 5);
                assert_eq!(total_secs, 5);
                assert!(!running);
            }
            _ => panic!("expected StateSnapshot"),
        }
    }

    #[test]
    fn serde_round_trip_preserves_state() {
        let mut s = scheduler(5, 10, 5, 2);
        s.start();
        s.tick();
        let json = serde_json::to_string(&s).unwrap();
        let back: PhaseScheduler = serde_json::from_str(&json).unwrap();
        assert_eq!(back.phase(), Phase::Ready);
        assert_eq!(back.remaining_units(), 4);
        assert!(back.is_running());
        assert_eq!(back.settle_ms(), 0);
    }
}
