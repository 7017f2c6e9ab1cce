use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::Phase;

/// A study interval that ran to natural completion.
///
/// This is the payload the session log persists; Ready and Rest phases
/// never produce one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyInterval {
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub duration_secs: u64,
    pub set_number: u32,
}

/// Every state change in the scheduler produces an Event.
/// The CLI renders them; the session log consumes `StudyCompleted`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// A phase began counting down (manual start or auto-advance).
    PhaseStarted {
        phase: Phase,
        set: u32,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    /// A phase reached zero remaining units.
    PhaseCompleted {
        phase: Phase,
        set: u32,
        at: DateTime<Utc>,
    },
    /// A study phase completed naturally; the interval is ready to be
    /// appended to the session log.
    StudyCompleted { interval: StudyInterval },
    Paused {
        phase: Phase,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    Resumed {
        phase: Phase,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    Reset {
        at: DateTime<Utc>,
    },
    /// All sets finished; the scheduler has auto-reset to idle.
    RunCompleted {
        sets: u32,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        phase: Phase,
        set: u32,
        remaining_secs: u64,
        total_secs: u64,
        running: bool,
        at: DateTime<Utc>,
    },
}
