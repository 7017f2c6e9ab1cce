//! # Studycycle Core Library
//!
//! Core business logic for the Studycycle interval timer: a cyclic
//! phase scheduler (Ready -> Study -> Rest across N sets) plus an
//! annotated session log. The CLI binary is a thin layer over this
//! crate.
//!
//! ## Architecture
//!
//! - **Phase Scheduler**: a tick-driven state machine. The caller is
//!   the tick source, delivering one `tick()` per time unit; automatic
//!   transitions pass through a cancellable settle window.
//! - **Storage**: SQLite-based session log and TOML-based configuration
//! - **Events**: every state change produces an [`Event`]; the session
//!   log consumes `StudyCompleted`, the presentation layer renders the
//!   rest
//!
//! ## Key Components
//!
//! - [`PhaseScheduler`]: the timer state machine
//! - [`CycleConfig`]: validated cycle durations
//! - [`Database`]: session log and kv persistence
//! - [`Config`]: application configuration
//! - [`Notifier`]: best-effort notification sink

pub mod error;
pub mod events;
pub mod notify;
pub mod storage;
pub mod timer;

pub use error::{ConfigError, CoreError, StorageError};
pub use events::{Event, StudyInterval};
pub use notify::{Notifier, NullNotifier, TerminalNotifier};
pub use storage::{Config, Database, LogEntry, Preset, Theme};
pub use timer::{CycleConfig, Phase, PhaseScheduler, DEFAULT_SETTLE_MS, MAX_PHASE_SECS};
