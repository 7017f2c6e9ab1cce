mod cycle;
mod scheduler;

pub use cycle::{CycleConfig, MAX_PHASE_SECS};
pub use scheduler::{Phase, PhaseScheduler, DEFAULT_SETTLE_MS};
