use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Hard cap on any single phase duration: one day in seconds.
pub const MAX_PHASE_SECS: u64 = 86_400;

/// Durations for one study cycle, in whole seconds.
///
/// A cycle is Ready -> Study -> Rest, repeated `total_sets` times.
/// Immutable while a run is in progress (the caller checks
/// [`PhaseScheduler::would_discard_progress`] before applying a new
/// config).
///
/// [`PhaseScheduler::would_discard_progress`]: super::PhaseScheduler::would_discard_progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleConfig {
    /// Warm-up countdown before each study interval. At least 1 second.
    #[serde(default = "default_ready_secs")]
    pub ready_secs: u64,
    #[serde(default = "default_study_secs")]
    pub study_secs: u64,
    #[serde(default = "default_rest_secs")]
    pub rest_secs: u64,
    #[serde(default = "default_total_sets")]
    pub total_sets: u32,
}

fn default_ready_secs() -> u64 {
    10
}
fn default_study_secs() -> u64 {
    25 * 60
}
fn default_rest_secs() -> u64 {
    5 * 60
}
fn default_total_sets() -> u32 {
    4
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            ready_secs: default_ready_secs(),
            study_secs: default_study_secs(),
            rest_secs: default_rest_secs(),
            total_sets: default_total_sets(),
        }
    }
}

impl CycleConfig {
    /// Build a validated config.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for out-of-range fields.
    pub fn new(
        ready_secs: u64,
        study_secs: u64,
        rest_secs: u64,
        total_sets: u32,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            ready_secs,
            study_secs,
            rest_secs,
            total_sets,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check every field against its allowed range.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ready_secs == 0 {
            return Err(ConfigError::invalid("ready_secs", "must be at least 1"));
        }
        for (field, value) in [
            ("ready_secs", self.ready_secs),
            ("study_secs", self.study_secs),
            ("rest_secs", self.rest_secs),
        ] {
            if value > MAX_PHASE_SECS {
                return Err(ConfigError::invalid(
                    field,
                    format!("must be at most {MAX_PHASE_SECS}"),
                ));
            }
        }
        if self.total_sets == 0 {
            return Err(ConfigError::invalid("total_sets", "must be at least 1"));
        }
        Ok(())
    }

    /// Clamp free-form (possibly fractional) user input to the nearest
    /// valid config. Never fails: NaN falls back to the field's minimum.
    pub fn sanitized(ready: f64, study: f64, rest: f64, sets: f64) -> Self {
        Self {
            ready_secs: clamp_secs(ready, 1),
            study_secs: clamp_secs(study, 0),
            rest_secs: clamp_secs(rest, 0),
            total_sets: clamp_sets(sets),
        }
    }

    /// Total seconds one full set takes when every phase runs to
    /// natural completion.
    pub fn set_secs(&self) -> u64 {
        self.ready_secs + self.study_secs + self.rest_secs
    }
}

fn clamp_secs(value: f64, min: u64) -> u64 {
    if value.is_nan() {
        return min;
    }
    value.round().clamp(min as f64, MAX_PHASE_SECS as f64) as u64
}

fn clamp_sets(value: f64) -> u32 {
    if value.is_nan() {
        return 1;
    }
    value.round().clamp(1.0, u32::MAX as f64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(CycleConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_ready_rejected() {
        let err = CycleConfig::new(0, 10, 5, 1).unwrap_err();
        assert!(err.to_string().contains("ready_secs"));
    }

    #[test]
    fn zero_sets_rejected() {
        let err = CycleConfig::new(5, 10, 5, 0).unwrap_err();
        assert!(err.to_string().contains("total_sets"));
    }

    #[test]
    fn zero_study_and_rest_allowed() {
        assert!(CycleConfig::new(5, 0, 0, 1).is_ok());
    }

    #[test]
    fn over_cap_rejected() {
        let err = CycleConfig::new(5, MAX_PHASE_SECS + 1, 5, 1).unwrap_err();
        assert!(err.to_string().contains("study_secs"));
    }

    #[test]
    fn sanitized_clamps_fractional_input() {
        let c = CycleConfig::sanitized(0.2, 9.6, -3.0, 0.0);
        assert_eq!(c.ready_secs, 1);
        assert_eq!(c.study_secs, 10);
        assert_eq!(c.rest_secs, 0);
        assert_eq!(c.total_sets, 1);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn sanitized_handles_non_finite() {
        let c = CycleConfig::sanitized(f64::NAN, f64::INFINITY, 5.0, f64::NEG_INFINITY);
        assert_eq!(c.ready_secs, 1);
        assert_eq!(c.study_secs, MAX_PHASE_SECS);
        assert_eq!(c.rest_secs, 5);
        assert_eq!(c.total_sets, 1);
    }

    #[test]
    fn set_secs_sums_phases() {
        let c = CycleConfig::new(5, 10, 5, 2).unwrap();
        assert_eq!(c.set_secs(), 20);
    }
}
