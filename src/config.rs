use crate::tracking::{TermCriteria, ValidityBounds, DEFAULT_CEILING};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("histogram bin count must be in 1..=180, got {0}")]
    BinCount(usize),

    #[error("min value {min} exceeds max value {max}")]
    ValueRange { min: u8, max: u8 },

    #[error("scale factor must be in (0, 1], got {0}")]
    Scale(f32),

    #[error("convergence epsilon must be non-negative, got {0}")]
    Epsilon(f64),

    #[error("max iterations must be at least 1")]
    MaxIterations,
}

/// Tunables of the tracking pipeline and frame loop
#[derive(Debug, Clone, PartialEq)]
pub struct TrackerConfig {
    pub validity: ValidityBounds,
    pub bins: usize,
    /// Peak bin value after histogram normalisation
    pub ceiling: f32,
    pub criteria: TermCriteria,
    /// Frames are resized by this factor before processing
    pub scale: f32,
    /// Bounded per-frame wait for input, also paces the loop
    pub wait: Duration,
    /// ASCII code of the key that ends the loop
    pub exit_key: u8,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            validity: ValidityBounds::default(),
            bins: 8,
            ceiling: DEFAULT_CEILING,
            criteria: TermCriteria::default(),
            scale: 0.75,
            wait: Duration::from_millis(30),
            exit_key: 27,
        }
    }
}

impl TrackerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bins == 0 || self.bins > 180 {
            return Err(ConfigError::BinCount(self.bins));
        }
        if self.validity.min_value > self.validity.max_value {
            return Err(ConfigError::ValueRange {
                min: self.validity.min_value,
                max: self.validity.max_value,
            });
        }
        if !(self.scale > 0.0 && self.scale <= 1.0) {
            return Err(ConfigError::Scale(self.scale));
        }
        if !(self.criteria.epsilon >= 0.0) {
            return Err(ConfigError::Epsilon(self.criteria.epsilon));
        }
        if self.criteria.max_iterations == 0 {
            return Err(ConfigError::MaxIterations);
        }
        Ok(())
    }
}
