use crate::{CoreResult, ListenerError};

use std::panic::Location;

use error_location::ErrorLocation;
use tracing::debug;

/// Factor applied after a prolonged noisy run.
const DESENSITIZE_FACTOR: f64 = 1.1;
/// Factor applied after a prolonged quiet run.
const RESENSITIZE_FACTOR: f64 = 0.9;

/// Noise/quiet boundary on the normalized RMS scale. Always positive.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Threshold(f64);

impl Threshold {
    /// Smallest value adaptation may reach: one quantization step.
    pub const FLOOR: Threshold = Threshold(1.0 / 32768.0);
    /// Largest value adaptation may reach: full-scale RMS.
    pub const CEILING: Threshold = Threshold(1.0);

    /// # Errors
    ///
    /// Returns [`ListenerError::InvalidConfig`] for zero, negative or
    /// non-finite values.
    #[track_caller]
    pub fn new(value: f64) -> CoreResult<Self> {
        if !value.is_finite() || value <= 0.0 {
            return Err(ListenerError::InvalidConfig {
                reason: format!("threshold must be positive and finite, got {}", value),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        Ok(Self(value))
    }

    /// RMS level as a fraction of full scale.
    pub fn value(self) -> f64 {
        self.0
    }

    fn scaled(self, factor: f64) -> Self {
        Self((self.0 * factor).clamp(Self::FLOOR.0, Self::CEILING.0))
    }
}

/// Outcome of classifying one block's energy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Energy strictly above the threshold.
    Noisy,
    /// Energy at or below the threshold.
    Quiet,
}

/// Adaptive noise gate: a mutable threshold plus run-length counters.
#[derive(Debug)]
pub struct SensitivityController {
    threshold: Threshold,
    noisy_run: u32,
    quiet_run: u32,
    auto_adjust: bool,
    oversensitive_limit: u32,
    undersensitive_limit: u32,
}

impl SensitivityController {
    /// Creates a controller with zeroed counters.
    pub fn new(
        threshold: Threshold,
        auto_adjust: bool,
        oversensitive_limit: u32,
        undersensitive_limit: u32,
    ) -> Self {
        Self {
            threshold,
            noisy_run: 0,
            quiet_run: 0,
            auto_adjust,
            oversensitive_limit,
            undersensitive_limit,
        }
    }

    /// Classifies `energy` and updates the run counters.
    ///
    /// A quiet block does not clear the noisy-run counter: the caller reads
    /// it first for tap detection, then calls [`Self::take_noisy_run`].
    pub fn classify(&mut self, energy: f64) -> Classification {
        if energy > self.threshold.value() {
            self.quiet_run = 0;
            self.noisy_run = self.noisy_run.saturating_add(1);

            if self.auto_adjust && self.noisy_run > self.oversensitive_limit {
                self.threshold = self.threshold.scaled(DESENSITIZE_FACTOR);
                debug!(
                    threshold = self.threshold.value(),
                    noisy_run = self.noisy_run,
                    "Sensitivity lowered"
                );
            }

            Classification::Noisy
        } else {
            self.quiet_run = self.quiet_run.saturating_add(1);

            if self.auto_adjust && self.quiet_run > self.undersensitive_limit {
                self.threshold = self.threshold.scaled(RESENSITIZE_FACTOR);
                debug!(
                    threshold = self.threshold.value(),
                    quiet_run = self.quiet_run,
                    "Sensitivity raised"
                );
            }

            Classification::Quiet
        }
    }

    /// Returns the noisy-run length and resets it to zero.
    pub fn take_noisy_run(&mut self) -> u32 {
        std::mem::take(&mut self.noisy_run)
    }

    /// Marks the current cycle as noisy without a measurement.
    ///
    /// Used when a block could not be read or decoded, so a missed block is
    /// never mistaken for silence.
    pub fn force_noisy(&mut self) {
        self.noisy_run = 1;
    }

    /// Consecutive noisy blocks so far.
    pub fn noisy_run(&self) -> u32 {
        self.noisy_run
    }

    /// Consecutive quiet blocks so far.
    pub fn quiet_run(&self) -> u32 {
        self.quiet_run
    }

    /// Threshold used by the next `classify`.
    pub fn current_threshold(&self) -> Threshold {
        self.threshold
    }

    /// Replaces the threshold. Run counters are kept.
    pub fn set_threshold(&mut self, threshold: Threshold) {
        self.threshold = threshold;
    }

    /// Whether long runs move the threshold.
    pub fn auto_adjust(&self) -> bool {
        self.auto_adjust
    }
}
