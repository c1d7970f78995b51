use std::time::Duration;

use crate::{wave::angular_step, ToDuration, WaveShape};

/// The default time between engine ticks
pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_millis(30);
/// The shortest allowed time between engine ticks
pub const MIN_TICK_PERIOD: Duration = Duration::from_millis(1);
/// The default sweep frequency in Hz, one full rotation every 10 seconds
pub const DEFAULT_SWEEP_FREQUENCY: f32 = 0.1;

/// What happens to the sweep phase when auto-panning is re-enabled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PhaseOnEnable {
    /// Continue from where the sweep was when it was disabled
    #[default]
    Resume,
    /// Start again from the center, moving right
    Reset,
}

/**
Configuration for a [`PanningEngine`](crate::PanningEngine)

Setters normalize their input, so any built config is usable.
*/
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EngineConfig {
    /// The time between ticks
    pub tick_period: Duration,
    /// The number of full left-right-left rotations per second
    pub sweep_frequency: f32,
    /// The shape of the sweep
    pub waveform: WaveShape,
    /// Whether to resume or reset the phase on enable
    pub phase_on_enable: PhaseOnEnable,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            tick_period: DEFAULT_TICK_PERIOD,
            sweep_frequency: DEFAULT_SWEEP_FREQUENCY,
            waveform: WaveShape::default(),
            phase_on_enable: PhaseOnEnable::default(),
        }
    }
}

impl EngineConfig {
    /// Set the tick period
    ///
    /// Periods shorter than [`MIN_TICK_PERIOD`] are raised to it.
    pub fn tick_period(self, period: impl ToDuration) -> Self {
        EngineConfig {
            tick_period: period.to_duration().max(MIN_TICK_PERIOD),
            ..self
        }
    }
    /// Set the sweep frequency in Hz
    ///
    /// Negative or non-finite frequencies become 0, which holds the sweep still.
    pub fn sweep_frequency(self, hz: f32) -> Self {
        EngineConfig {
            sweep_frequency: if hz.is_finite() { hz.max(0.0) } else { 0.0 },
            ..self
        }
    }
    /// Set the sweep shape
    pub fn waveform(self, waveform: WaveShape) -> Self {
        EngineConfig { waveform, ..self }
    }
    /// Set the phase behavior on enable
    pub fn phase_on_enable(self, phase_on_enable: PhaseOnEnable) -> Self {
        EngineConfig {
            phase_on_enable,
            ..self
        }
    }
    /// Get the phase advance per successful tick in radians
    pub fn angular_step(&self) -> f32 {
        angular_step(self.sweep_frequency, self.tick_period.max(MIN_TICK_PERIOD))
    }
    /// Get the tick period, never shorter than [`MIN_TICK_PERIOD`]
    ///
    /// Deserialized configs bypass the setters, so the engine reads the period through this.
    pub fn effective_tick_period(&self) -> Duration {
        self.tick_period.max(MIN_TICK_PERIOD)
    }
}
