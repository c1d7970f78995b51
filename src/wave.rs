//! Sweep generation

use std::{f32::consts::TAU, time::Duration};

use crate::Balance;

/// Defines the shape of the auto-pan sweep
pub trait Waveform {
    /// Get the value of the wave at the given phase in radians
    ///
    /// This should be in the range [-1.0, 1.0]
    fn at_phase(&self, phase: f32) -> f32;
}

/// A sine waveform
#[derive(Debug, Clone, Copy, Default)]
pub struct Sine;
impl Waveform for Sine {
    fn at_phase(&self, phase: f32) -> f32 {
        phase.sin()
    }
}

/// A triangle waveform, in phase with [`Sine`]
#[derive(Debug, Clone, Copy, Default)]
pub struct Triangle;
impl Waveform for Triangle {
    fn at_phase(&self, phase: f32) -> f32 {
        let t = (phase / TAU + 0.25).rem_euclid(1.0);
        1.0 - 4.0 * (t - 0.5).abs()
    }
}

/// The selectable sweep shapes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WaveShape {
    /// Smooth sweep that lingers at the edges
    #[default]
    Sine,
    /// Constant-speed sweep
    Triangle,
}

impl Waveform for WaveShape {
    fn at_phase(&self, phase: f32) -> f32 {
        match self {
            WaveShape::Sine => Sine.at_phase(phase),
            WaveShape::Triangle => Triangle.at_phase(phase),
        }
    }
}

/// Compute the angular step per tick for a sweep frequency in Hz
pub fn angular_step(sweep_frequency: f32, tick_period: Duration) -> f32 {
    TAU * sweep_frequency * tick_period.as_secs_f32()
}

/// A phase accumulator that turns into a sweeping [`Balance`]
///
/// The phase is in radians and always stays in `[0, TAU)`.
#[derive(Debug, Clone, Copy)]
pub struct Sweep<W = WaveShape> {
    waveform: W,
    phase: f32,
    step: f32,
}

impl<W> Sweep<W> {
    /// Create a new sweep at phase 0 that advances by `step` radians per tick
    pub fn with(waveform: W, step: f32) -> Self {
        Sweep {
            waveform,
            phase: 0.0,
            step: if step.is_finite() { step.abs() } else { 0.0 },
        }
    }
    /// Get the current phase
    pub fn phase(&self) -> f32 {
        self.phase
    }
    /// Set the phase, wrapping it into `[0, TAU)`
    pub fn set_phase(&mut self, phase: f32) {
        self.phase = wrap_phase(phase);
    }
    /// Reset the phase to 0
    pub fn reset(&mut self) {
        self.phase = 0.0;
    }
    /// Get the angular step per tick
    pub fn step(&self) -> f32 {
        self.step
    }
    /// Advance the phase by one step
    pub fn advance(&mut self) {
        self.phase = wrap_phase(self.phase + self.step);
    }
}

impl<W> Sweep<W>
where
    W: Waveform,
{
    /// Get the raw wave value at the current phase
    pub fn raw(&self) -> f32 {
        self.waveform.at_phase(self.phase).clamp(-1.0, 1.0)
    }
    /// Get the balance at the current phase, with the swing limited by `cap`
    pub fn balance(&self, cap: f32) -> Balance {
        Balance::from_swing(self.raw() * crate::clamp_unit(cap))
    }
}

fn wrap_phase(phase: f32) -> f32 {
    if !phase.is_finite() {
        return 0.0;
    }
    let wrapped = phase.rem_euclid(TAU);
    // rem_euclid can round up to TAU itself
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}
