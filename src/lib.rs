#![warn(missing_docs)]

/*!
This crate controls the left/right channel balance of the default audio output,
either manually or with a continuous "8D" auto-panning sweep.

The entry point is [`Balancer`], which owns the shared [`BalanceState`], a
[`ChannelVolumeSink`] bound to the current output endpoint, and the
[`PanningEngine`] thread that drives the sweep.
*/

mod balance;
mod balancer;
mod config;
pub mod endpoint;
mod engine;
mod sink;
mod state;
mod status;
pub mod wave;

pub use {balance::*, balancer::*, config::*, engine::*, sink::*, state::*, status::*};
#[doc(inline)]
pub use wave::{Sweep, WaveShape, Waveform};

use std::{fmt, sync::Arc, time::Duration};

use parking_lot::Mutex;

/// Clamp a value to the unit range `[0.0, 1.0]`
///
/// `NaN` is mapped to `0.0` so that a stored value is always in range.
pub fn clamp_unit(x: f32) -> f32 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(0.0, 1.0)
    }
}

/// A trait for converting to a [`Duration`]
pub trait ToDuration {
    /// Convert to a duration
    fn to_duration(self) -> Duration;
}

/// Interprets a number as seconds
impl ToDuration for f32 {
    fn to_duration(self) -> Duration {
        Duration::try_from_secs_f32(self).unwrap_or_default()
    }
}

/// Interprets a number as seconds
impl ToDuration for f64 {
    fn to_duration(self) -> Duration {
        Duration::try_from_secs_f64(self).unwrap_or_default()
    }
}

/// Interprets a number as seconds
impl ToDuration for u64 {
    fn to_duration(self) -> Duration {
        Duration::from_secs(self)
    }
}

impl ToDuration for Duration {
    fn to_duration(self) -> Duration {
        self
    }
}

/// A thread-safe, reference-counted, locked wrapper
///
/// This is used to share state between the caller's thread
/// and the [`PanningEngine`] thread.
#[derive(Default)]
pub struct Shared<T>(Arc<Mutex<T>>);

impl<T> Shared<T> {
    /// Create a new shared
    pub fn new(val: T) -> Self {
        Shared(Arc::new(Mutex::new(val)))
    }
    /// Set the value
    pub fn set(&self, val: T) {
        *self.0.lock() = val;
    }
    /// Modify the value in place, returning the closure's result
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.0.lock())
    }
}

impl<T> Shared<T>
where
    T: Copy,
{
    /// Copy the value out
    pub fn get(&self) -> T {
        *self.0.lock()
    }
}

impl<T> Shared<T>
where
    T: Clone,
{
    /// Clone the value out
    pub fn cloned(&self) -> T {
        self.0.lock().clone()
    }
}

impl<T> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Shared(Arc::clone(&self.0))
    }
}

impl<T> fmt::Debug for Shared<T>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.lock().fmt(f)
    }
}

impl<T> From<T> for Shared<T> {
    fn from(val: T) -> Self {
        Shared::new(val)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_unit() {
        for x in [-1e9, -1.0, -0.0, 0.0, 0.25, 1.0, 1.5, 1e9, f32::INFINITY, f32::NEG_INFINITY] {
            let c = clamp_unit(x);
            assert!((0.0..=1.0).contains(&c), "{x} clamped to {c}");
        }
        assert_eq!(clamp_unit(f32::NAN), 0.0);
        assert_eq!(clamp_unit(0.3), 0.3);
    }

    #[test]
    fn test_shared_update() {
        let shared = Shared::new(1);
        let other = shared.clone();
        let prev = other.update(|v| std::mem::replace(v, 5));
        assert_eq!(prev, 1);
        assert_eq!(shared.get(), 5);
    }

    #[test]
    fn test_to_duration() {
        assert_eq!(30u64.to_duration(), Duration::from_secs(30));
        assert_eq!(0.5f64.to_duration(), Duration::from_millis(500));
        assert_eq!((-1.0f32).to_duration(), Duration::ZERO);
    }
}
