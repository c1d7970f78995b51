use crate::{clamp_unit, Balance, Shared};

/// A consistent copy of every field of a [`BalanceState`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BalanceSnapshot {
    /// The manual channel volumes
    pub manual: Balance,
    /// Whether the auto-pan sweep is active
    pub auto_pan: bool,
    /// The maximum swing of the sweep, in `[0.0, 1.0]`
    pub intensity_cap: f32,
}

impl Default for BalanceSnapshot {
    fn default() -> Self {
        BalanceSnapshot {
            manual: Balance::CENTERED,
            auto_pan: false,
            intensity_cap: 1.0,
        }
    }
}

/**
The balance settings shared between the caller and the [`PanningEngine`](crate::PanningEngine)

Cloning a `BalanceState` yields another handle to the same settings.
Every stored value is clamped to `[0.0, 1.0]`.
*/
#[derive(Debug, Clone, Default)]
pub struct BalanceState(Shared<BalanceSnapshot>);

impl BalanceState {
    /// Create a new state with centered manual values, auto-pan off and a full intensity cap
    pub fn new() -> Self {
        Self::default()
    }
    /// Create a new state with the given manual values
    pub fn with_manual(manual: Balance) -> Self {
        BalanceState(Shared::new(BalanceSnapshot {
            manual: Balance::new(manual.left, manual.right),
            ..Default::default()
        }))
    }
    /// Read all fields at once
    pub fn snapshot(&self) -> BalanceSnapshot {
        self.0.get()
    }
    /// Store new manual values, returning what was stored
    pub fn set_manual(&self, left: f32, right: f32) -> BalanceSnapshot {
        let manual = Balance::new(left, right);
        self.0.update(|s| {
            s.manual = manual;
            *s
        })
    }
    /// Store a new intensity cap, returning what was stored
    pub fn set_intensity_cap(&self, cap: f32) -> BalanceSnapshot {
        let cap = clamp_unit(cap);
        self.0.update(|s| {
            s.intensity_cap = cap;
            *s
        })
    }
    /// Set whether auto-panning is enabled
    ///
    /// Returns the previous flag along with the new snapshot.
    pub fn set_auto_pan(&self, enabled: bool) -> (bool, BalanceSnapshot) {
        self.0.update(|s| {
            let prev = std::mem::replace(&mut s.auto_pan, enabled);
            (prev, *s)
        })
    }
    /// Get the manual values
    pub fn manual(&self) -> Balance {
        self.snapshot().manual
    }
    /// Get the intensity cap
    pub fn intensity_cap(&self) -> f32 {
        self.snapshot().intensity_cap
    }
    /// Check if auto-panning is enabled
    pub fn auto_pan(&self) -> bool {
        self.snapshot().auto_pan
    }
}
