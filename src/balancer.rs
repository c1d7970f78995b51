use std::{io, sync::Arc};

use flume::Receiver;
use parking_lot::Mutex;

use crate::{
    Balance, BalanceSnapshot, BalanceState, ChannelVolumeSink, EngineConfig, Notification,
    PanningEngine, SinkResult, Status, StatusBoard,
};

/// The endpoint name shown when the endpoint cannot be resolved
pub const UNKNOWN_ENDPOINT: &str = "Unknown Device";

/// A error encountered when trying to build a [`Balancer`]
#[derive(Debug, thiserror::Error)]
pub enum BuildBalancerError {
    /// The engine thread could not be started
    #[error("Failed to spawn the panning engine thread: {0}")]
    Spawn(#[from] io::Error),
}

/// A result type for trying to build a [`Balancer`]
pub type BuildBalancerResult<T> = Result<T, BuildBalancerError>;

/// A [`Balancer`] whose sink is chosen at runtime
pub type DynBalancer = Balancer<Box<dyn ChannelVolumeSink + Send>>;

/**
Controls the balance of an output endpoint, manually or with the auto-pan sweep

This is the interface for a presentation layer. Setters clamp their inputs
and never fail because of them. Sink failures are returned from the setters
that write synchronously, and are always recorded in the [`Status`].
*/
pub struct Balancer<S> {
    state: BalanceState,
    sink: Arc<Mutex<S>>,
    status: StatusBoard,
    engine: PanningEngine<S>,
}

impl<S> Balancer<S>
where
    S: ChannelVolumeSink + Send + 'static,
{
    /// Create a new balancer with the default [`EngineConfig`]
    pub fn new(sink: S) -> BuildBalancerResult<Self> {
        Self::with_config(sink, EngineConfig::default())
    }
    /// Create a new balancer
    ///
    /// The manual values start at the endpoint's current channel volumes if they can be read.
    pub fn with_config(mut sink: S, config: EngineConfig) -> BuildBalancerResult<Self> {
        let status = StatusBoard::new();
        let manual = match sink.channel_volume() {
            Ok(balance) => {
                log::info!("Current balance is {balance}");
                balance
            }
            Err(e) => {
                log::debug!("Could not read current balance, starting centered: {e}");
                Balance::CENTERED
            }
        };
        if let Ok(name) = sink.endpoint_name() {
            status.set_endpoint_name(&name);
        }
        let state = BalanceState::with_manual(manual);
        let sink = Arc::new(Mutex::new(sink));
        let engine =
            PanningEngine::spawn(config, state.clone(), Arc::clone(&sink), status.clone())?;
        Ok(Balancer {
            state,
            sink,
            status,
            engine,
        })
    }
}

impl<S> Balancer<S>
where
    S: ChannelVolumeSink,
{
    /// Set the manual channel volumes
    ///
    /// If auto-panning is off, they are written to the sink immediately.
    /// The values are stored even if the write fails.
    /// Returns the stored, clamped values.
    pub fn set_manual(&self, left: f32, right: f32) -> SinkResult<Balance> {
        let mut sink = self.sink.lock();
        let snapshot = self.state.set_manual(left, right);
        if !snapshot.auto_pan {
            self.apply(&mut sink, snapshot.manual)?;
        }
        Ok(snapshot.manual)
    }
    /// Set the maximum swing of the auto-pan sweep
    ///
    /// This takes effect on the next tick. Returns the stored, clamped cap.
    pub fn set_intensity_cap(&self, cap: f32) -> f32 {
        self.state.set_intensity_cap(cap).intensity_cap
    }
    /// Turn auto-panning on or off
    ///
    /// Turning it off writes the manual values to the sink once.
    /// Setting the current value again does nothing.
    pub fn set_auto_pan_enabled(&self, enabled: bool) -> SinkResult<()> {
        let mut sink = self.sink.lock();
        let (prev, snapshot) = self.state.set_auto_pan(enabled);
        if prev == enabled {
            return Ok(());
        }
        self.status.notify(Notification::AutoPan(enabled));
        let res = if enabled {
            log::info!("Auto-pan enabled");
            self.engine.enabled();
            Ok(())
        } else {
            log::info!("Auto-pan disabled, restoring {}", snapshot.manual);
            self.apply(&mut sink, snapshot.manual)
        };
        drop(sink);
        self.engine.wake();
        res
    }
    /// Get the display name of the current endpoint
    pub fn endpoint_name(&self) -> String {
        match self.sink.lock().endpoint_name() {
            Ok(name) => {
                self.status.set_endpoint_name(&name);
                name
            }
            Err(e) => {
                log::debug!("Could not resolve endpoint name: {e}");
                UNKNOWN_ENDPOINT.into()
            }
        }
    }
    /// Get a copy of the current settings
    pub fn snapshot(&self) -> BalanceSnapshot {
        self.state.snapshot()
    }
    /// Get a copy of the current status
    pub fn status(&self) -> Status {
        self.status.status()
    }
    /// Get a receiver for status changes
    pub fn notifications(&self) -> Receiver<Notification> {
        self.status.notifications()
    }
    /// Get the panning engine
    pub fn engine(&self) -> &PanningEngine<S> {
        &self.engine
    }
    fn apply(&self, sink: &mut S, balance: Balance) -> SinkResult<()> {
        match sink.set_channel_volume(balance.left, balance.right) {
            Ok(()) => {
                log::debug!("Applied balance {balance}");
                self.status.record_success(balance);
                Ok(())
            }
            Err(e) => {
                log::warn!("Failed to apply balance {balance}: {e}");
                self.status.record_failure(&e);
                Err(e)
            }
        }
    }
}
