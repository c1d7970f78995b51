//! The auto-pan engine thread
//!
//! While auto-panning is enabled, the engine wakes once per tick period,
//! turns the current sweep phase into a [`Balance`], and writes it to the sink.
//! While disabled it sleeps on a condition variable and does no work.

use std::{
    io,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use parking_lot::{Condvar, Mutex, MutexGuard};

use crate::{
    Balance, BalanceState, ChannelVolumeSink, EngineConfig, PhaseOnEnable, SinkResult,
    StatusBoard, Sweep, WaveShape, Waveform,
};

/// Run one auto-pan step
///
/// Writes the sweep's balance for `cap` to the sink and advances the sweep
/// only if the write succeeded, so a failed value is retried on the next tick.
pub fn pan_tick<W, S>(sweep: &mut Sweep<W>, cap: f32, sink: &mut S) -> SinkResult<Balance>
where
    W: Waveform,
    S: ChannelVolumeSink + ?Sized,
{
    let balance = sweep.balance(cap);
    sink.set_channel_volume(balance.left, balance.right)?;
    sweep.advance();
    Ok(balance)
}

#[derive(Default)]
struct Signal {
    shutdown: bool,
    /// Bumped on every enable so a stale schedule is never reused
    enables: u64,
}

struct Inner<S> {
    config: EngineConfig,
    state: BalanceState,
    sink: Arc<Mutex<S>>,
    status: StatusBoard,
    sweep: Mutex<Sweep<WaveShape>>,
    signal: Mutex<Signal>,
    wake: Condvar,
    ticks: AtomicU64,
}

/**
Drives the auto-pan sweep on a dedicated thread

The engine reads the shared [`BalanceState`] on every tick, so enabling,
disabling, and changing the intensity cap only require a [`PanningEngine::wake`]
for the change to be seen immediately.

Dropping the engine stops and joins its thread.
*/
pub struct PanningEngine<S> {
    inner: Arc<Inner<S>>,
    handle: Option<JoinHandle<()>>,
}

impl<S> PanningEngine<S>
where
    S: ChannelVolumeSink + Send + 'static,
{
    /// Spawn the engine thread
    ///
    /// The sink lock is held for the duration of each write.
    pub fn spawn(
        config: EngineConfig,
        state: BalanceState,
        sink: Arc<Mutex<S>>,
        status: StatusBoard,
    ) -> io::Result<Self> {
        let inner = Arc::new(Inner {
            sweep: Mutex::new(Sweep::with(config.waveform, config.angular_step())),
            config,
            state,
            sink,
            status,
            signal: Mutex::new(Signal::default()),
            wake: Condvar::new(),
            ticks: AtomicU64::new(0),
        });
        let thread_inner = Arc::clone(&inner);
        let handle = thread::Builder::new()
            .name("panning-engine".into())
            .spawn(move || thread_inner.run())?;
        Ok(PanningEngine {
            inner,
            handle: Some(handle),
        })
    }
}

impl<S> PanningEngine<S> {
    /// Wake the engine so it sees a changed [`BalanceState`]
    pub fn wake(&self) {
        let _signal = self.inner.signal.lock();
        self.inner.wake.notify_all();
    }
    /// Prepare the sweep for an enable
    ///
    /// Call this before [`PanningEngine::wake`] after enabling auto-pan.
    /// The first tick after the wake happens immediately, even if the engine
    /// never saw the preceding disable.
    pub fn enabled(&self) {
        if self.inner.config.phase_on_enable == PhaseOnEnable::Reset {
            self.inner.sweep.lock().reset();
        }
        self.inner.signal.lock().enables += 1;
    }
    /// Get the current sweep phase in radians
    pub fn phase(&self) -> f32 {
        self.inner.sweep.lock().phase()
    }
    /// Get the number of ticks attempted so far
    pub fn ticks(&self) -> u64 {
        self.inner.ticks.load(Ordering::Relaxed)
    }
    /// Get the engine's configuration
    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }
}

impl<S> Inner<S>
where
    S: ChannelVolumeSink,
{
    fn run(&self) {
        let period = self.config.effective_tick_period();
        log::info!(
            "Panning engine started ({:?} ticks, {} Hz sweep)",
            period,
            self.config.sweep_frequency
        );
        let mut next: Option<Instant> = None;
        let mut enables = 0;
        let mut signal = self.signal.lock();
        loop {
            if signal.shutdown {
                break;
            }
            if !self.state.auto_pan() {
                next = None;
                self.wake.wait(&mut signal);
                continue;
            }
            if signal.enables != enables {
                enables = signal.enables;
                next = None;
            }
            // The first tick after an enable happens immediately
            let deadline = *next.get_or_insert_with(Instant::now);
            if Instant::now() < deadline {
                self.wake.wait_until(&mut signal, deadline);
                continue;
            }
            MutexGuard::unlocked(&mut signal, || self.tick());
            next = Some(reschedule(deadline, period, Instant::now()));
        }
        log::info!("Panning engine stopped");
    }

    fn tick(&self) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
        let mut sink = self.sink.lock();
        // Read the state under the sink lock so a disable's restore write is always last
        let snapshot = self.state.snapshot();
        if !snapshot.auto_pan {
            return;
        }
        let mut sweep = self.sweep.lock();
        match pan_tick(&mut *sweep, snapshot.intensity_cap, &mut *sink) {
            Ok(balance) => {
                log::trace!("Auto-pan {balance} at phase {:.3}", sweep.phase());
                if self.status.record_success(balance) {
                    log::info!("Audio endpoint recovered");
                    if let Ok(name) = sink.endpoint_name() {
                        self.status.set_endpoint_name(&name);
                    }
                }
            }
            Err(e) => {
                if self.status.record_failure(&e) {
                    log::warn!("Auto-pan write failed: {e}");
                } else {
                    log::debug!("Auto-pan write failed again: {e}");
                }
            }
        }
    }
}

/// Get the deadline after one that just ran, skipping any that were missed
fn reschedule(deadline: Instant, period: Duration, now: Instant) -> Instant {
    let after = deadline + period;
    if now <= after {
        return after;
    }
    let skipped = (now - after).as_nanos() / period.as_nanos().max(1) + 1;
    log::debug!("Auto-pan tick overran, skipping {skipped} tick(s)");
    now + period
}

impl<S> Drop for PanningEngine<S> {
    fn drop(&mut self) {
        self.inner.signal.lock().shutdown = true;
        self.inner.wake.notify_all();
        if let Some(handle) = self.handle.take() {
            log::debug!("Waiting for panning engine to stop...");
            let _ = handle.join();
        }
    }
}
