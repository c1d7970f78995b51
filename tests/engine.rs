use std::{
    f32::consts::TAU,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    thread,
    time::{Duration, Instant},
};

use parking_lot::Mutex;
use swivel::*;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Write {
    balance: Balance,
    ok: bool,
}

/// A sink that logs every write and can be told to fail
#[derive(Clone, Default)]
struct Recorder {
    log: Arc<Mutex<Vec<Write>>>,
    fail_next: Arc<AtomicUsize>,
}

impl Recorder {
    fn writes(&self) -> Vec<Write> {
        self.log.lock().clone()
    }
    fn ok_writes(&self) -> Vec<Balance> {
        self.writes()
            .into_iter()
            .filter(|w| w.ok)
            .map(|w| w.balance)
            .collect()
    }
    fn fail(&self, n: usize) {
        self.fail_next.store(n, Ordering::SeqCst);
    }
}

impl ChannelVolumeSink for Recorder {
    fn set_channel_volume(&mut self, left: f32, right: f32) -> SinkResult<()> {
        let fail = self
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        self.log.lock().push(Write {
            balance: Balance { left, right },
            ok: !fail,
        });
        if fail {
            Err(SinkError::EndpointUnavailable)
        } else {
            Ok(())
        }
    }
}

fn init_log() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn fast_config() -> EngineConfig {
    EngineConfig::default()
        .tick_period(Duration::from_millis(2))
        .sweep_frequency(1.0)
}

fn wait_for(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    cond()
}

const TIMEOUT: Duration = Duration::from_secs(5);

#[test]
fn manual_write_while_disabled() {
    init_log();
    let sink = Recorder::default();
    let balancer = Balancer::with_config(sink.clone(), fast_config()).unwrap();
    balancer.set_manual(0.2, 0.8).unwrap();
    thread::sleep(Duration::from_millis(20));
    assert_eq!(sink.ok_writes(), [Balance::new(0.2, 0.8)]);
    assert_eq!(balancer.engine().ticks(), 0);
}

#[test]
fn disable_restores_manual_once() {
    init_log();
    let sink = Recorder::default();
    let balancer = Balancer::with_config(sink.clone(), fast_config()).unwrap();
    balancer.set_manual(0.3, 0.7).unwrap();
    balancer.set_auto_pan_enabled(true).unwrap();
    assert!(wait_for(TIMEOUT, || sink.writes().len() > 10));
    balancer.set_auto_pan_enabled(false).unwrap();
    let after_disable = sink.writes();
    assert_eq!(after_disable.last().unwrap().balance, Balance::new(0.3, 0.7));

    // Nothing else is written once disabled
    thread::sleep(Duration::from_millis(30));
    assert_eq!(sink.writes(), after_disable);
}

#[test]
fn manual_values_stored_during_auto_pan() {
    init_log();
    let sink = Recorder::default();
    let balancer = Balancer::with_config(sink.clone(), fast_config()).unwrap();
    balancer.set_auto_pan_enabled(true).unwrap();
    assert!(wait_for(TIMEOUT, || !sink.writes().is_empty()));
    balancer.set_manual(0.1, 0.6).unwrap();
    balancer.set_auto_pan_enabled(false).unwrap();
    let writes = sink.ok_writes();
    assert_eq!(writes.last(), Some(&Balance::new(0.1, 0.6)));
    assert_eq!(
        writes.iter().filter(|b| **b == Balance::new(0.1, 0.6)).count(),
        1
    );
}

#[test]
fn sweep_respects_cap() {
    init_log();
    let sink = Recorder::default();
    // One full rotation every 100 ticks
    let config = fast_config().sweep_frequency(5.0);
    let balancer = Balancer::with_config(sink.clone(), config).unwrap();
    assert_eq!(balancer.set_intensity_cap(0.4), 0.4);
    balancer.set_auto_pan_enabled(true).unwrap();
    assert!(wait_for(TIMEOUT, || sink.writes().len() > 120));
    balancer.set_auto_pan_enabled(false).unwrap();
    let writes = sink.ok_writes();
    let (restore, sweep) = writes.split_last().unwrap();
    assert_eq!(*restore, Balance::CENTERED);
    for b in sweep {
        assert!((b.left + b.right - 1.0).abs() < 1e-5, "{b:?}");
        assert!((b.left - 0.5).abs() <= 0.2 + 1e-5, "{b:?}");
    }
    // The sweep moved off center in both directions
    assert!(sweep.iter().any(|b| b.right > 0.55));
    assert!(sweep.iter().any(|b| b.left > 0.55));
}

#[test]
fn cap_change_applies_to_running_sweep() {
    init_log();
    let sink = Recorder::default();
    let balancer = Balancer::with_config(sink.clone(), fast_config().sweep_frequency(5.0)).unwrap();
    balancer.set_auto_pan_enabled(true).unwrap();
    assert!(wait_for(TIMEOUT, || {
        sink.ok_writes().iter().any(|b| *b != Balance::CENTERED)
    }));

    assert_eq!(balancer.set_intensity_cap(0.0), 0.0);
    // A tick already holding the old cap may still land
    let settled = sink.writes().len() + 1;
    assert!(wait_for(TIMEOUT, || sink.writes().len() > settled + 50));
    balancer.set_auto_pan_enabled(false).unwrap();
    let writes = sink.writes();
    assert!(writes[settled..].iter().all(|w| w.balance == Balance::CENTERED));
}

#[test]
fn failures_do_not_stop_ticking() {
    init_log();
    let sink = Recorder::default();
    let config = fast_config();
    let balancer = Balancer::with_config(sink.clone(), config).unwrap();
    let notifications = balancer.notifications();
    sink.fail(5);
    balancer.set_auto_pan_enabled(true).unwrap();
    assert!(wait_for(TIMEOUT, || sink.ok_writes().len() > 10));
    balancer.set_auto_pan_enabled(false).unwrap();

    let writes = sink.writes();
    assert!(writes[..5].iter().all(|w| !w.ok));
    // Failed ticks retried the same value
    assert!(writes[..6].iter().all(|w| w.balance == Balance::CENTERED));

    // Only successful ticks advanced the phase, the last success is the restore
    let pan_successes = sink.ok_writes().len() - 1;
    let expected = (pan_successes as f32 * config.angular_step()).rem_euclid(TAU);
    assert!(
        (balancer.engine().phase() - expected).abs() < 1e-3,
        "phase {} expected {expected}",
        balancer.engine().phase()
    );

    let received: Vec<_> = notifications.try_iter().collect();
    assert!(received.contains(&Notification::SinkFailed(SinkError::EndpointUnavailable)));
    assert!(received.contains(&Notification::SinkRecovered));
    assert_eq!(balancer.status().last_error, None);
}

#[test]
fn failed_restore_is_reported() {
    init_log();
    let sink = Recorder::default();
    let balancer = Balancer::with_config(sink.clone(), fast_config()).unwrap();
    balancer.set_auto_pan_enabled(true).unwrap();
    assert!(wait_for(TIMEOUT, || !sink.writes().is_empty()));
    sink.fail(usize::MAX);
    assert_eq!(
        balancer.set_auto_pan_enabled(false),
        Err(SinkError::EndpointUnavailable)
    );
    assert!(!balancer.snapshot().auto_pan);
    assert_eq!(
        balancer.status().last_error,
        Some(SinkError::EndpointUnavailable)
    );
}

#[test]
fn phase_resumes_by_default() {
    init_log();
    let sink = Recorder::default();
    let balancer = Balancer::with_config(sink.clone(), fast_config()).unwrap();
    balancer.set_auto_pan_enabled(true).unwrap();
    assert!(wait_for(TIMEOUT, || sink.writes().len() > 20));
    balancer.set_auto_pan_enabled(false).unwrap();
    // Let a tick that was already underway finish
    thread::sleep(Duration::from_millis(10));
    let phase = balancer.engine().phase();
    let ticks = balancer.engine().ticks();
    assert!(phase > 0.0);

    // Disabled engines do not tick
    thread::sleep(Duration::from_millis(30));
    assert_eq!(balancer.engine().phase(), phase);
    assert_eq!(balancer.engine().ticks(), ticks);

    let before = sink.writes().len();
    balancer.set_auto_pan_enabled(true).unwrap();
    assert!(wait_for(TIMEOUT, || sink.writes().len() > before));
    let resumed = sink.writes()[before].balance;
    let mut expected = Sweep::with(WaveShape::Sine, 0.0);
    expected.set_phase(phase);
    assert_eq!(resumed, expected.balance(1.0));
}

#[test]
fn phase_resets_when_configured() {
    init_log();
    let sink = Recorder::default();
    let config = fast_config().phase_on_enable(PhaseOnEnable::Reset);
    let balancer = Balancer::with_config(sink.clone(), config).unwrap();
    balancer.set_auto_pan_enabled(true).unwrap();
    assert!(wait_for(TIMEOUT, || sink.writes().len() > 20));
    balancer.set_auto_pan_enabled(false).unwrap();
    assert!(balancer.engine().phase() > 0.0);

    let before = sink.writes().len();
    balancer.set_auto_pan_enabled(true).unwrap();
    assert!(wait_for(TIMEOUT, || sink.writes().len() > before));
    assert_eq!(sink.writes()[before].balance, Balance::CENTERED);
}

#[test]
fn drop_stops_engine() {
    init_log();
    let sink = Recorder::default();
    let balancer = Balancer::with_config(sink.clone(), fast_config()).unwrap();
    balancer.set_auto_pan_enabled(true).unwrap();
    assert!(wait_for(TIMEOUT, || !sink.writes().is_empty()));
    drop(balancer);
    let writes = sink.writes().len();
    thread::sleep(Duration::from_millis(20));
    assert_eq!(sink.writes().len(), writes);
}
