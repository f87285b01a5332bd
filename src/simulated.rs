//! Stand-in native port that synthesizes readings on tokio tasks.
//!
//! Each registration gets its own producer task, so registrations are fully
//! independent of each other. Readings can also be pushed by hand with
//! [`SimulatedPort::inject`], which is how tests drive adapters.

use crate::config::MotionConfig;
use crate::errors::{PortError, PortResult};
use crate::interval::SamplingInterval;
use crate::kind::SensorKind;
use crate::port::{AccelerationUnits, NativeSensorPort, RawCallback, RegistrationId};
use crate::sample::{RawReading, ScreenRotation};
use crate::transform::STANDARD_GRAVITY;
use std::collections::{HashMap, HashSet};
use std::f64::consts::{PI, TAU};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use tracing::{debug, info, trace};

/// Producers never tick faster than this
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Display rotation advances every this many ticks
const TICKS_PER_ROTATION: u64 = 25;

struct Registration {
    kind: SensorKind,
    callback: RawCallback,
    producer: Option<JoinHandle<()>>,
}

pub struct SimulatedPort {
    units: AccelerationUnits,
    unavailable: Mutex<HashSet<SensorKind>>,
    autonomous: bool,
    next_id: AtomicU64,
    registrations: Mutex<HashMap<u64, Registration>>,
    registered_total: AtomicU64,
    unregistered_total: AtomicU64,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SimulatedPort {
    /// Port whose registrations are fed by producer tasks on the current tokio runtime
    pub fn new(units: AccelerationUnits) -> Self {
        Self::build(units, true)
    }

    /// Port that only delivers readings passed to [`SimulatedPort::inject`]
    pub fn manual(units: AccelerationUnits) -> Self {
        Self::build(units, false)
    }

    fn build(units: AccelerationUnits, autonomous: bool) -> Self {
        Self {
            units,
            unavailable: Mutex::new(HashSet::new()),
            autonomous,
            next_id: AtomicU64::new(1),
            registrations: Mutex::new(HashMap::new()),
            registered_total: AtomicU64::new(0),
            unregistered_total: AtomicU64::new(0),
        }
    }

    pub fn from_config(config: &MotionConfig) -> Self {
        let port = Self::new(config.platform.acceleration_units);
        for kind in SensorKind::ALL {
            port.set_available(kind, config.is_available(kind));
        }
        port
    }

    pub fn set_available(&self, kind: SensorKind, available: bool) {
        let mut unavailable = lock(&self.unavailable);
        if available {
            unavailable.remove(&kind);
        } else {
            unavailable.insert(kind);
        }
    }

    /// Push `reading` to every live registration of `kind`; returns how many were reached
    pub fn inject(&self, kind: SensorKind, reading: RawReading) -> usize {
        let callbacks: Vec<RawCallback> = lock(&self.registrations)
            .values()
            .filter(|r| r.kind == kind)
            .map(|r| r.callback.clone())
            .collect();
        for callback in &callbacks {
            callback(reading);
        }
        callbacks.len()
    }

    pub fn live_registrations(&self, kind: SensorKind) -> usize {
        lock(&self.registrations)
            .values()
            .filter(|r| r.kind == kind)
            .count()
    }

    pub fn registered_total(&self) -> u64 {
        self.registered_total.load(Ordering::Relaxed)
    }

    pub fn unregistered_total(&self) -> u64 {
        self.unregistered_total.load(Ordering::Relaxed)
    }
}

impl NativeSensorPort for SimulatedPort {
    fn is_available(&self, kind: SensorKind) -> bool {
        !lock(&self.unavailable).contains(&kind)
    }

    fn acceleration_units(&self) -> AccelerationUnits {
        self.units
    }

    fn register_at_interval(
        &self,
        kind: SensorKind,
        interval: SamplingInterval,
        callback: RawCallback,
    ) -> PortResult<RegistrationId> {
        if !self.is_available(kind) {
            return Err(PortError::Unavailable { kind });
        }

        let producer = if self.autonomous {
            let handle = Handle::try_current().map_err(|_| PortError::NoRuntime { kind })?;
            let motion = SyntheticMotion::new(self.units);
            Some(handle.spawn(produce(kind, interval, motion, callback.clone())))
        } else {
            None
        };

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        lock(&self.registrations).insert(id, Registration { kind, callback, producer });
        self.registered_total.fetch_add(1, Ordering::Relaxed);
        debug!(
            "[simulated] {} registered as #{} at {}us",
            kind,
            id,
            interval.as_micros()
        );
        Ok(RegistrationId::new(id))
    }

    fn unregister(&self, id: RegistrationId) {
        let Some(registration) = lock(&self.registrations).remove(&id.raw()) else {
            trace!("[simulated] unregister of unknown registration {}", id);
            return;
        };
        if let Some(producer) = registration.producer {
            producer.abort();
        }
        self.unregistered_total.fetch_add(1, Ordering::Relaxed);
        debug!("[simulated] {} registration {} removed", registration.kind, id);
    }
}

impl Drop for SimulatedPort {
    fn drop(&mut self) {
        for (_, registration) in lock(&self.registrations).drain() {
            if let Some(producer) = registration.producer {
                producer.abort();
            }
        }
    }
}

async fn produce(
    kind: SensorKind,
    interval: SamplingInterval,
    motion: SyntheticMotion,
    callback: RawCallback,
) {
    let period = interval.as_duration().max(MIN_PERIOD);
    info!("[simulated] {} producer running every {:?}", kind, period);

    let mut tick = 0u64;
    loop {
        let t = tick as f64 * period.as_secs_f64();
        callback(motion.reading(kind, tick, t));
        tick += 1;
        sleep(period).await;
    }
}

/// A device lying flat on a table, gently wobbling and turning slowly
/// counter-clockwise, whose display rotates a quarter turn now and then.
#[derive(Debug, Clone, Copy)]
struct SyntheticMotion {
    units: AccelerationUnits,
}

impl SyntheticMotion {
    const WOBBLE: f64 = 0.3;
    const YAW_RATE: f64 = 0.1;
    const FIELD_UT: [f64; 3] = [22.0, 5.0, -42.0];

    fn new(units: AccelerationUnits) -> Self {
        Self { units }
    }

    fn reading(&self, kind: SensorKind, tick: u64, t: f64) -> RawReading {
        match kind {
            SensorKind::Accelerometer => {
                self.acceleration([Self::WOBBLE * t.sin(), Self::WOBBLE * t.cos(), STANDARD_GRAVITY])
            }
            SensorKind::UserAcceleration => {
                self.acceleration([Self::WOBBLE * t.sin(), Self::WOBBLE * t.cos(), 0.0])
            }
            SensorKind::Gyroscope => RawReading::Vector([0.0, 0.0, Self::YAW_RATE]),
            SensorKind::Magnetometer => RawReading::Vector(Self::FIELD_UT),
            SensorKind::Orientation | SensorKind::AbsoluteOrientation => self.attitude(t),
            SensorKind::ScreenOrientation => {
                let quarter = (tick / TICKS_PER_ROTATION) % 4;
                RawReading::Rotation(ScreenRotation::from_degrees(quarter as i32 * 90))
            }
        }
    }

    /// Encode canonical m/s² in the port's native convention
    fn acceleration(&self, canonical: [f64; 3]) -> RawReading {
        match self.units {
            AccelerationUnits::StandardGravity => {
                RawReading::Vector(canonical.map(|a| -a / STANDARD_GRAVITY))
            }
            AccelerationUnits::MetersPerSecondSquared => RawReading::Vector(canonical),
        }
    }

    /// Gravity-unit platforms report fused attitude, SI platforms a rotation vector
    fn attitude(&self, t: f64) -> RawReading {
        let yaw = (Self::YAW_RATE * t + PI).rem_euclid(TAU) - PI;
        match self.units {
            AccelerationUnits::StandardGravity => RawReading::Attitude { yaw, pitch: 0.0, roll: 0.0 },
            AccelerationUnits::MetersPerSecondSquared => {
                RawReading::rotation_vector_xyz(0.0, 0.0, (yaw / 2.0).sin())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    fn counting() -> (Arc<AtomicUsize>, RawCallback) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        let cb: RawCallback = Arc::new(move |_: RawReading| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        (count, cb)
    }

    #[test]
    fn test_unavailable_kind_is_rejected() {
        let port = SimulatedPort::manual(AccelerationUnits::MetersPerSecondSquared);
        port.set_available(SensorKind::Magnetometer, false);
        assert!(!port.is_available(SensorKind::Magnetometer));

        let (_, cb) = counting();
        let err = port
            .register_at_interval(SensorKind::Magnetometer, SamplingInterval::default(), cb)
            .unwrap_err();
        assert!(matches!(err, PortError::Unavailable { kind: SensorKind::Magnetometer }));
    }

    #[test]
    fn test_autonomous_port_needs_runtime() {
        let port = SimulatedPort::new(AccelerationUnits::MetersPerSecondSquared);
        let (_, cb) = counting();
        let err = port
            .register_at_interval(SensorKind::Gyroscope, SamplingInterval::default(), cb)
            .unwrap_err();
        assert!(matches!(err, PortError::NoRuntime { .. }));
        assert_eq!(port.registered_total(), 0);
    }

    #[test]
    fn test_registrations_are_independent() {
        let port = SimulatedPort::manual(AccelerationUnits::MetersPerSecondSquared);
        let (first, cb1) = counting();
        let (second, cb2) = counting();
        let interval = SamplingInterval::default();

        let id1 = port.register_at_interval(SensorKind::Accelerometer, interval, cb1).unwrap();
        port.register_at_interval(SensorKind::Accelerometer, interval, cb2).unwrap();
        assert_eq!(port.inject(SensorKind::Accelerometer, RawReading::Vector([0.0; 3])), 2);

        port.unregister(id1);
        port.unregister(id1);
        assert_eq!(port.inject(SensorKind::Accelerometer, RawReading::Vector([0.0; 3])), 1);
        assert_eq!(port.inject(SensorKind::Gyroscope, RawReading::Vector([0.0; 3])), 0);

        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 2);
        assert_eq!(port.live_registrations(SensorKind::Accelerometer), 1);
        assert_eq!(port.unregistered_total(), 1);
    }

    #[tokio::test]
    async fn test_producer_runs_until_unregistered() {
        let port = SimulatedPort::new(AccelerationUnits::MetersPerSecondSquared);
        let (count, cb) = counting();
        let id = port
            .register_at_interval(SensorKind::Gyroscope, SamplingInterval::from_micros(1_000), cb)
            .unwrap();

        sleep(Duration::from_millis(30)).await;
        port.unregister(id);
        let at_stop = count.load(Ordering::SeqCst);
        assert!(at_stop > 0);

        sleep(Duration::from_millis(20)).await;
        assert_eq!(count.load(Ordering::SeqCst), at_stop);
    }

    #[test]
    fn test_gravity_platform_encodes_opposite_sign() {
        let motion = SyntheticMotion::new(AccelerationUnits::StandardGravity);
        match motion.reading(SensorKind::Accelerometer, 0, 0.0) {
            RawReading::Vector(v) => assert!((v[2] + 1.0).abs() < 1e-12),
            other => panic!("unexpected reading {:?}", other),
        }
        assert!(matches!(
            motion.reading(SensorKind::Orientation, 0, 0.0),
            RawReading::Attitude { .. }
        ));
    }

    #[test]
    fn test_display_rotation_advances() {
        let motion = SyntheticMotion::new(AccelerationUnits::MetersPerSecondSquared);
        let at = |tick| motion.reading(SensorKind::ScreenOrientation, tick, 0.0);
        assert_eq!(at(0), RawReading::Rotation(ScreenRotation::Rotation0));
        assert_eq!(at(TICKS_PER_ROTATION), RawReading::Rotation(ScreenRotation::Rotation90));
        assert_eq!(at(3 * TICKS_PER_ROTATION), RawReading::Rotation(ScreenRotation::Rotation270));
        assert_eq!(at(4 * TICKS_PER_ROTATION), RawReading::Rotation(ScreenRotation::Rotation0));
    }
}
