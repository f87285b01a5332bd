use crate::interval::SamplingInterval;
use crate::kind::SensorKind;
use crate::port::{NativeSensorPort, RawCallback, RegistrationId};
use crate::sample::{RawReading, SensorSample};
use crate::transform::Normalizer;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, trace, warn};

/// Receives every normalized sample while the adapter is listening.
///
/// Called on the port's delivery context. It must not call back into the
/// adapter that owns it.
pub type Subscriber = Box<dyn FnMut(SensorSample) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterState {
    Idle,
    Listening,
}

/// Owned by the caller side; serializes start/stop/set_interval
struct Lifecycle {
    interval: SamplingInterval,
    registration: Option<RegistrationId>,
    next_generation: u64,
}

/// Shared with the port callback
struct Delivery {
    subscriber: Option<Subscriber>,
    /// Only callbacks created for this generation may deliver
    generation: u64,
    last_screen: Option<f64>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Bridges one native sensor capability to one subscriber
pub struct SensorStreamAdapter {
    kind: SensorKind,
    normalizer: Normalizer,
    port: Arc<dyn NativeSensorPort>,
    lifecycle: Mutex<Lifecycle>,
    delivery: Arc<Mutex<Delivery>>,
}

impl SensorStreamAdapter {
    pub fn new(kind: SensorKind, port: Arc<dyn NativeSensorPort>) -> Self {
        Self::with_interval(kind, port, SamplingInterval::default())
    }

    pub fn with_interval(
        kind: SensorKind,
        port: Arc<dyn NativeSensorPort>,
        interval: SamplingInterval,
    ) -> Self {
        let normalizer = Normalizer::for_kind(kind, port.acceleration_units());
        Self {
            kind,
            normalizer,
            port,
            lifecycle: Mutex::new(Lifecycle {
                interval,
                registration: None,
                next_generation: 0,
            }),
            delivery: Arc::new(Mutex::new(Delivery {
                subscriber: None,
                generation: 0,
                last_screen: None,
            })),
        }
    }

    pub fn kind(&self) -> SensorKind {
        self.kind
    }

    pub fn state(&self) -> AdapterState {
        if lock(&self.lifecycle).registration.is_some() {
            AdapterState::Listening
        } else {
            AdapterState::Idle
        }
    }

    pub fn interval(&self) -> SamplingInterval {
        lock(&self.lifecycle).interval
    }

    pub fn is_available(&self) -> bool {
        self.port.is_available(self.kind)
    }

    /// Begin delivering samples to `subscriber`.
    ///
    /// An absent sensor is not an error: nothing is registered and the
    /// subscriber is never called. Starting while already listening swaps
    /// the subscriber and keeps the existing registration.
    pub fn start<F>(&self, subscriber: F)
    where
        F: FnMut(SensorSample) + Send + 'static,
    {
        let mut life = lock(&self.lifecycle);

        if life.registration.is_some() {
            let previous = {
                let mut d = lock(&self.delivery);
                d.last_screen = None;
                d.subscriber.replace(Box::new(subscriber))
            };
            drop(previous);
            debug!("[{}] subscriber replaced", self.kind);
            return;
        }

        if !self.port.is_available(self.kind) {
            debug!("[{}] sensor not available, skipping registration", self.kind);
            return;
        }

        life.next_generation += 1;
        let generation = life.next_generation;
        {
            let mut d = lock(&self.delivery);
            d.generation = generation;
            d.subscriber = Some(Box::new(subscriber));
            d.last_screen = None;
        }

        match self
            .port
            .register_at_interval(self.kind, life.interval, self.callback(generation))
        {
            Ok(id) => {
                life.registration = Some(id);
                info!(
                    "[{}] listening (registration {}, interval {}us)",
                    self.kind,
                    id,
                    life.interval.as_micros()
                );
            }
            Err(e) => {
                let dropped = lock(&self.delivery).subscriber.take();
                drop(dropped);
                warn!("[{}] registration failed: {}", self.kind, e);
            }
        }
    }

    /// Stop delivering samples. No-op when idle.
    pub fn stop(&self) {
        let mut life = lock(&self.lifecycle);
        let Some(id) = life.registration.take() else {
            return;
        };

        life.next_generation += 1;
        let dropped = {
            let mut d = lock(&self.delivery);
            d.generation = life.next_generation;
            d.last_screen = None;
            d.subscriber.take()
        };
        drop(dropped);

        self.port.unregister(id);
        info!("[{}] stopped (registration {})", self.kind, id);
    }

    /// Change the sampling interval. While listening the native listener is
    /// swapped for one at the new interval without touching the subscriber.
    pub fn set_interval(&self, interval: SamplingInterval) {
        let mut life = lock(&self.lifecycle);
        life.interval = interval;

        let Some(old) = life.registration.take() else {
            debug!(
                "[{}] interval set to {}us for next start",
                self.kind,
                interval.as_micros()
            );
            return;
        };

        self.port.unregister(old);

        life.next_generation += 1;
        let generation = life.next_generation;
        lock(&self.delivery).generation = generation;

        match self
            .port
            .register_at_interval(self.kind, interval, self.callback(generation))
        {
            Ok(id) => {
                life.registration = Some(id);
                debug!(
                    "[{}] re-registered {} -> {} at {}us",
                    self.kind,
                    old,
                    id,
                    interval.as_micros()
                );
            }
            Err(e) => {
                let dropped = lock(&self.delivery).subscriber.take();
                drop(dropped);
                warn!("[{}] re-registration failed: {}", self.kind, e);
            }
        }
    }

    fn callback(&self, generation: u64) -> RawCallback {
        let delivery = Arc::clone(&self.delivery);
        let normalizer = self.normalizer;
        let kind = self.kind;
        Arc::new(move |raw: RawReading| on_sample(&delivery, kind, normalizer, generation, raw))
    }
}

impl Drop for SensorStreamAdapter {
    fn drop(&mut self) {
        self.stop();
    }
}

fn on_sample(
    delivery: &Mutex<Delivery>,
    kind: SensorKind,
    normalizer: Normalizer,
    generation: u64,
    raw: RawReading,
) {
    let mut d = lock(delivery);
    if d.generation != generation {
        trace!("[{}] stale callback dropped", kind);
        return;
    }

    let Some(sample) = normalizer.apply(&raw) else {
        debug!("[{}] ignoring unexpected reading {:?}", kind, raw);
        return;
    };

    if let SensorSample::Scalar(degrees) = sample {
        if d.last_screen == Some(degrees) {
            return;
        }
        d.last_screen = Some(degrees);
    }

    match d.subscriber.as_mut() {
        Some(subscriber) => {
            trace!("[{}] {:?}", kind, sample);
            subscriber(sample);
        }
        None => trace!("[{}] no subscriber, sample dropped", kind),
    }
}
