use crate::adapter::SensorStreamAdapter;
use crate::config::MotionConfig;
use crate::errors::{CallResult, MethodError};
use crate::interval::SamplingInterval;
use crate::kind::SensorKind;
use crate::port::NativeSensorPort;
use crate::sample::SensorSample;
use serde::Deserialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, info};

/// Samples of one stream. Ends only when the stream is cancelled or
/// re-listened; an absent sensor leaves it open and silent.
pub type SampleStream = UnboundedReceiverStream<SensorSample>;

pub const IS_SENSOR_AVAILABLE: &str = "isSensorAvailable";
pub const SET_SENSOR_UPDATE_INTERVAL: &str = "setSensorUpdateInterval";

/// Request/response calls accepted from the host
#[derive(Debug, Clone, PartialEq)]
pub enum MethodCall {
    IsSensorAvailable { sensor_type: i64 },
    SetSensorUpdateInterval { sensor_type: i64, interval_us: i64 },
    Other(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodResult {
    Available(bool),
    Done,
    NotImplemented,
}

#[derive(Deserialize)]
struct Envelope {
    method: String,
    #[serde(default)]
    arguments: serde_json::Value,
}

#[derive(Deserialize)]
struct IntervalArguments {
    #[serde(rename = "sensorType")]
    sensor_type: i64,
    interval: i64,
}

impl MethodCall {
    /// Decode `{"method": ..., "arguments": ...}`
    pub fn from_json(json: &str) -> CallResult<Self> {
        let envelope: Envelope = serde_json::from_str(json)?;
        match envelope.method.as_str() {
            IS_SENSOR_AVAILABLE => {
                let sensor_type: i64 = serde_json::from_value(envelope.arguments)?;
                Ok(MethodCall::IsSensorAvailable { sensor_type })
            }
            SET_SENSOR_UPDATE_INTERVAL => {
                let args: IntervalArguments = serde_json::from_value(envelope.arguments)?;
                Ok(MethodCall::SetSensorUpdateInterval {
                    sensor_type: args.sensor_type,
                    interval_us: args.interval,
                })
            }
            _ => Ok(MethodCall::Other(envelope.method)),
        }
    }
}

/// One adapter per stream, all sharing the same native port
pub struct MotionSensors {
    port: Arc<dyn NativeSensorPort>,
    adapters: [SensorStreamAdapter; SensorKind::COUNT],
    /// Keeps each listened stream open until cancel, whether or not the
    /// adapter ever holds a subscriber
    senders: [Mutex<Option<UnboundedSender<SensorSample>>>; SensorKind::COUNT],
}

impl MotionSensors {
    pub fn new(port: Arc<dyn NativeSensorPort>) -> Self {
        Self::build(port, |_| SamplingInterval::default())
    }

    /// Hub whose streams start at the intervals given in `config`
    pub fn with_config(port: Arc<dyn NativeSensorPort>, config: &MotionConfig) -> Self {
        Self::build(port, |kind| config.initial_interval(kind))
    }

    fn build(
        port: Arc<dyn NativeSensorPort>,
        interval: impl Fn(SensorKind) -> SamplingInterval,
    ) -> Self {
        // both arrays follow SensorKind::ALL, looked up by SensorKind::index
        let adapters = SensorKind::ALL
            .map(|kind| SensorStreamAdapter::with_interval(kind, port.clone(), interval(kind)));
        let senders = std::array::from_fn(|_| Mutex::new(None));
        info!("[hub] {} streams ready", SensorKind::COUNT);
        Self { port, adapters, senders }
    }

    pub fn adapter(&self, kind: SensorKind) -> &SensorStreamAdapter {
        &self.adapters[kind.index()]
    }

    fn sender(&self, kind: SensorKind) -> MutexGuard<'_, Option<UnboundedSender<SensorSample>>> {
        self.senders[kind.index()]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Subscribe to `kind`. A previous stream of the same kind is ended.
    pub fn listen(&self, kind: SensorKind) -> SampleStream {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut slot = self.sender(kind);
        let previous = slot.replace(tx.clone());
        self.adapter(kind).start(move |sample| {
            // receiver gone: the host stopped reading without cancelling
            let _ = tx.send(sample);
        });
        drop(previous);
        UnboundedReceiverStream::new(rx)
    }

    pub fn listen_stream(&self, name: &str) -> Option<SampleStream> {
        SensorKind::from_stream_name(name).map(|kind| self.listen(kind))
    }

    /// Stop `kind` and end its stream
    pub fn cancel(&self, kind: SensorKind) {
        let mut slot = self.sender(kind);
        self.adapter(kind).stop();
        slot.take();
    }

    pub fn cancel_all(&self) {
        for kind in SensorKind::ALL {
            self.cancel(kind);
        }
    }

    pub fn is_sensor_available(&self, kind: SensorKind) -> bool {
        self.port.is_available(kind)
    }

    pub fn set_sensor_update_interval(&self, kind: SensorKind, interval: SamplingInterval) {
        self.adapter(kind).set_interval(interval);
    }

    pub fn handle(&self, call: MethodCall) -> CallResult<MethodResult> {
        match call {
            MethodCall::IsSensorAvailable { sensor_type } => {
                let available = SensorKind::from_type_code(sensor_type)
                    .is_some_and(|kind| self.is_sensor_available(kind));
                Ok(MethodResult::Available(available))
            }
            MethodCall::SetSensorUpdateInterval { sensor_type, interval_us } => {
                let interval = u64::try_from(interval_us).map_err(|_| {
                    MethodError::InvalidArguments {
                        method: SET_SENSOR_UPDATE_INTERVAL.to_string(),
                        reason: format!("negative interval {}", interval_us),
                    }
                })?;
                match SensorKind::from_type_code(sensor_type) {
                    Some(kind) => {
                        self.set_sensor_update_interval(kind, SamplingInterval::from_micros(interval))
                    }
                    None => debug!("[hub] ignoring interval for unknown sensor type {}", sensor_type),
                }
                Ok(MethodResult::Done)
            }
            MethodCall::Other(method) => {
                debug!("[hub] method '{}' not implemented", method);
                Ok(MethodResult::NotImplemented)
            }
        }
    }

    pub fn handle_json(&self, json: &str) -> CallResult<MethodResult> {
        self.handle(MethodCall::from_json(json)?)
    }
}
