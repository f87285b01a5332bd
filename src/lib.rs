//! Motion sensor streams with a single canonical sign/unit convention.
//!
//! Each [`SensorStreamAdapter`] bridges one capability of a [`NativeSensorPort`]
//! to one subscriber, normalizing every raw reading on the way through.
//! [`MotionSensors`] bundles one adapter per [`SensorKind`] and answers the
//! host's availability and update-interval calls.

// Public modules
pub mod adapter;
pub mod config;
pub mod errors;
pub mod hub;
pub mod interval;
pub mod kind;
pub mod port;
pub mod sample;
pub mod simulated;
pub mod transform;

// Re-export commonly used types
pub use adapter::{AdapterState, SensorStreamAdapter};
pub use config::{load_config, MotionConfig};
pub use errors::{ConfigError, MethodError, PortError};
pub use hub::{MethodCall, MethodResult, MotionSensors, SampleStream};
pub use interval::{SamplingInterval, SensorDelay};
pub use kind::SensorKind;
pub use port::{AccelerationUnits, NativeSensorPort, RawCallback, RegistrationId};
pub use sample::{RawReading, ScreenRotation, SensorSample};
pub use simulated::SimulatedPort;

use tracing_subscriber::EnvFilter;

/// Initialize tracing with default configuration
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();
}
