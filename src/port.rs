//! Seam between the stream adapters and the platform's sensor services.
//!
//! A port is implemented once per target platform outside this crate (or by
//! [`crate::simulated::SimulatedPort`]). It owns the native registrations and
//! pushes raw readings into the callback it was handed, on whatever execution
//! context the platform delivers them.

use crate::errors::PortResult;
use crate::interval::SamplingInterval;
use crate::kind::SensorKind;
use crate::sample::RawReading;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Push callback invoked by the port for every native reading
pub type RawCallback = Arc<dyn Fn(RawReading) + Send + Sync>;

/// Handle to one native listener registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegistrationId(u64);

impl RegistrationId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RegistrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Units and sign convention of the port's acceleration readings
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AccelerationUnits {
    /// Multiples of g with the opposite sign to the canonical convention
    StandardGravity,
    /// m/s² already in the canonical sign convention
    #[default]
    MetersPerSecondSquared,
}

pub trait NativeSensorPort: Send + Sync {
    /// Side-effect free capability lookup
    fn is_available(&self, kind: SensorKind) -> bool;

    fn acceleration_units(&self) -> AccelerationUnits;

    /// Register a listener for `kind` at `interval`. Every registration is
    /// independent: unregistering it must not disturb any other one.
    fn register_at_interval(
        &self,
        kind: SensorKind,
        interval: SamplingInterval,
        callback: RawCallback,
    ) -> PortResult<RegistrationId>;

    /// Drop a registration. Unknown ids are ignored.
    fn unregister(&self, id: RegistrationId);
}
