use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Native cadence classes a listener can be registered at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorDelay {
    Fastest,
    Game,
    Ui,
    Normal,
}

impl SensorDelay {
    pub fn micros(&self) -> u64 {
        match self {
            SensorDelay::Fastest => 0,
            SensorDelay::Game => 20_000,
            SensorDelay::Ui => 66_667,
            SensorDelay::Normal => 200_000,
        }
    }
}

/// Time between two native callbacks, in microseconds
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct SamplingInterval(u64);

impl SamplingInterval {
    pub const fn from_micros(micros: u64) -> Self {
        Self(micros)
    }

    pub fn as_micros(&self) -> u64 {
        self.0
    }

    pub fn as_duration(&self) -> Duration {
        Duration::from_micros(self.0)
    }
}

impl Default for SamplingInterval {
    fn default() -> Self {
        SensorDelay::Normal.into()
    }
}

impl From<SensorDelay> for SamplingInterval {
    fn from(delay: SensorDelay) -> Self {
        Self(delay.micros())
    }
}

impl From<Duration> for SamplingInterval {
    fn from(d: Duration) -> Self {
        Self(u64::try_from(d.as_micros()).unwrap_or(u64::MAX))
    }
}
