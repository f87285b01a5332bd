use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Prefix used by the host when naming the event channel of each stream
pub const CHANNEL_PREFIX: &str = "motion_sensors";

/// One logical motion stream exposed to the application layer
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorKind {
    #[serde(rename = "accelerometer")]
    Accelerometer,
    /// Acceleration with gravity removed
    #[serde(rename = "user_accelerometer")]
    UserAcceleration,
    #[serde(rename = "gyroscope")]
    Gyroscope,
    #[serde(rename = "magnetometer")]
    Magnetometer,
    /// Yaw/pitch/roll against a device-arbitrary reference frame
    #[serde(rename = "orientation")]
    Orientation,
    /// Yaw/pitch/roll against magnetic north
    #[serde(rename = "absolute_orientation")]
    AbsoluteOrientation,
    /// Discrete display rotation in degrees
    #[serde(rename = "screen_orientation")]
    ScreenOrientation,
}

impl SensorKind {
    pub const COUNT: usize = 7;

    pub const ALL: [SensorKind; Self::COUNT] = [
        SensorKind::Accelerometer,
        SensorKind::UserAcceleration,
        SensorKind::Gyroscope,
        SensorKind::Magnetometer,
        SensorKind::Orientation,
        SensorKind::AbsoluteOrientation,
        SensorKind::ScreenOrientation,
    ];

    /// Stream identifier as seen by the application layer
    pub fn stream_name(&self) -> &'static str {
        match self {
            SensorKind::Accelerometer => "accelerometer",
            SensorKind::UserAcceleration => "user_accelerometer",
            SensorKind::Gyroscope => "gyroscope",
            SensorKind::Magnetometer => "magnetometer",
            SensorKind::Orientation => "orientation",
            SensorKind::AbsoluteOrientation => "absolute_orientation",
            SensorKind::ScreenOrientation => "screen_orientation",
        }
    }

    /// Full event channel name, e.g. `motion_sensors/gyroscope`
    pub fn channel_name(&self) -> String {
        format!("{}/{}", CHANNEL_PREFIX, self.stream_name())
    }

    pub fn from_stream_name(name: &str) -> Option<Self> {
        let name = name
            .strip_prefix(CHANNEL_PREFIX)
            .map_or(Some(name), |rest| rest.strip_prefix('/'))?;
        Self::ALL.iter().copied().find(|k| k.stream_name() == name)
    }

    /// Numeric sensor type used by the method-call surface.
    ///
    /// Screen orientation is driven by display events and has no code.
    pub fn type_code(&self) -> Option<i64> {
        match self {
            SensorKind::Accelerometer => Some(1),
            SensorKind::Magnetometer => Some(2),
            SensorKind::Gyroscope => Some(4),
            SensorKind::UserAcceleration => Some(10),
            SensorKind::Orientation => Some(11),
            SensorKind::AbsoluteOrientation => Some(15),
            SensorKind::ScreenOrientation => None,
        }
    }

    pub fn from_type_code(code: i64) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.type_code() == Some(code))
    }

    /// Position of this kind in [`SensorKind::ALL`]
    pub fn index(&self) -> usize {
        match self {
            SensorKind::Accelerometer => 0,
            SensorKind::UserAcceleration => 1,
            SensorKind::Gyroscope => 2,
            SensorKind::Magnetometer => 3,
            SensorKind::Orientation => 4,
            SensorKind::AbsoluteOrientation => 5,
            SensorKind::ScreenOrientation => 6,
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.stream_name())
    }
}

impl FromStr for SensorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_stream_name(s).ok_or_else(|| format!("Unknown sensor stream '{}'", s))
    }
}
