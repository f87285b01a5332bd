use serde::{Deserialize, Serialize};

/// Discrete display rotation reported by the window system
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenRotation {
    Rotation0,
    Rotation90,
    Rotation180,
    Rotation270,
    /// Anything the window system could not classify (face up, face down, ...)
    Unknown,
}

impl ScreenRotation {
    /// Map a rotation in whole degrees; anything off the quarter turns is `Unknown`
    pub fn from_degrees(degrees: i32) -> Self {
        match degrees.rem_euclid(360) {
            0 => ScreenRotation::Rotation0,
            90 => ScreenRotation::Rotation90,
            180 => ScreenRotation::Rotation180,
            270 => ScreenRotation::Rotation270,
            _ => ScreenRotation::Unknown,
        }
    }
}

/// Reading as pushed by a native sensor port, before normalization
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawReading {
    /// Three axis values in the port's native units
    Vector([f64; 3]),
    /// Unit quaternion (x, y, z, w) from a rotation-vector provider
    RotationVector([f64; 4]),
    /// Row-major 3x3 rotation matrix
    RotationMatrix([f64; 9]),
    /// Fused attitude in radians, already in the canonical sign convention
    Attitude { yaw: f64, pitch: f64, roll: f64 },
    Rotation(ScreenRotation),
}

impl RawReading {
    /// Rotation vector given only its (x, y, z) part; the scalar is
    /// recovered from the unit-norm constraint.
    pub fn rotation_vector_xyz(x: f64, y: f64, z: f64) -> Self {
        let w = (1.0 - x * x - y * y - z * z).max(0.0).sqrt();
        RawReading::RotationVector([x, y, z, w])
    }
}

/// Normalized value delivered to a subscriber
///
/// Serializes to the stream payload: `[x, y, z]` or a bare number.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(untagged)]
pub enum SensorSample {
    /// m/s², rad/s, µT or [yaw, pitch, roll] radians depending on the stream
    Vector([f64; 3]),
    /// Screen orientation in degrees
    Scalar(f64),
}

impl SensorSample {
    pub fn as_vector(&self) -> Option<[f64; 3]> {
        match self {
            SensorSample::Vector(v) => Some(*v),
            SensorSample::Scalar(_) => None,
        }
    }

    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            SensorSample::Scalar(s) => Some(*s),
            SensorSample::Vector(_) => None,
        }
    }

    /// Serialize to the JSON payload carried on the event stream
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_shapes() {
        let v = SensorSample::Vector([1.0, -2.5, 9.8]);
        assert_eq!(v.to_json().unwrap(), "[1.0,-2.5,9.8]");

        let s = SensorSample::Scalar(-90.0);
        assert_eq!(s.to_json().unwrap(), "-90.0");

        let decoded: SensorSample = serde_json::from_str("180.0").unwrap();
        assert_eq!(decoded.as_scalar(), Some(180.0));
        assert_eq!(decoded.as_vector(), None);
    }

    #[test]
    fn test_rotation_vector_scalar_recovered() {
        match RawReading::rotation_vector_xyz(0.0, 0.0, 0.6) {
            RawReading::RotationVector(q) => assert!((q[3] - 0.8).abs() < 1e-12),
            other => panic!("unexpected reading {:?}", other),
        }
        // slightly overshooting input must not produce NaN
        match RawReading::rotation_vector_xyz(0.8, 0.6, 0.01) {
            RawReading::RotationVector(q) => assert_eq!(q[3], 0.0),
            other => panic!("unexpected reading {:?}", other),
        }
    }

    #[test]
    fn test_screen_rotation_from_degrees() {
        assert_eq!(ScreenRotation::from_degrees(-90), ScreenRotation::Rotation270);
        assert_eq!(ScreenRotation::from_degrees(450), ScreenRotation::Rotation90);
        assert_eq!(ScreenRotation::from_degrees(45), ScreenRotation::Unknown);
    }
}
