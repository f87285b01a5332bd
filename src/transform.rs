//! Normalization of raw readings into the canonical convention.
//!
//! Canonical convention:
//! - acceleration in m/s², positive along the axis the device is pushed towards
//! - yaw counter-clockwise, pitch and roll in the attitude-provider sense
//! - absolute yaw measured from magnetic north along the device y-axis
//! - screen orientation in degrees from {0, 90, 180, -90}

use crate::kind::SensorKind;
use crate::port::AccelerationUnits;
use crate::sample::{RawReading, ScreenRotation, SensorSample};
use std::f64::consts::{FRAC_PI_2, PI, TAU};

pub const STANDARD_GRAVITY: f64 = 9.8;

/// Index of the matrix element pitch is extracted from
const PITCH_SOURCE: usize = 7;

pub fn normalize_acceleration(v: [f64; 3], units: AccelerationUnits) -> [f64; 3] {
    match units {
        AccelerationUnits::StandardGravity => v.map(|a| -a * STANDARD_GRAVITY),
        AccelerationUnits::MetersPerSecondSquared => v,
    }
}

/// Row-major rotation matrix from a unit quaternion (x, y, z, w)
pub fn rotation_matrix_from_quaternion(q: [f64; 4]) -> [f64; 9] {
    let [x, y, z, w] = q;

    let sq_x = 2.0 * x * x;
    let sq_y = 2.0 * y * y;
    let sq_z = 2.0 * z * z;
    let xy = 2.0 * x * y;
    let zw = 2.0 * z * w;
    let xz = 2.0 * x * z;
    let yw = 2.0 * y * w;
    let yz = 2.0 * y * z;
    let xw = 2.0 * x * w;

    [
        1.0 - sq_y - sq_z, xy - zw, xz + yw,
        xy + zw, 1.0 - sq_x - sq_z, yz - xw,
        xz - yw, yz + xw, 1.0 - sq_x - sq_y,
    ]
}

/// Azimuth, pitch and roll as the rotation-vector provider defines them.
///
/// The pitch source element is clamped to [-1, 1] first so float overshoot
/// can never push `asin` out of its domain.
pub fn orientation_from_matrix(m: &[f64; 9]) -> [f64; 3] {
    let pitch_source = m[PITCH_SOURCE].clamp(-1.0, 1.0);
    [
        m[1].atan2(m[4]),
        (-pitch_source).asin(),
        (-m[6]).atan2(m[8]),
    ]
}

/// Provider orientation to canonical [yaw, pitch, roll]
fn canonical_from_matrix(m: &[f64; 9]) -> [f64; 3] {
    let [azimuth, pitch, roll] = orientation_from_matrix(m);
    [-azimuth, -pitch, roll]
}

/// Rotate an attitude yaw measured from the x-axis so that it is measured
/// from the y-axis, wrapped into (-π, π].
pub fn rotate_yaw_to_north(yaw: f64) -> f64 {
    let wrapped = (yaw + PI + FRAC_PI_2).rem_euclid(TAU) - PI;
    if wrapped <= -PI {
        wrapped + TAU
    } else {
        wrapped
    }
}

pub fn screen_degrees(rotation: ScreenRotation) -> f64 {
    match rotation {
        ScreenRotation::Rotation0 => 0.0,
        ScreenRotation::Rotation90 => 90.0,
        ScreenRotation::Rotation180 => 180.0,
        ScreenRotation::Rotation270 => -90.0,
        ScreenRotation::Unknown => 0.0,
    }
}

/// Per-kind transform, chosen once when an adapter is built
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Normalizer {
    Acceleration(AccelerationUnits),
    Passthrough,
    Orientation { magnetic_north: bool },
    Screen,
}

impl Normalizer {
    pub fn for_kind(kind: SensorKind, units: AccelerationUnits) -> Self {
        match kind {
            SensorKind::Accelerometer | SensorKind::UserAcceleration => {
                Normalizer::Acceleration(units)
            }
            SensorKind::Gyroscope | SensorKind::Magnetometer => Normalizer::Passthrough,
            SensorKind::Orientation => Normalizer::Orientation { magnetic_north: false },
            SensorKind::AbsoluteOrientation => Normalizer::Orientation { magnetic_north: true },
            SensorKind::ScreenOrientation => Normalizer::Screen,
        }
    }

    /// Transform one reading. `None` means the reading does not belong to
    /// this stream and is dropped.
    pub fn apply(&self, raw: &RawReading) -> Option<SensorSample> {
        match (self, raw) {
            (Normalizer::Acceleration(units), RawReading::Vector(v)) => {
                Some(SensorSample::Vector(normalize_acceleration(*v, *units)))
            }
            (Normalizer::Passthrough, RawReading::Vector(v)) => Some(SensorSample::Vector(*v)),
            (Normalizer::Orientation { .. }, RawReading::RotationVector(q)) => {
                let m = rotation_matrix_from_quaternion(*q);
                Some(SensorSample::Vector(canonical_from_matrix(&m)))
            }
            (Normalizer::Orientation { .. }, RawReading::RotationMatrix(m)) => {
                Some(SensorSample::Vector(canonical_from_matrix(m)))
            }
            (Normalizer::Orientation { magnetic_north }, RawReading::Attitude { yaw, pitch, roll }) => {
                let yaw = if *magnetic_north { rotate_yaw_to_north(*yaw) } else { *yaw };
                Some(SensorSample::Vector([yaw, *pitch, *roll]))
            }
            (Normalizer::Screen, RawReading::Rotation(r)) => {
                Some(SensorSample::Scalar(screen_degrees(*r)))
            }
            _ => None,
        }
    }
}
