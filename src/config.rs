use crate::errors::{ConfigError, ConfigResult};
use crate::interval::SamplingInterval;
use crate::kind::SensorKind;
use crate::port::AccelerationUnits;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;

/// Root configuration, `[platform]`, `[[sensor]]` and `[demo]` sections
#[derive(Debug, Default, Deserialize)]
pub struct MotionConfig {
    #[serde(default)]
    pub platform: PlatformConfig,
    #[serde(rename = "sensor", default)]
    pub sensors: Vec<SensorEntry>,
    #[serde(default)]
    pub demo: DemoConfig,
}

#[derive(Debug, Default, Deserialize)]
pub struct PlatformConfig {
    #[serde(default)]
    pub acceleration_units: AccelerationUnits,
}

/// One sensor entry, matching each `[[sensor]]` section
#[derive(Debug, Deserialize)]
pub struct SensorEntry {
    pub kind: SensorKind,
    #[serde(default = "default_available")]
    pub available: bool,
    pub interval_us: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct DemoConfig {
    #[serde(default = "default_run_seconds")]
    pub run_seconds: u64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self { run_seconds: default_run_seconds() }
    }
}

fn default_available() -> bool {
    true
}

fn default_run_seconds() -> u64 {
    5
}

impl MotionConfig {
    pub fn entry(&self, kind: SensorKind) -> Option<&SensorEntry> {
        self.sensors.iter().find(|s| s.kind == kind)
    }

    /// Sensors not listed are assumed present
    pub fn is_available(&self, kind: SensorKind) -> bool {
        self.entry(kind).map_or(true, |s| s.available)
    }

    pub fn initial_interval(&self, kind: SensorKind) -> SamplingInterval {
        self.entry(kind)
            .and_then(|s| s.interval_us)
            .map(SamplingInterval::from_micros)
            .unwrap_or_default()
    }

    fn validate(&self) -> ConfigResult<()> {
        let mut seen = HashSet::new();
        for s in &self.sensors {
            if !seen.insert(s.kind) {
                return Err(ConfigError::ValidationError(format!(
                    "sensor '{}' is configured more than once",
                    s.kind
                )));
            }
        }
        if self.demo.run_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "demo.run_seconds must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

pub fn parse_config(content: &str) -> ConfigResult<MotionConfig> {
    let parsed: MotionConfig = toml::from_str(content)?;
    parsed.validate()?;
    Ok(parsed)
}

/// Loads config from TOML file
pub fn load_config(path: &str) -> ConfigResult<MotionConfig> {
    let content = fs::read_to_string(path).map_err(|e| ConfigError::LoadError {
        path: path.to_string(),
        source: e,
    })?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_config() {
        let cfg = parse_config(
            r#"
            [platform]
            acceleration_units = "standard_gravity"

            [[sensor]]
            kind = "magnetometer"
            available = false

            [[sensor]]
            kind = "accelerometer"
            interval_us = 20000

            [demo]
            run_seconds = 2
            "#,
        )
        .unwrap();

        assert_eq!(cfg.platform.acceleration_units, AccelerationUnits::StandardGravity);
        assert!(!cfg.is_available(SensorKind::Magnetometer));
        assert!(cfg.is_available(SensorKind::Accelerometer));
        assert!(cfg.is_available(SensorKind::ScreenOrientation));
        assert_eq!(cfg.initial_interval(SensorKind::Accelerometer).as_micros(), 20_000);
        assert_eq!(cfg.initial_interval(SensorKind::Gyroscope), SamplingInterval::default());
        assert_eq!(cfg.demo.run_seconds, 2);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let cfg = parse_config("").unwrap();
        assert!(cfg.sensors.is_empty());
        assert_eq!(cfg.platform.acceleration_units, AccelerationUnits::MetersPerSecondSquared);
        assert_eq!(cfg.demo.run_seconds, 5);
    }

    #[test]
    fn test_duplicate_sensor_rejected() {
        let err = parse_config(
            r#"
            [[sensor]]
            kind = "gyroscope"
            [[sensor]]
            kind = "gyroscope"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_unknown_stream_rejected() {
        let err = parse_config("[[sensor]]\nkind = \"barometer\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::FormatError(_)));
    }

    #[test]
    fn test_zero_run_seconds_rejected() {
        let err = parse_config("[demo]\nrun_seconds = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = load_config("/nonexistent/motion_sensors.toml").unwrap_err();
        assert!(matches!(err, ConfigError::LoadError { .. }));
    }
}
