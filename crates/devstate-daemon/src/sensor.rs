//! Temperature sensor boundary.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SensorError {
    #[error("sensor not available")]
    Unavailable,

    #[error("failed to read sensor: {0}")]
    Read(String),
}

/// Source of temperature readings, polled by the daemon loop.
#[async_trait]
pub trait TemperatureSensor: Send + 'static {
    /// Whether the sensor can be used on this device at all.
    ///
    /// Unavailable sensors are never polled.
    fn is_available(&self) -> bool {
        true
    }

    /// Read the current temperature in degrees Celsius.
    async fn read_celsius(&mut self) -> Result<i32, SensorError>;
}

#[derive(Debug, Clone)]
enum Reading {
    Celsius(i32),
    Fails(String),
    Missing,
}

/// Sensor that always gives the same answer.
#[derive(Debug, Clone)]
pub struct FixedSensor {
    reading: Reading,
}

impl FixedSensor {
    /// Always reads `celsius`.
    pub fn new(celsius: i32) -> Self {
        Self {
            reading: Reading::Celsius(celsius),
        }
    }

    /// Available, but every read fails with `reason`.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            reading: Reading::Fails(reason.into()),
        }
    }

    /// Not present on this device.
    pub fn unavailable() -> Self {
        Self {
            reading: Reading::Missing,
        }
    }
}

#[async_trait]
impl TemperatureSensor for FixedSensor {
    fn is_available(&self) -> bool {
        !matches!(self.reading, Reading::Missing)
    }

    async fn read_celsius(&mut self) -> Result<i32, SensorError> {
        match &self.reading {
            Reading::Celsius(celsius) => Ok(*celsius),
            Reading::Fails(reason) => Err(SensorError::Read(reason.clone())),
            Reading::Missing => Err(SensorError::Unavailable),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fixed_sensor_reads_its_value() {
        let mut sensor = FixedSensor::new(42);
        assert!(sensor.is_available());
        assert_eq!(sensor.read_celsius().await.unwrap(), 42);
    }

    #[tokio::test]
    async fn failing_sensor_reports_read_error() {
        let mut sensor = FixedSensor::failing("i2c timeout");
        assert!(sensor.is_available());
        let err = sensor.read_celsius().await.unwrap_err();
        assert!(matches!(err, SensorError::Read(ref reason) if reason == "i2c timeout"));
        assert_eq!(err.to_string(), "failed to read sensor: i2c timeout");
    }

    #[tokio::test]
    async fn unavailable_sensor() {
        let mut sensor = FixedSensor::unavailable();
        assert!(!sensor.is_available());
        assert!(matches!(
            sensor.read_celsius().await,
            Err(SensorError::Unavailable)
        ));
    }
}
