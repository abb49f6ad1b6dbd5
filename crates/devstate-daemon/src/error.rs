//! Daemon errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("not running")]
    NotRunning,

    #[error("module error: {0}")]
    Module(#[from] devstate_bus::ModuleError),

    #[error("protocol error: {0}")]
    Protocol(#[from] devstate_protocol::ProtocolError),

    #[error("sensor error: {0}")]
    Sensor(#[from] crate::sensor::SensorError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
