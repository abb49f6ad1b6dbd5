//! Core daemon for devstate.
//!
//! Wires the statically known modules into a [`ModuleRegistry`], exposes bus
//! traffic through the protocol [`bridge`], and runs the single dispatch loop
//! that serialises bus publishes, transport notifications and sensor polls.
//!
//! [`ModuleRegistry`]: devstate_bus::ModuleRegistry

pub mod bridge;
pub mod config;
pub mod daemon;
pub mod error;
pub mod sensor;
pub mod setup;
pub mod thermal;
pub mod version;

pub use bridge::{BridgeHandle, BridgeModule};
pub use config::Config;
pub use daemon::{Daemon, DaemonEvent, DaemonStatus, LoopHandle};
pub use error::DaemonError;
pub use sensor::{FixedSensor, SensorError, TemperatureSensor};
pub use thermal::ThermalModule;
pub use version::VersionModule;
