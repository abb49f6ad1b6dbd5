//! Names on the external surface.
//!
//! Method and signal names are part of the wire contract and must not change.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// `get_version` reply before any version has been reported.
pub const UNKNOWN_VERSION: &str = "unknown";

/// Logged in place of a caller whose name cannot be resolved.
pub const UNKNOWN_SENDER: &str = "(unknown)";

/// Methods callable from outside the daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    GetVersion,
    ReqPowerup,
    ReqReboot,
    ReqShutdown,
}

impl Method {
    pub const ALL: [Self; 4] = [
        Self::GetVersion,
        Self::ReqPowerup,
        Self::ReqReboot,
        Self::ReqShutdown,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::GetVersion => "get_version",
            Self::ReqPowerup => "req_powerup",
            Self::ReqReboot => "req_reboot",
            Self::ReqShutdown => "req_shutdown",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown method name: {0}")]
pub struct ParseMethodError(pub String);

impl FromStr for Method {
    type Err = ParseMethodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| ParseMethodError(s.to_string()))
    }
}

/// Signals the daemon emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalName {
    ShutdownInd,
    ThermalShutdownInd,
    SaveUnsavedDataInd,
    StateReqDeniedInd,
}

impl SignalName {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ShutdownInd => "shutdown_ind",
            Self::ThermalShutdownInd => "thermal_shutdown_ind",
            Self::SaveUnsavedDataInd => "save_unsaved_data_ind",
            Self::StateReqDeniedInd => "state_req_denied_ind",
        }
    }
}

impl std::fmt::Display for SignalName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where methods are bound and signals are emitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
    #[serde(default = "default_service")]
    pub service: String,
    #[serde(default = "default_request_interface")]
    pub request_interface: String,
    #[serde(default = "default_signal_interface")]
    pub signal_interface: String,
    #[serde(default = "default_signal_path")]
    pub signal_path: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            service: default_service(),
            request_interface: default_request_interface(),
            signal_interface: default_signal_interface(),
            signal_path: default_signal_path(),
        }
    }
}

fn default_service() -> String {
    "org.devstate".to_string()
}

fn default_request_interface() -> String {
    "org.devstate.request".to_string()
}

fn default_signal_interface() -> String {
    "org.devstate.signal".to_string()
}

fn default_signal_path() -> String {
    "/org/devstate/signal".to_string()
}
