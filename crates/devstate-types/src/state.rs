//! Device states reported by the state machine.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Device state as announced in state change notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceState {
    /// No state decided yet.
    NotSet,
    /// Powering off.
    Shutdown,
    /// Normal user mode.
    User,
    /// Charging while powered off ("acting dead").
    #[serde(rename = "ACTDEAD")]
    ActDead,
    /// Restarting.
    Reboot,
    /// Test mode.
    Test,
    /// Malfunction.
    Malf,
    /// Booting.
    Boot,
    /// Local mode.
    Local,
}

impl DeviceState {
    /// Every state, in declaration order.
    pub const ALL: [Self; 9] = [
        Self::NotSet,
        Self::Shutdown,
        Self::User,
        Self::ActDead,
        Self::Reboot,
        Self::Test,
        Self::Malf,
        Self::Boot,
        Self::Local,
    ];

    /// Whether entering this state takes the device down.
    pub fn is_shutdown_imminent(self) -> bool {
        matches!(self, Self::Shutdown | Self::ActDead | Self::Reboot)
    }

    /// Canonical upper-case name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotSet => "NOT_SET",
            Self::Shutdown => "SHUTDOWN",
            Self::User => "USER",
            Self::ActDead => "ACTDEAD",
            Self::Reboot => "REBOOT",
            Self::Test => "TEST",
            Self::Malf => "MALF",
            Self::Boot => "BOOT",
            Self::Local => "LOCAL",
        }
    }
}

impl std::fmt::Display for DeviceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown device state: {0}")]
pub struct ParseStateError(pub String);

impl FromStr for DeviceState {
    type Err = ParseStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|state| state.as_str() == upper)
            .ok_or_else(|| ParseStateError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shutdown_imminent_states() {
        let imminent: Vec<DeviceState> = DeviceState::ALL
            .into_iter()
            .filter(|s| s.is_shutdown_imminent())
            .collect();
        assert_eq!(
            imminent,
            vec![DeviceState::Shutdown, DeviceState::ActDead, DeviceState::Reboot]
        );
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("actdead".parse::<DeviceState>(), Ok(DeviceState::ActDead));
        assert_eq!(" USER ".parse::<DeviceState>(), Ok(DeviceState::User));
    }

    #[test]
    fn parse_rejects_unknown() {
        assert_eq!(
            "SLEEP".parse::<DeviceState>(),
            Err(ParseStateError("SLEEP".to_string()))
        );
    }

    #[test]
    fn display_matches_parse() {
        for state in DeviceState::ALL {
            assert_eq!(state.to_string().parse::<DeviceState>(), Ok(state));
        }
    }

    #[test]
    fn serde_name_matches_display() {
        for state in DeviceState::ALL {
            let json = serde_json::to_string(&state).unwrap();
            assert_eq!(json, format!("\"{state}\""));
            let back: DeviceState = serde_json::from_str(&json).unwrap();
            assert_eq!(back, state);
        }
    }
}
