//! Internal bus messages.
//!
//! The set of message kinds is closed: every message a module can publish or
//! subscribe to is a variant of [`Message`], and its [`MessageKind`] is the
//! stable identity used for subscription matching.

use serde::{Deserialize, Serialize};

use crate::state::DeviceState;

/// Type tag of a bus message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MessageKind {
    StateChangeInd,
    ThermalShutdownInd,
    SaveDataInd,
    StateReqDeniedInd,
    VersionReport,
    GetVersion,
    PowerupReq,
    RebootReq,
    ShutdownReq,
    TransportConnected,
    TransportDisconnected,
    TemperatureSample,
}

impl MessageKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 12] = [
        Self::StateChangeInd,
        Self::ThermalShutdownInd,
        Self::SaveDataInd,
        Self::StateReqDeniedInd,
        Self::VersionReport,
        Self::GetVersion,
        Self::PowerupReq,
        Self::RebootReq,
        Self::ShutdownReq,
        Self::TransportConnected,
        Self::TransportDisconnected,
        Self::TemperatureSample,
    ];
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// A message carried on the internal bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Message {
    /// The state machine entered a new state.
    StateChangeInd { state: DeviceState },

    /// The device is about to power off because it is overheating.
    ThermalShutdownInd,

    /// Applications should save unsaved data now.
    SaveDataInd,

    /// A shutdown or reboot request was refused.
    StateReqDeniedInd {
        /// The state that was requested.
        state: DeviceState,
        /// Free-text reason for the denial.
        reason: String,
    },

    /// Answer to [`Message::GetVersion`].
    VersionReport { version: String },

    /// Ask for the daemon version; answered with [`Message::VersionReport`].
    GetVersion,

    /// Request a transition to the powered-up state.
    PowerupReq,

    /// Request a reboot.
    RebootReq,

    /// Request a shutdown.
    ShutdownReq,

    /// The external transport became available.
    TransportConnected,

    /// The external transport went away.
    TransportDisconnected,

    /// A temperature reading from the thermal sensor.
    TemperatureSample { celsius: i32 },
}

impl Message {
    /// Type tag of this message.
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::StateChangeInd { .. } => MessageKind::StateChangeInd,
            Self::ThermalShutdownInd => MessageKind::ThermalShutdownInd,
            Self::SaveDataInd => MessageKind::SaveDataInd,
            Self::StateReqDeniedInd { .. } => MessageKind::StateReqDeniedInd,
            Self::VersionReport { .. } => MessageKind::VersionReport,
            Self::GetVersion => MessageKind::GetVersion,
            Self::PowerupReq => MessageKind::PowerupReq,
            Self::RebootReq => MessageKind::RebootReq,
            Self::ShutdownReq => MessageKind::ShutdownReq,
            Self::TransportConnected => MessageKind::TransportConnected,
            Self::TransportDisconnected => MessageKind::TransportDisconnected,
            Self::TemperatureSample { .. } => MessageKind::TemperatureSample,
        }
    }
}
