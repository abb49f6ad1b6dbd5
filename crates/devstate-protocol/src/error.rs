//! Protocol and transport errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("transport not connected")]
    NotConnected,

    #[error("method already bound: {interface}.{method}")]
    AlreadyBound { interface: String, method: String },

    #[error("method not bound: {interface}.{method}")]
    NotBound { interface: String, method: String },

    #[error("unknown method: {interface}.{method}")]
    UnknownMethod { interface: String, method: String },

    #[error("serialisation error: {0}")]
    Serialization(String),

    #[error("deserialisation error: {0}")]
    Deserialization(String),

    #[error("peer channel closed")]
    ChannelClosed,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
