//! External method/signal surface for devstate.
//!
//! This crate names the operations and signals the daemon exposes to outside
//! callers, defines the [`Connection`] abstraction the bridge binds them
//! through, and provides the length-prefixed bincode framing used by the
//! in-process [`LocalConnection`].

pub mod connection;
pub mod error;
pub mod interface;
pub mod local;
pub mod message;
pub mod wire;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use connection::{Connection, MethodHandler};
pub use error::ProtocolError;
pub use interface::{
    Endpoints, Method, ParseMethodError, SignalName, UNKNOWN_SENDER, UNKNOWN_VERSION,
};
pub use local::{LocalConnection, LocalPeer};
pub use message::{MethodCall, Reply, Signal};
