//! Shared types for devstate.
//!
//! This crate contains the types shared across the devstate workspace: the
//! closed set of internal bus messages, device states, and module identity.

pub mod message;
pub mod module;
pub mod state;

pub use message::{Message, MessageKind};
pub use module::ModuleId;
pub use state::{DeviceState, ParseStateError};
