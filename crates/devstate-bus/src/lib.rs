//! In-process message bus and module registry for devstate.
//!
//! Modules never call each other. They register handlers for message kinds
//! on the [`Bus`] when loaded and publish [`Message`]s that the bus fans out
//! synchronously to every matching handler. The [`ModuleRegistry`] owns the
//! loaded modules and drives their load/unload lifecycle.
//!
//! [`Message`]: devstate_types::Message

pub mod bus;
pub mod error;
pub mod module;
pub mod registry;

pub use bus::{handler_fn, Bus, Delivery, Handler, Outbox, MAX_CASCADE};
pub use error::{HandlerError, ModuleError};
pub use module::{LoadContext, Module};
pub use registry::ModuleRegistry;
