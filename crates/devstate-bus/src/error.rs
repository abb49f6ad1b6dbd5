//! Bus and module errors.

use devstate_types::{MessageKind, ModuleId};
use thiserror::Error;

/// Failure reported by a bus handler.
///
/// The bus logs these and carries on delivering to the remaining handlers.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("unexpected message kind: {0}")]
    Unexpected(MessageKind),

    #[error("{0}")]
    Failed(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum ModuleError {
    #[error("module {name} failed to load: {reason}")]
    Load { name: String, reason: String },

    #[error("module not loaded: {0}")]
    NotLoaded(ModuleId),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
