//! The connection collaborator the bridge binds its methods through.

use std::sync::Arc;

use devstate_bus::Outbox;

use crate::error::ProtocolError;
use crate::message::{MethodCall, Reply, Signal};

/// Serves one bound method.
///
/// Called on the dispatch thread. It must return exactly one reply without
/// blocking; any real work is requested by publishing into `outbox`.
pub trait MethodHandler: Send + Sync {
    fn call(&self, call: &MethodCall, outbox: &mut Outbox) -> Reply;
}

impl<F> MethodHandler for F
where
    F: Fn(&MethodCall, &mut Outbox) -> Reply + Send + Sync,
{
    fn call(&self, call: &MethodCall, outbox: &mut Outbox) -> Reply {
        self(call, outbox)
    }
}

/// A live transport connection.
///
/// Marshaling and delivery are the implementation's business; callers only
/// bind handlers by name and emit signals.
pub trait Connection: Send + Sync {
    /// Expose `method` on `interface` of `service`, served by `handler`.
    fn bind(
        &self,
        service: &str,
        interface: &str,
        method: &str,
        handler: Arc<dyn MethodHandler>,
    ) -> Result<(), ProtocolError>;

    /// Withdraw a previously bound method.
    fn unbind(&self, service: &str, interface: &str, method: &str) -> Result<(), ProtocolError>;

    /// Send a signal to whoever listens.
    fn emit(&self, signal: Signal) -> Result<(), ProtocolError>;
}
