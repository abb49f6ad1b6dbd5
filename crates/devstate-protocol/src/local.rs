//! In-process connection.
//!
//! [`LocalConnection`] stands in for a message-bus daemon connection when
//! everything runs in one process: bound methods are invoked through
//! [`LocalConnection::dispatch`] and emitted signals travel as wire frames to
//! the paired [`LocalPeer`].

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use devstate_bus::Outbox;
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::connection::{Connection, MethodHandler};
use crate::error::ProtocolError;
use crate::message::{MethodCall, Reply, Signal};
use crate::wire;

struct BoundMethod {
    service: String,
    handler: Arc<dyn MethodHandler>,
}

struct LocalState {
    connected: bool,
    methods: BTreeMap<(String, String), BoundMethod>,
}

/// Connection whose far end lives in the same process.
pub struct LocalConnection {
    state: Mutex<LocalState>,
    peer_tx: mpsc::UnboundedSender<Vec<u8>>,
}

impl LocalConnection {
    /// Create a disconnected connection and the peer that receives its signals.
    pub fn pair() -> (Self, LocalPeer) {
        let (peer_tx, peer_rx) = mpsc::unbounded_channel();
        let conn = Self {
            state: Mutex::new(LocalState {
                connected: false,
                methods: BTreeMap::new(),
            }),
            peer_tx,
        };
        (conn, LocalPeer { rx: peer_rx })
    }

    fn lock(&self) -> MutexGuard<'_, LocalState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mark the transport as available.
    pub fn connect(&self) {
        self.lock().connected = true;
        debug!("local connection up");
    }

    /// Mark the transport as gone. Bindings stay until unbound.
    pub fn disconnect(&self) {
        self.lock().connected = false;
        debug!("local connection down");
    }

    pub fn is_connected(&self) -> bool {
        self.lock().connected
    }

    /// Bound methods as `interface.method`, sorted.
    pub fn bound_methods(&self) -> Vec<String> {
        self.lock()
            .methods
            .keys()
            .map(|(interface, method)| format!("{interface}.{method}"))
            .collect()
    }

    /// Route an inbound call to its bound handler.
    pub fn dispatch(&self, call: &MethodCall, outbox: &mut Outbox) -> Result<Reply, ProtocolError> {
        let handler = {
            let state = self.lock();
            if !state.connected {
                return Err(ProtocolError::NotConnected);
            }
            let key = (call.interface.clone(), call.method.clone());
            let bound = state
                .methods
                .get(&key)
                .ok_or_else(|| ProtocolError::UnknownMethod {
                    interface: call.interface.clone(),
                    method: call.method.clone(),
                })?;
            trace!(service = %bound.service, method = %call.method, "dispatching call");
            Arc::clone(&bound.handler)
        };
        Ok(handler.call(call, outbox))
    }
}

impl Connection for LocalConnection {
    fn bind(
        &self,
        service: &str,
        interface: &str,
        method: &str,
        handler: Arc<dyn MethodHandler>,
    ) -> Result<(), ProtocolError> {
        let mut state = self.lock();
        if !state.connected {
            return Err(ProtocolError::NotConnected);
        }
        let key = (interface.to_string(), method.to_string());
        if state.methods.contains_key(&key) {
            return Err(ProtocolError::AlreadyBound {
                interface: key.0,
                method: key.1,
            });
        }
        state.methods.insert(
            key,
            BoundMethod {
                service: service.to_string(),
                handler,
            },
        );
        trace!(service, interface, method, "bound");
        Ok(())
    }

    fn unbind(&self, service: &str, interface: &str, method: &str) -> Result<(), ProtocolError> {
        let key = (interface.to_string(), method.to_string());
        match self.lock().methods.remove(&key) {
            Some(_) => {
                trace!(service, interface, method, "unbound");
                Ok(())
            }
            None => Err(ProtocolError::NotBound {
                interface: key.0,
                method: key.1,
            }),
        }
    }

    fn emit(&self, signal: Signal) -> Result<(), ProtocolError> {
        if !self.is_connected() {
            return Err(ProtocolError::NotConnected);
        }
        let bytes = wire::encode_frame(&signal)?;
        self.peer_tx
            .send(bytes)
            .map_err(|_| ProtocolError::ChannelClosed)
    }
}

/// Receiving end of a [`LocalConnection`]'s signals.
pub struct LocalPeer {
    rx: mpsc::UnboundedReceiver<Vec<u8>>,
}

impl LocalPeer {
    /// Wait for the next signal. `None` once the connection is dropped.
    pub async fn recv(&mut self) -> Option<Result<Signal, ProtocolError>> {
        let bytes = self.rx.recv().await?;
        Some(wire::decode_frame(&bytes))
    }

    /// Take the next signal if one is already waiting.
    pub fn try_recv(&mut self) -> Option<Result<Signal, ProtocolError>> {
        let bytes = self.rx.try_recv().ok()?;
        Some(wire::decode_frame(&bytes))
    }
}
