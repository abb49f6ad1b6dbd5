//! Protocol bridge: exposes bus traffic to outside callers.
//!
//! On the way in, the four request methods are bound on the connection while
//! the transport is up; `get_version` answers from the cached version and the
//! request methods publish their request on the bus. On the way out, state
//! notifications are turned into signals by the [`SignalMapper`].

pub mod bindings;
pub mod signals;
pub mod version;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use devstate_bus::{Handler, HandlerError, LoadContext, Module, ModuleError, Outbox};
use devstate_protocol::{
    Connection, Endpoints, Method, MethodCall, MethodHandler, Reply, UNKNOWN_SENDER,
};
use devstate_types::{Message, MessageKind};
use tracing::{debug, error};

pub use bindings::BindingTable;
pub use signals::{SignalMapper, SignalRule};
pub use version::VersionCache;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Serves `get_version` from the cache.
struct VersionEndpoint {
    cache: Arc<Mutex<VersionCache>>,
}

impl MethodHandler for VersionEndpoint {
    fn call(&self, _call: &MethodCall, _outbox: &mut Outbox) -> Reply {
        Reply::string(lock(&self.cache).reply_value())
    }
}

/// Turns a request method into a bus request and acknowledges it.
struct RequestEndpoint {
    what: &'static str,
    request: Message,
}

impl MethodHandler for RequestEndpoint {
    fn call(&self, call: &MethodCall, outbox: &mut Outbox) -> Reply {
        let sender = call.sender.as_deref().unwrap_or(UNKNOWN_SENDER);
        error!(request = self.what, %sender, "request received over transport");
        outbox.publish(self.request.clone());
        Reply::ack()
    }
}

/// Bus side of the bridge, registered once per subscribed kind.
#[derive(Clone)]
struct BridgeSubscriber {
    connection: Arc<dyn Connection>,
    table: Arc<Mutex<BindingTable>>,
    cache: Arc<Mutex<VersionCache>>,
    mapper: SignalMapper,
}

impl Handler for BridgeSubscriber {
    fn handle(&mut self, message: &Message, _outbox: &mut Outbox) -> Result<(), HandlerError> {
        match message {
            Message::TransportConnected => {
                debug!("transport connected");
                lock(&self.table).bind(self.connection.as_ref());
                Ok(())
            }
            Message::TransportDisconnected => {
                debug!("transport disconnected");
                lock(&self.table).unbind(self.connection.as_ref());
                Ok(())
            }
            Message::VersionReport { version } => {
                if lock(&self.cache).observe(version) {
                    debug!(%version, "version cached");
                }
                Ok(())
            }
            _ => {
                if let Message::StateReqDeniedInd { state, reason } = message {
                    error!(
                        request = signals::denied_request_kind(*state),
                        %reason,
                        "proxying request denial to transport"
                    );
                }
                let Some(signal) = self.mapper.map(message) else {
                    return Ok(());
                };
                debug!(signal = %signal.name, "emitting signal");
                self.connection
                    .emit(signal)
                    .map_err(|e| HandlerError::Other(anyhow::Error::new(e)))
            }
        }
    }
}

/// Read-only view of a [`BridgeModule`]'s state.
#[derive(Clone)]
pub struct BridgeHandle {
    table: Arc<Mutex<BindingTable>>,
    cache: Arc<Mutex<VersionCache>>,
}

impl BridgeHandle {
    /// Whether the request methods are currently bound.
    pub fn is_bound(&self) -> bool {
        lock(&self.table).is_bound()
    }

    /// The cached version, if one has been reported.
    pub fn cached_version(&self) -> Option<String> {
        lock(&self.cache).get().map(str::to_string)
    }
}

/// Module that bridges the bus and an external connection.
pub struct BridgeModule {
    endpoints: Endpoints,
    connection: Arc<dyn Connection>,
    table: Arc<Mutex<BindingTable>>,
    cache: Arc<Mutex<VersionCache>>,
}

impl BridgeModule {
    pub fn new(endpoints: Endpoints, connection: Arc<dyn Connection>) -> Self {
        let table = BindingTable::new(&endpoints.service, &endpoints.request_interface);
        Self {
            endpoints,
            connection,
            table: Arc::new(Mutex::new(table)),
            cache: Arc::new(Mutex::new(VersionCache::default())),
        }
    }

    /// Get a clonable handle for observing the bridge once it is loaded.
    pub fn handle(&self) -> BridgeHandle {
        BridgeHandle {
            table: Arc::clone(&self.table),
            cache: Arc::clone(&self.cache),
        }
    }

    fn fill_table(&self) {
        let mut table = lock(&self.table);
        table.insert(
            Method::GetVersion,
            Arc::new(VersionEndpoint {
                cache: Arc::clone(&self.cache),
            }),
        );
        for (method, what, request) in [
            (Method::ReqPowerup, "powerup", Message::PowerupReq),
            (Method::ReqReboot, "reboot", Message::RebootReq),
            (Method::ReqShutdown, "shutdown", Message::ShutdownReq),
        ] {
            table.insert(method, Arc::new(RequestEndpoint { what, request }));
        }
    }
}

impl Module for BridgeModule {
    fn name(&self) -> &str {
        "bridge"
    }

    fn load(&mut self, ctx: &mut LoadContext<'_>) -> Result<(), ModuleError> {
        self.fill_table();

        let subscriber = BridgeSubscriber {
            connection: Arc::clone(&self.connection),
            table: Arc::clone(&self.table),
            cache: Arc::clone(&self.cache),
            mapper: SignalMapper::new(&self.endpoints),
        };
        let mut kinds = subscriber.mapper.triggers();
        kinds.extend([
            MessageKind::TransportConnected,
            MessageKind::TransportDisconnected,
            MessageKind::VersionReport,
        ]);
        for kind in kinds {
            ctx.subscribe(kind, Box::new(subscriber.clone()));
        }

        // The transport is probably not up yet; binding waits for
        // TransportConnected.
        ctx.post(Message::GetVersion);

        debug!(service = %self.endpoints.service, "bridge loaded");
        Ok(())
    }

    fn unload(&mut self) {
        let mut table = lock(&self.table);
        table.unbind(self.connection.as_ref());
        table.clear();
        lock(&self.cache).clear();
        debug!("bridge unloaded");
    }
}
