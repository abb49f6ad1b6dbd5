//! Core daemon orchestration.
//!
//! Everything that touches the bus happens on the task running
//! [`Daemon::run`]. Transport notifications, inbound calls and publishes from
//! other tasks arrive as [`DaemonEvent`]s through a [`LoopHandle`].

use std::sync::Arc;
use std::time::Duration;

use devstate_bus::{Delivery, Module, ModuleRegistry, Outbox};
use devstate_protocol::{Connection, LocalConnection, MethodCall, ProtocolError, Reply};
use devstate_types::{Message, ModuleId};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::bridge::{BridgeHandle, BridgeModule};
use crate::config::Config;
use crate::error::DaemonError;
use crate::sensor::TemperatureSensor;
use crate::thermal::ThermalModule;
use crate::version::VersionModule;

/// Events processed by the daemon's main loop.
pub enum DaemonEvent {
    /// Broadcast a message on the bus.
    Publish(Message),
    /// The transport came up.
    TransportConnected,
    /// The transport went away.
    TransportDisconnected,
    /// An inbound method call awaiting its reply.
    Call {
        call: MethodCall,
        reply: oneshot::Sender<Result<Reply, ProtocolError>>,
    },
    /// Stop the loop and unload all modules.
    Quit,
}

/// Snapshot of daemon state, published after every loop iteration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DaemonStatus {
    pub running: bool,
    /// Loaded module names, in load order.
    pub modules: Vec<String>,
    pub connected: bool,
    /// Whether the bridge's methods are bound.
    pub bound: bool,
    /// Version cached by the bridge.
    pub version: Option<String>,
    /// Messages broadcast so far.
    pub messages: usize,
    /// Handler invocations that failed so far.
    pub handler_failures: usize,
    /// Sensor reads that failed so far.
    pub sensor_failures: usize,
}

/// Clonable handle for feeding events into a running daemon.
#[derive(Clone)]
pub struct LoopHandle {
    tx: mpsc::Sender<DaemonEvent>,
}

impl LoopHandle {
    async fn send(&self, event: DaemonEvent) -> Result<(), DaemonError> {
        self.tx.send(event).await.map_err(|_| DaemonError::NotRunning)
    }

    /// Broadcast a message on the daemon's bus.
    pub async fn publish(&self, message: Message) -> Result<(), DaemonError> {
        self.send(DaemonEvent::Publish(message)).await
    }

    pub async fn connect(&self) -> Result<(), DaemonError> {
        self.send(DaemonEvent::TransportConnected).await
    }

    pub async fn disconnect(&self) -> Result<(), DaemonError> {
        self.send(DaemonEvent::TransportDisconnected).await
    }

    /// Call a bound method and wait for its reply.
    pub async fn call(&self, call: MethodCall) -> Result<Reply, DaemonError> {
        let (reply, rx) = oneshot::channel();
        self.send(DaemonEvent::Call { call, reply }).await?;
        let reply = rx.await.map_err(|_| DaemonError::NotRunning)??;
        Ok(reply)
    }

    /// Ask the loop to stop.
    pub async fn quit(&self) -> Result<(), DaemonError> {
        self.send(DaemonEvent::Quit).await
    }
}

/// The devstate daemon.
pub struct Daemon {
    config: Config,
    registry: ModuleRegistry,
    connection: Arc<LocalConnection>,
    sensor: Option<Box<dyn TemperatureSensor>>,
    bridge: Option<BridgeHandle>,
    event_tx: mpsc::Sender<DaemonEvent>,
    event_rx: mpsc::Receiver<DaemonEvent>,
    status_tx: watch::Sender<DaemonStatus>,
    messages: usize,
    handler_failures: usize,
    sensor_failures: usize,
}

impl Daemon {
    /// Create a new daemon instance. No modules are loaded yet.
    pub fn new(config: Config, connection: Arc<LocalConnection>) -> Self {
        let (event_tx, event_rx) = mpsc::channel(config.daemon.event_queue.max(1));
        let (status_tx, _) = watch::channel(DaemonStatus::default());

        Self {
            config,
            registry: ModuleRegistry::new(),
            connection,
            sensor: None,
            bridge: None,
            event_tx,
            event_rx,
            status_tx,
            messages: 0,
            handler_failures: 0,
            sensor_failures: 0,
        }
    }

    /// Set the sensor polled for temperature samples.
    pub fn set_sensor(&mut self, sensor: Box<dyn TemperatureSensor>) {
        self.sensor = Some(sensor);
    }

    /// Get a handle for feeding events into the daemon.
    pub fn handle(&self) -> LoopHandle {
        LoopHandle {
            tx: self.event_tx.clone(),
        }
    }

    /// Subscribe to status snapshots.
    pub fn status_receiver(&self) -> watch::Receiver<DaemonStatus> {
        self.status_tx.subscribe()
    }

    /// Load the built-in modules enabled by the configuration.
    pub fn load_modules(&mut self) -> Result<(), DaemonError> {
        let version = self
            .config
            .version
            .version
            .clone()
            .map_or_else(VersionModule::default, VersionModule::new);
        self.load(Box::new(version))?;

        if self.config.bridge.enabled {
            let connection: Arc<dyn Connection> = self.connection.clone();
            let bridge = BridgeModule::new(self.config.bridge.endpoints.clone(), connection);
            self.bridge = Some(bridge.handle());
            self.load(Box::new(bridge))?;
        }

        if self.config.thermal.enabled {
            self.load(Box::new(ThermalModule::new(&self.config.thermal)))?;
        }

        self.update_status(false);
        Ok(())
    }

    /// Load an additional module.
    pub fn load(&mut self, module: Box<dyn Module>) -> Result<ModuleId, DaemonError> {
        Ok(self.registry.load(module)?)
    }

    /// Run the dispatch loop until [`DaemonEvent::Quit`], then unload all modules.
    pub async fn run(&mut self) -> Result<(), DaemonError> {
        let mut ticker = self.sensor_interval();

        // Answer requests modules posted while loading.
        let delivery = self.registry.dispatch_pending();
        self.account(delivery);
        self.update_status(true);
        info!(modules = self.registry.modules().count(), "daemon running");

        loop {
            tokio::select! {
                event = self.event_rx.recv() => {
                    match event {
                        Some(DaemonEvent::Quit) | None => {
                            info!("shutting down");
                            break;
                        }
                        Some(event) => self.handle_event(event),
                    }
                }
                () = next_tick(&mut ticker) => {
                    if let Err(e) = self.poll_sensor().await {
                        warn!(error = %e, "temperature poll failed");
                        self.sensor_failures += 1;
                    }
                }
            }
            self.update_status(true);
        }

        self.shutdown();
        Ok(())
    }

    fn sensor_interval(&self) -> Option<Interval> {
        if !self.config.thermal.enabled {
            return None;
        }
        let sensor = self.sensor.as_ref()?;
        if !sensor.is_available() {
            info!("temperature sensor not available, not polling");
            return None;
        }
        let period = Duration::from_secs(self.config.thermal.poll_interval_secs.max(1));
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Some(interval)
    }

    fn handle_event(&mut self, event: DaemonEvent) {
        match event {
            DaemonEvent::Publish(message) => self.publish(message),
            DaemonEvent::TransportConnected => {
                self.connection.connect();
                self.publish(Message::TransportConnected);
            }
            DaemonEvent::TransportDisconnected => {
                self.connection.disconnect();
                self.publish(Message::TransportDisconnected);
            }
            DaemonEvent::Call { call, reply } => {
                let mut outbox = Outbox::new();
                let result = self.connection.dispatch(&call, &mut outbox);
                if let Err(e) = &result {
                    debug!(method = %call.method, error = %e, "call rejected");
                }
                // Replies to callers that already left are lost, as on any transport.
                if reply.send(result).is_err() {
                    debug!(method = %call.method, "caller gone before reply");
                }
                for message in outbox.into_messages() {
                    self.publish(message);
                }
            }
            DaemonEvent::Quit => {}
        }
    }

    async fn poll_sensor(&mut self) -> Result<(), DaemonError> {
        let Some(sensor) = self.sensor.as_mut() else {
            return Ok(());
        };
        let celsius = sensor.read_celsius().await?;
        self.publish(Message::TemperatureSample { celsius });
        Ok(())
    }

    fn publish(&mut self, message: Message) {
        let delivery = self.registry.publish(message);
        self.account(delivery);
    }

    fn account(&mut self, delivery: Delivery) {
        self.messages += delivery.messages;
        self.handler_failures += delivery.failed;
    }

    fn update_status(&self, running: bool) {
        let status = DaemonStatus {
            running,
            modules: self
                .registry
                .modules()
                .map(|(_, name)| name.to_string())
                .collect(),
            connected: self.connection.is_connected(),
            bound: self.bridge.as_ref().is_some_and(BridgeHandle::is_bound),
            version: self.bridge.as_ref().and_then(BridgeHandle::cached_version),
            messages: self.messages,
            handler_failures: self.handler_failures,
            sensor_failures: self.sensor_failures,
        };
        self.status_tx.send_replace(status);
    }

    fn shutdown(&mut self) {
        info!("daemon shutting down");
        self.registry.unload_all();
        self.update_status(false);
        info!("daemon shut down complete");
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}
