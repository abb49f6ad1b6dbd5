//! Endpoint binding table.
//!
//! The table is bound or unbound as a whole. Both transitions are idempotent:
//! asking for the state the table is already in does nothing.

use std::sync::Arc;

use devstate_protocol::{Connection, Method, MethodHandler};
use tracing::{debug, warn};

pub struct BindingTable {
    service: String,
    interface: String,
    entries: Vec<(Method, Arc<dyn MethodHandler>)>,
    bound: bool,
}

impl BindingTable {
    pub fn new(service: impl Into<String>, interface: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            interface: interface.into(),
            entries: Vec::new(),
            bound: false,
        }
    }

    /// Add an entry. Entries are bound in insertion order.
    pub fn insert(&mut self, method: Method, handler: Arc<dyn MethodHandler>) {
        self.entries.push((method, handler));
    }

    pub fn is_bound(&self) -> bool {
        self.bound
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bind every entry on `conn`. Returns whether a bind pass ran.
    ///
    /// If any entry fails, the entries bound so far are withdrawn and the
    /// table stays unbound, so the next connect retries from scratch.
    pub fn bind(&mut self, conn: &dyn Connection) -> bool {
        if self.bound {
            debug!(interface = %self.interface, "already bound");
            return false;
        }

        for (done, (method, handler)) in self.entries.iter().enumerate() {
            if let Err(e) = conn.bind(
                &self.service,
                &self.interface,
                method.as_str(),
                Arc::clone(handler),
            ) {
                warn!(%method, error = %e, "failed to bind method, rolling back");
                for (bound_method, _) in &self.entries[..done] {
                    self.unbind_one(conn, *bound_method);
                }
                return true;
            }
        }

        self.bound = true;
        debug!(interface = %self.interface, methods = self.entries.len(), "methods bound");
        true
    }

    /// Unbind every entry from `conn`. Returns whether an unbind pass ran.
    pub fn unbind(&mut self, conn: &dyn Connection) -> bool {
        if !self.bound {
            debug!(interface = %self.interface, "not bound");
            return false;
        }

        for (method, _) in &self.entries {
            self.unbind_one(conn, *method);
        }

        self.bound = false;
        debug!(interface = %self.interface, "methods unbound");
        true
    }

    fn unbind_one(&self, conn: &dyn Connection, method: Method) {
        if let Err(e) = conn.unbind(&self.service, &self.interface, method.as_str()) {
            warn!(%method, error = %e, "failed to unbind method");
        }
    }

    /// Drop every entry. The table must be unbound.
    pub fn clear(&mut self) {
        debug_assert!(!self.bound, "clearing a bound table");
        self.entries.clear();
    }
}
