//! Mock connection for testing.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use devstate_bus::Outbox;

use crate::connection::{Connection, MethodHandler};
use crate::error::ProtocolError;
use crate::message::{MethodCall, Reply, Signal};

/// One call made on the mock, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOp {
    Bind { interface: String, method: String },
    Unbind { interface: String, method: String },
    Emit(Signal),
}

#[derive(Default)]
struct MockState {
    ops: Vec<MockOp>,
    methods: BTreeMap<String, Arc<dyn MethodHandler>>,
    fail_bind: Option<String>,
}

/// Connection that records everything done to it.
///
/// Binding never requires a connect step; the bridge is expected to gate
/// that itself.
#[derive(Default)]
pub struct MockConnection {
    state: Arc<Mutex<MockState>>,
}

impl MockConnection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a clonable handle for observing the mock from tests.
    pub fn handle(&self) -> MockConnectionHandle {
        MockConnectionHandle {
            state: Arc::clone(&self.state),
        }
    }
}

/// Clonable observer handle for [`MockConnection`].
#[derive(Clone)]
pub struct MockConnectionHandle {
    state: Arc<Mutex<MockState>>,
}

impl MockConnectionHandle {
    /// Every recorded operation, in order.
    pub fn ops(&self) -> Vec<MockOp> {
        self.state.lock().unwrap().ops.clone()
    }

    /// Number of bind calls made.
    pub fn bind_count(&self) -> usize {
        self.count(|op| matches!(op, MockOp::Bind { .. }))
    }

    /// Number of unbind calls made.
    pub fn unbind_count(&self) -> usize {
        self.count(|op| matches!(op, MockOp::Unbind { .. }))
    }

    fn count(&self, pred: impl Fn(&MockOp) -> bool) -> usize {
        self.state.lock().unwrap().ops.iter().filter(|op| pred(op)).count()
    }

    /// Emitted signals, in order.
    pub fn signals(&self) -> Vec<Signal> {
        self.state
            .lock()
            .unwrap()
            .ops
            .iter()
            .filter_map(|op| match op {
                MockOp::Emit(signal) => Some(signal.clone()),
                _ => None,
            })
            .collect()
    }

    /// Names of the currently bound methods, sorted.
    pub fn bound_methods(&self) -> Vec<String> {
        self.state.lock().unwrap().methods.keys().cloned().collect()
    }

    /// Make binds of `method` fail from now on.
    pub fn fail_bind(&self, method: &str) {
        self.state.lock().unwrap().fail_bind = Some(method.to_string());
    }

    /// Forget recorded operations, keeping bindings.
    pub fn clear(&self) {
        self.state.lock().unwrap().ops.clear();
    }

    /// Invoke a bound method as an outside caller would.
    pub fn call(&self, call: &MethodCall, outbox: &mut Outbox) -> Option<Reply> {
        let handler = self.state.lock().unwrap().methods.get(&call.method).cloned()?;
        Some(handler.call(call, outbox))
    }
}

impl Connection for MockConnection {
    fn bind(
        &self,
        _service: &str,
        interface: &str,
        method: &str,
        handler: Arc<dyn MethodHandler>,
    ) -> Result<(), ProtocolError> {
        let mut state = self.state.lock().unwrap();
        state.ops.push(MockOp::Bind {
            interface: interface.to_string(),
            method: method.to_string(),
        });
        if state.fail_bind.as_deref() == Some(method) {
            return Err(ProtocolError::Other(anyhow::anyhow!("bind refused")));
        }
        state.methods.insert(method.to_string(), handler);
        Ok(())
    }

    fn unbind(&self, _service: &str, interface: &str, method: &str) -> Result<(), ProtocolError> {
        let mut state = self.state.lock().unwrap();
        state.ops.push(MockOp::Unbind {
            interface: interface.to_string(),
            method: method.to_string(),
        });
        state
            .methods
            .remove(method)
            .map(|_| ())
            .ok_or_else(|| ProtocolError::NotBound {
                interface: interface.to_string(),
                method: method.to_string(),
            })
    }

    fn emit(&self, signal: Signal) -> Result<(), ProtocolError> {
        self.state.lock().unwrap().ops.push(MockOp::Emit(signal));
        Ok(())
    }
}
