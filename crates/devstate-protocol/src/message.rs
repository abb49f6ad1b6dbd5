//! Method calls, replies and signals as seen on the external surface.

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::interface::Method;

/// An inbound method call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodCall {
    /// Name of the calling endpoint, if the transport could resolve it.
    pub sender: Option<String>,
    pub interface: String,
    pub method: String,
    pub args: Vec<String>,
}

impl MethodCall {
    pub fn new(interface: impl Into<String>, method: Method) -> Self {
        Self {
            sender: None,
            interface: interface.into(),
            method: method.as_str().to_string(),
            args: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = Some(sender.into());
        self
    }
}

/// Reply to a [`MethodCall`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub args: Vec<String>,
}

impl Reply {
    /// Empty acknowledgment.
    pub fn ack() -> Self {
        Self::default()
    }

    /// Reply carrying a single string.
    pub fn string(value: impl Into<String>) -> Self {
        Self {
            args: vec![value.into()],
        }
    }
}

/// An outbound signal. Signals are the only values framed on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct Signal {
    pub path: String,
    pub interface: String,
    pub name: String,
    pub args: Vec<String>,
}

impl Signal {
    pub fn new(
        path: impl Into<String>,
        interface: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            interface: interface.into(),
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// Append a string argument.
    #[must_use]
    pub fn arg(mut self, value: impl Into<String>) -> Self {
        self.args.push(value.into());
        self
    }
}
