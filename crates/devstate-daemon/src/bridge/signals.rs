//! Mapping from bus notifications to outbound signals.

use devstate_protocol::{Endpoints, Signal, SignalName};
use devstate_types::{DeviceState, Message, MessageKind};

/// One row of the mapping table.
#[derive(Clone, Copy)]
pub struct SignalRule {
    pub trigger: MessageKind,
    /// Extra condition on the payload; `None` always matches.
    pub predicate: Option<fn(&Message) -> bool>,
    pub signal: SignalName,
    pub args: fn(&Message) -> Vec<String>,
}

impl SignalRule {
    fn matches(&self, message: &Message) -> bool {
        message.kind() == self.trigger && self.predicate.map_or(true, |p| p(message))
    }
}

/// Request kind named in a denial signal.
pub fn denied_request_kind(state: DeviceState) -> &'static str {
    if state == DeviceState::Shutdown {
        "shutdown"
    } else {
        "reboot"
    }
}

fn no_args(_: &Message) -> Vec<String> {
    Vec::new()
}

fn shutdown_imminent(message: &Message) -> bool {
    matches!(message, Message::StateChangeInd { state } if state.is_shutdown_imminent())
}

fn denial_args(message: &Message) -> Vec<String> {
    match message {
        Message::StateReqDeniedInd { state, reason } => {
            vec![denied_request_kind(*state).to_string(), reason.clone()]
        }
        _ => Vec::new(),
    }
}

/// The fixed signal table of the bridge.
pub const RULES: [SignalRule; 4] = [
    SignalRule {
        trigger: MessageKind::StateChangeInd,
        predicate: Some(shutdown_imminent),
        signal: SignalName::ShutdownInd,
        args: no_args,
    },
    SignalRule {
        trigger: MessageKind::ThermalShutdownInd,
        predicate: None,
        signal: SignalName::ThermalShutdownInd,
        args: no_args,
    },
    SignalRule {
        trigger: MessageKind::SaveDataInd,
        predicate: None,
        signal: SignalName::SaveUnsavedDataInd,
        args: no_args,
    },
    SignalRule {
        trigger: MessageKind::StateReqDeniedInd,
        predicate: None,
        signal: SignalName::StateReqDeniedInd,
        args: denial_args,
    },
];

/// Turns qualifying bus messages into signals on a fixed path and interface.
#[derive(Clone)]
pub struct SignalMapper {
    path: String,
    interface: String,
    rules: Vec<SignalRule>,
}

impl SignalMapper {
    pub fn new(endpoints: &Endpoints) -> Self {
        Self {
            path: endpoints.signal_path.clone(),
            interface: endpoints.signal_interface.clone(),
            rules: RULES.to_vec(),
        }
    }

    /// Message kinds that can produce a signal, without duplicates.
    pub fn triggers(&self) -> Vec<MessageKind> {
        let mut kinds: Vec<MessageKind> = self.rules.iter().map(|r| r.trigger).collect();
        kinds.sort();
        kinds.dedup();
        kinds
    }

    /// The signal `message` maps to, if any. The first matching rule wins.
    pub fn map(&self, message: &Message) -> Option<Signal> {
        let rule = self.rules.iter().find(|r| r.matches(message))?;
        let mut signal = Signal::new(&self.path, &self.interface, rule.signal.as_str());
        signal.args = (rule.args)(message);
        Some(signal)
    }
}
