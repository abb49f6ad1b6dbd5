//! Module lifecycle contract.

use std::collections::VecDeque;

use devstate_types::{Message, MessageKind, ModuleId};

use crate::bus::{Bus, Handler};
use crate::error::ModuleError;

/// A statically known unit of daemon functionality.
///
/// Modules never reference each other. Everything a module does to the rest
/// of the daemon goes through the handlers it registers in [`Module::load`]
/// and the messages it publishes.
pub trait Module: Send {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Register handlers and post any startup requests.
    ///
    /// Called exactly once. Posted messages are delivered after loading
    /// finishes, so answers to startup requests always arrive through the bus.
    fn load(&mut self, ctx: &mut LoadContext<'_>) -> Result<(), ModuleError>;

    /// Release or reset all module-owned state.
    ///
    /// Called exactly once, after the module's handlers have been removed
    /// from the bus, and also when [`Module::load`] failed part way.
    fn unload(&mut self);
}

/// Registration surface handed to [`Module::load`].
pub struct LoadContext<'a> {
    id: ModuleId,
    bus: &'a mut Bus,
    posted: &'a mut VecDeque<Message>,
}

impl<'a> LoadContext<'a> {
    pub(crate) fn new(id: ModuleId, bus: &'a mut Bus, posted: &'a mut VecDeque<Message>) -> Self {
        Self { id, bus, posted }
    }

    /// Register a handler for `kind` owned by the loading module.
    pub fn subscribe(&mut self, kind: MessageKind, handler: Box<dyn Handler>) {
        self.bus.subscribe(kind, self.id, handler);
    }

    /// Queue a message for delivery once loading is over.
    pub fn post(&mut self, message: Message) {
        self.posted.push_back(message);
    }
}
