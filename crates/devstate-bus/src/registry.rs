//! Module registry: owns loaded modules and the bus they share.

use std::collections::VecDeque;

use devstate_types::{Message, ModuleId};
use tracing::{debug, info, warn};

use crate::bus::{Bus, Delivery};
use crate::error::ModuleError;
use crate::module::{LoadContext, Module};

struct LoadedModule {
    id: ModuleId,
    module: Box<dyn Module>,
}

/// Owns the loaded modules and drives their lifecycle.
///
/// Dropping the registry unloads every module still loaded, newest first.
#[derive(Default)]
pub struct ModuleRegistry {
    bus: Bus,
    modules: Vec<LoadedModule>,
    pending: VecDeque<Message>,
    next_id: u32,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a module: run its load hook and make its handlers live.
    ///
    /// If the hook fails the module is torn down again (handlers removed,
    /// unload hook run, posted messages discarded) and the error returned.
    pub fn load(&mut self, mut module: Box<dyn Module>) -> Result<ModuleId, ModuleError> {
        self.next_id += 1;
        let id = ModuleId(self.next_id);
        let mut posted = VecDeque::new();

        let result = {
            let mut ctx = LoadContext::new(id, &mut self.bus, &mut posted);
            module.load(&mut ctx)
        };

        if let Err(e) = result {
            warn!(module = module.name(), %id, error = %e, "module failed to load");
            self.bus.unsubscribe(id);
            module.unload();
            return Err(e);
        }

        info!(module = module.name(), %id, "module loaded");
        self.pending.extend(posted);
        self.modules.push(LoadedModule { id, module });
        Ok(id)
    }

    /// Unload a module: remove its handlers, then run its unload hook.
    pub fn unload(&mut self, id: ModuleId) -> Result<(), ModuleError> {
        let index = self
            .modules
            .iter()
            .position(|m| m.id == id)
            .ok_or(ModuleError::NotLoaded(id))?;
        let LoadedModule { mut module, .. } = self.modules.remove(index);

        let removed = self.bus.unsubscribe(id);
        module.unload();
        info!(module = module.name(), %id, handlers = removed, "module unloaded");
        Ok(())
    }

    /// Unload every module, most recently loaded first.
    pub fn unload_all(&mut self) {
        while let Some(loaded) = self.modules.last() {
            let id = loaded.id;
            if let Err(e) = self.unload(id) {
                warn!(%id, error = %e, "unload failed");
                break;
            }
        }
        self.pending.clear();
    }

    /// Queue a message for the next dispatch.
    pub fn post(&mut self, message: Message) {
        self.pending.push_back(message);
    }

    /// Deliver every queued message, oldest first.
    pub fn dispatch_pending(&mut self) -> Delivery {
        let mut total = Delivery::default();
        while let Some(message) = self.pending.pop_front() {
            total += self.bus.publish(message);
        }
        total
    }

    /// Deliver a message now, after anything already queued.
    pub fn publish(&mut self, message: Message) -> Delivery {
        debug!(kind = %message.kind(), "publish");
        self.post(message);
        self.dispatch_pending()
    }

    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Number of messages waiting for dispatch.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Loaded modules as (id, name), in load order.
    pub fn modules(&self) -> impl Iterator<Item = (ModuleId, &str)> + '_ {
        self.modules.iter().map(|m| (m.id, m.module.name()))
    }

    pub fn is_loaded(&self, id: ModuleId) -> bool {
        self.modules.iter().any(|m| m.id == id)
    }
}

impl Drop for ModuleRegistry {
    fn drop(&mut self) {
        self.unload_all();
    }
}

impl std::fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleRegistry")
            .field("modules", &self.modules().collect::<Vec<_>>())
            .field("bus", &self.bus)
            .field("pending", &self.pending.len())
            .finish()
    }
}
