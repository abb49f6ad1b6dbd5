//! Version module: answers version queries on the bus.

use devstate_bus::{handler_fn, LoadContext, Module, ModuleError};
use devstate_types::{Message, MessageKind};
use tracing::debug;

/// Replies to every [`Message::GetVersion`] with a [`Message::VersionReport`].
pub struct VersionModule {
    version: String,
}

impl VersionModule {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}

impl Default for VersionModule {
    fn default() -> Self {
        Self::new(env!("CARGO_PKG_VERSION"))
    }
}

impl Module for VersionModule {
    fn name(&self) -> &str {
        "version"
    }

    fn load(&mut self, ctx: &mut LoadContext<'_>) -> Result<(), ModuleError> {
        let version = self.version.clone();
        ctx.subscribe(
            MessageKind::GetVersion,
            handler_fn(move |_, outbox| {
                debug!(%version, "reporting version");
                outbox.publish(Message::VersionReport {
                    version: version.clone(),
                });
                Ok(())
            }),
        );
        Ok(())
    }

    fn unload(&mut self) {}
}
