//! Thermal module: turns sustained overheating into a thermal shutdown.

use devstate_bus::{Handler, HandlerError, LoadContext, Module, ModuleError, Outbox};
use devstate_types::{Message, MessageKind};
use tracing::{debug, error, warn};

use crate::config::ThermalConfig;

/// Counts consecutive hot samples and trips once per overheating episode.
struct ThermalWatch {
    shutdown_celsius: i32,
    required: u32,
    consecutive: u32,
    tripped: bool,
}

impl Handler for ThermalWatch {
    fn handle(&mut self, message: &Message, outbox: &mut Outbox) -> Result<(), HandlerError> {
        let Message::TemperatureSample { celsius } = *message else {
            return Err(HandlerError::Unexpected(message.kind()));
        };

        if celsius < self.shutdown_celsius {
            if self.consecutive > 0 {
                debug!(celsius, "temperature back to normal");
            }
            self.consecutive = 0;
            self.tripped = false;
            return Ok(());
        }

        self.consecutive = self.consecutive.saturating_add(1);
        warn!(
            celsius,
            limit = self.shutdown_celsius,
            consecutive = self.consecutive,
            "temperature over limit"
        );

        if !self.tripped && self.consecutive >= self.required {
            self.tripped = true;
            error!(celsius, "overheated, requesting thermal shutdown");
            outbox.publish(Message::ThermalShutdownInd);
        }
        Ok(())
    }
}

/// Module watching [`Message::TemperatureSample`]s.
pub struct ThermalModule {
    shutdown_celsius: i32,
    consecutive_samples: u32,
}

impl ThermalModule {
    pub fn new(config: &ThermalConfig) -> Self {
        Self {
            shutdown_celsius: config.shutdown_celsius,
            consecutive_samples: config.consecutive_samples.max(1),
        }
    }
}

impl Module for ThermalModule {
    fn name(&self) -> &str {
        "thermal"
    }

    fn load(&mut self, ctx: &mut LoadContext<'_>) -> Result<(), ModuleError> {
        ctx.subscribe(
            MessageKind::TemperatureSample,
            Box::new(ThermalWatch {
                shutdown_celsius: self.shutdown_celsius,
                required: self.consecutive_samples,
                consecutive: 0,
                tripped: false,
            }),
        );
        debug!(limit = self.shutdown_celsius, "thermal module loaded");
        Ok(())
    }

    // The watch state lives in the handler, which the registry drops first.
    fn unload(&mut self) {}
}

#[cfg(test)]
mod tests {
    use devstate_bus::ModuleRegistry;

    use super::*;

    fn watch(required: u32) -> ThermalWatch {
        ThermalWatch {
            shutdown_celsius: 80,
            required,
            consecutive: 0,
            tripped: false,
        }
    }

    fn feed(watch: &mut ThermalWatch, celsius: i32) -> Vec<Message> {
        let mut outbox = Outbox::new();
        watch
            .handle(&Message::TemperatureSample { celsius }, &mut outbox)
            .unwrap();
        outbox.into_messages()
    }

    #[test]
    fn trips_after_consecutive_hot_samples() {
        let mut w = watch(3);
        assert!(feed(&mut w, 85).is_empty());
        assert!(feed(&mut w, 90).is_empty());
        assert_eq!(feed(&mut w, 81), vec![Message::ThermalShutdownInd]);
    }

    #[test]
    fn trips_only_once_per_episode() {
        let mut w = watch(1);
        assert_eq!(feed(&mut w, 95), vec![Message::ThermalShutdownInd]);
        assert!(feed(&mut w, 95).is_empty());
        assert!(feed(&mut w, 60).is_empty());
        assert_eq!(feed(&mut w, 95), vec![Message::ThermalShutdownInd]);
    }

    #[test]
    fn cool_sample_resets_count() {
        let mut w = watch(2);
        assert!(feed(&mut w, 85).is_empty());
        assert!(feed(&mut w, 70).is_empty());
        assert!(feed(&mut w, 85).is_empty());
        assert_eq!(feed(&mut w, 85), vec![Message::ThermalShutdownInd]);
    }

    #[test]
    fn wrong_message_is_rejected() {
        let mut w = watch(1);
        let mut outbox = Outbox::new();
        assert!(matches!(
            w.handle(&Message::SaveDataInd, &mut outbox),
            Err(HandlerError::Unexpected(MessageKind::SaveDataInd))
        ));
    }

    #[test]
    fn module_publishes_through_registry() {
        let config = ThermalConfig {
            shutdown_celsius: 80,
            consecutive_samples: 0,
            ..ThermalConfig::default()
        };
        let mut registry = ModuleRegistry::new();
        registry.load(Box::new(ThermalModule::new(&config))).unwrap();

        let delivery = registry.publish(Message::TemperatureSample { celsius: 99 });

        // The sample plus the resulting thermal shutdown.
        assert_eq!(delivery.messages, 2);
    }
}
