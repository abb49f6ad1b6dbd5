//! Module lifecycle tests for the registry.

use std::sync::{Arc, Mutex};

use devstate_bus::{handler_fn, HandlerError, LoadContext, Module, ModuleError, ModuleRegistry};
use devstate_types::{Message, MessageKind, ModuleId};

type Journal = Arc<Mutex<Vec<String>>>;

fn entries(journal: &Journal) -> Vec<String> {
    journal.lock().unwrap().clone()
}

/// Records every lifecycle call and every message it receives.
struct Recorder {
    name: &'static str,
    kinds: Vec<MessageKind>,
    on_load: Vec<Message>,
    fail_load: bool,
    journal: Journal,
}

impl Recorder {
    fn new(name: &'static str, kinds: &[MessageKind], journal: &Journal) -> Self {
        Self {
            name,
            kinds: kinds.to_vec(),
            on_load: Vec::new(),
            fail_load: false,
            journal: Arc::clone(journal),
        }
    }
}

impl Module for Recorder {
    fn name(&self) -> &str {
        self.name
    }

    fn load(&mut self, ctx: &mut LoadContext<'_>) -> Result<(), ModuleError> {
        self.journal.lock().unwrap().push(format!("{}:load", self.name));
        for kind in &self.kinds {
            let journal = Arc::clone(&self.journal);
            let name = self.name;
            ctx.subscribe(
                *kind,
                handler_fn(move |msg, _| {
                    journal.lock().unwrap().push(format!("{name}:{}", msg.kind()));
                    Ok(())
                }),
            );
        }
        for msg in self.on_load.drain(..) {
            ctx.post(msg);
        }
        if self.fail_load {
            return Err(ModuleError::Load {
                name: self.name.to_string(),
                reason: "refused".to_string(),
            });
        }
        Ok(())
    }

    fn unload(&mut self) {
        self.journal.lock().unwrap().push(format!("{}:unload", self.name));
    }
}

/// Answers `GetVersion` with a fixed version.
struct Responder;

impl Module for Responder {
    fn name(&self) -> &str {
        "responder"
    }

    fn load(&mut self, ctx: &mut LoadContext<'_>) -> Result<(), ModuleError> {
        ctx.subscribe(
            MessageKind::GetVersion,
            handler_fn(|_, outbox| {
                outbox.publish(Message::VersionReport {
                    version: "9.9".to_string(),
                });
                Ok(())
            }),
        );
        Ok(())
    }

    fn unload(&mut self) {}
}

#[test]
fn load_makes_handlers_live() {
    let journal = Journal::default();
    let mut registry = ModuleRegistry::new();
    registry
        .load(Box::new(Recorder::new("a", &[MessageKind::SaveDataInd], &journal)))
        .unwrap();

    registry.publish(Message::SaveDataInd);

    assert_eq!(entries(&journal), vec!["a:load", "a:SaveDataInd"]);
}

#[test]
fn unload_removes_handlers_then_runs_hook_once() {
    let journal = Journal::default();
    let mut registry = ModuleRegistry::new();
    let id = registry
        .load(Box::new(Recorder::new("a", &[MessageKind::SaveDataInd], &journal)))
        .unwrap();

    assert!(registry.is_loaded(id));
    assert_eq!(registry.bus().subscriber_count(MessageKind::SaveDataInd), 1);

    registry.unload(id).unwrap();
    registry.publish(Message::SaveDataInd);

    assert!(!registry.is_loaded(id));
    assert_eq!(registry.bus().subscriber_count(MessageKind::SaveDataInd), 0);
    assert_eq!(entries(&journal), vec!["a:load", "a:unload"]);
    assert_eq!(registry.bus().subscription_count(), 0);
    assert!(matches!(registry.unload(id), Err(ModuleError::NotLoaded(i)) if i == id));
    assert_eq!(entries(&journal).len(), 2);
}

#[test]
fn failed_load_is_torn_down() {
    let journal = Journal::default();
    let mut registry = ModuleRegistry::new();
    let mut module = Recorder::new("broken", &[MessageKind::SaveDataInd], &journal);
    module.fail_load = true;
    module.on_load.push(Message::GetVersion);

    let result = registry.load(Box::new(module));

    assert!(matches!(result, Err(ModuleError::Load { .. })));
    assert_eq!(entries(&journal), vec!["broken:load", "broken:unload"]);
    assert_eq!(registry.bus().subscription_count(), 0);
    assert_eq!(registry.pending(), 0);
    assert_eq!(registry.modules().count(), 0);
}

#[test]
fn load_time_request_is_answered_by_later_module() {
    let journal = Journal::default();
    let mut registry = ModuleRegistry::new();
    let mut asker = Recorder::new("asker", &[MessageKind::VersionReport], &journal);
    asker.on_load.push(Message::GetVersion);

    registry.load(Box::new(asker)).unwrap();
    // Nothing delivered during load.
    assert_eq!(registry.pending(), 1);
    registry.load(Box::new(Responder)).unwrap();

    let delivery = registry.dispatch_pending();

    assert_eq!(delivery.messages, 2);
    assert_eq!(entries(&journal), vec!["asker:load", "asker:VersionReport"]);
}

#[test]
fn failing_subscriber_does_not_starve_healthy_one() {
    struct Faulty;

    impl Module for Faulty {
        fn name(&self) -> &str {
            "faulty"
        }

        fn load(&mut self, ctx: &mut LoadContext<'_>) -> Result<(), ModuleError> {
            ctx.subscribe(
                MessageKind::ThermalShutdownInd,
                handler_fn(|msg, _| Err(HandlerError::Unexpected(msg.kind()))),
            );
            Ok(())
        }

        fn unload(&mut self) {}
    }

    let journal = Journal::default();
    let mut registry = ModuleRegistry::new();
    registry.load(Box::new(Faulty)).unwrap();
    registry
        .load(Box::new(Recorder::new(
            "healthy",
            &[MessageKind::ThermalShutdownInd],
            &journal,
        )))
        .unwrap();

    for _ in 0..10 {
        registry.publish(Message::ThermalShutdownInd);
    }

    let received = entries(&journal)
        .iter()
        .filter(|e| e.as_str() == "healthy:ThermalShutdownInd")
        .count();
    assert_eq!(received, 10);
}

#[test]
fn drop_unloads_newest_first() {
    let journal = Journal::default();
    {
        let mut registry = ModuleRegistry::new();
        registry.load(Box::new(Recorder::new("a", &[], &journal))).unwrap();
        registry.load(Box::new(Recorder::new("b", &[], &journal))).unwrap();
    }
    assert_eq!(
        entries(&journal),
        vec!["a:load", "b:load", "b:unload", "a:unload"]
    );
}

#[test]
fn ids_are_not_reused() {
    let journal = Journal::default();
    let mut registry = ModuleRegistry::new();
    let first = registry.load(Box::new(Recorder::new("a", &[], &journal))).unwrap();
    registry.unload(first).unwrap();
    let second = registry.load(Box::new(Recorder::new("a", &[], &journal))).unwrap();
    assert_ne!(first, second);
    assert!(!registry.is_loaded(first));
    assert!(registry.is_loaded(second));
    assert_eq!(second, ModuleId(2));
}
