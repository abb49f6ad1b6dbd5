//! Module identity.

use serde::{Deserialize, Serialize};

/// Identifier the registry assigns to a loaded module.
///
/// Identifiers are never reused within one registry, so a stale id can only
/// ever refer to a module that is no longer loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModuleId(pub u32);

impl std::fmt::Display for ModuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "module#{}", self.0)
    }
}
