//! Cached daemon version.

use devstate_protocol::UNKNOWN_VERSION;

/// Version string reported once and remembered until unload.
///
/// The first non-empty report wins; later reports are ignored.
#[derive(Debug, Default)]
pub struct VersionCache {
    version: Option<String>,
}

impl VersionCache {
    /// Offer a reported version. Returns whether it was stored.
    pub fn observe(&mut self, version: &str) -> bool {
        if self.version.is_some() || version.is_empty() {
            return false;
        }
        self.version = Some(version.to_string());
        true
    }

    pub fn get(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Value for a `get_version` reply.
    pub fn reply_value(&self) -> &str {
        self.get().unwrap_or(UNKNOWN_VERSION)
    }

    pub fn clear(&mut self) {
        self.version = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_until_reported() {
        let cache = VersionCache::default();
        assert_eq!(cache.get(), None);
        assert_eq!(cache.reply_value(), "unknown");
    }

    #[test]
    fn first_non_empty_report_wins() {
        let mut cache = VersionCache::default();
        assert!(!cache.observe(""));
        assert!(cache.observe("1.2.3"));
        assert!(!cache.observe("2.0.0"));
        assert!(!cache.observe(""));
        assert_eq!(cache.reply_value(), "1.2.3");
    }

    #[test]
    fn clear_returns_to_unset() {
        let mut cache = VersionCache::default();
        cache.observe("1.2.3");
        cache.clear();
        assert_eq!(cache.get(), None);
        assert!(cache.observe("1.2.4"));
        assert_eq!(cache.reply_value(), "1.2.4");
    }
}
