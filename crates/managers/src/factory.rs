//! Source deduplication per manager instance

use std::collections::HashMap;
use upm_types::ManagerSource;

/// Keeps one [`ManagerSource`] per name for a single manager
///
/// Packages parsed from listings often name a source before the source
/// listing itself has run; such sources get the manager's placeholder URL
/// until the real one is discovered. The upgrade is one-directional: a
/// real URL is never replaced by the placeholder again.
#[derive(Debug)]
pub struct SourceFactory {
    manager: String,
    placeholder_url: String,
    sources: HashMap<String, ManagerSource>,
}

impl SourceFactory {
    pub fn new(manager: impl Into<String>, placeholder_url: impl Into<String>) -> Self {
        Self {
            manager: manager.into(),
            placeholder_url: placeholder_url.into(),
            sources: HashMap::new(),
        }
    }

    /// The source with this name, created with the placeholder URL if it
    /// does not exist yet
    pub fn get_source_or_default(&mut self, name: &str) -> ManagerSource {
        if let Some(source) = self.sources.get(name) {
            return source.clone();
        }
        let source = ManagerSource::new(&self.manager, name, &self.placeholder_url);
        self.sources.insert(name.to_string(), source.clone());
        source
    }

    /// The source with this name, if it has been registered
    #[must_use]
    pub fn get_source_if_exists(&self, name: &str) -> Option<ManagerSource> {
        self.sources.get(name).cloned()
    }

    /// Register a discovered source
    ///
    /// A source already known under the same name keeps its URL unless it
    /// still carries the placeholder.
    pub fn add_source(&mut self, source: ManagerSource) {
        match self.sources.get_mut(&source.name) {
            Some(existing) => {
                if existing.url == self.placeholder_url {
                    existing.replace_url(source.url);
                }
                if source.package_count.is_some() {
                    existing.package_count = source.package_count;
                }
                if source.last_updated.is_some() {
                    existing.last_updated = source.last_updated;
                }
            }
            None => {
                self.sources.insert(source.name.clone(), source);
            }
        }
    }

    /// All sources registered so far, in no particular order
    #[must_use]
    pub fn available_sources(&self) -> Vec<ManagerSource> {
        self.sources.values().cloned().collect()
    }

    /// Drop everything, ahead of a fresh source listing
    pub fn reset(&mut self) {
        self.sources.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLACEHOLDER: &str = "https://scoop.sh/placeholder";

    #[test]
    fn test_dedup_by_name() {
        let mut factory = SourceFactory::new("scoop", PLACEHOLDER);
        let a = factory.get_source_or_default("main");
        let b = factory.get_source_or_default("main");
        assert_eq!(a, b);
        assert_eq!(factory.available_sources().len(), 1);
    }

    #[test]
    fn test_placeholder_url_is_upgraded() {
        let mut factory = SourceFactory::new("scoop", PLACEHOLDER);
        factory.get_source_or_default("main");

        factory.add_source(ManagerSource::new(
            "scoop",
            "main",
            "https://github.com/ScoopInstaller/Main",
        ));
        let upgraded = factory.get_source_if_exists("main").unwrap();
        assert_eq!(upgraded.url, "https://github.com/ScoopInstaller/Main");
    }

    #[test]
    fn test_real_url_is_never_downgraded() {
        let mut factory = SourceFactory::new("scoop", PLACEHOLDER);
        factory.add_source(ManagerSource::new(
            "scoop",
            "main",
            "https://github.com/ScoopInstaller/Main",
        ));

        factory.add_source(ManagerSource::new("scoop", "main", PLACEHOLDER));
        let kept = factory.get_source_if_exists("main").unwrap();
        assert_eq!(kept.url, "https://github.com/ScoopInstaller/Main");
    }

    #[test]
    fn test_reset_clears_sources() {
        let mut factory = SourceFactory::new("scoop", PLACEHOLDER);
        factory.get_source_or_default("main");
        factory.reset();
        assert!(factory.available_sources().is_empty());
    }
}
