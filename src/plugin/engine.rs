use std::path::Path;

use crate::plugin::accessor::ListSelector;
use crate::plugin::error::ConfigError;
use crate::plugin::locator::ConfigLocator;
use crate::plugin::mutator;
use crate::plugin::store::ConfigStore;

/// Entry point for everything the command line does to the config file.
///
/// Loads the file once at construction and keeps the document for the rest of
/// the process; mutations persist immediately and never re-read the disk.
#[derive(Debug)]
pub struct ConfigEngine {
    store: ConfigStore,
}

impl ConfigEngine {
    pub fn load(locator: &ConfigLocator) -> Result<Self, ConfigError> {
        Ok(Self {
            store: ConfigStore::load(locator.resolve())?,
        })
    }

    pub fn exists(&self) -> bool {
        self.store.exists()
    }

    pub fn config_path(&self) -> &Path {
        self.store.path()
    }

    pub fn is_installed(&self, id: &str, selector: ListSelector) -> bool {
        self.store
            .document()
            .map(|document| mutator::is_installed(document, id, selector))
            .unwrap_or(false)
    }

    pub fn install(&mut self, id: &str, selector: ListSelector) -> Result<(), ConfigError> {
        mutator::install(&mut self.store, id, selector)
    }

    pub fn uninstall(&mut self, id: &str, selector: ListSelector) -> Result<(), ConfigError> {
        mutator::uninstall(&mut self.store, id, selector)
    }

    pub fn list(&self, selector: ListSelector) -> Option<Vec<String>> {
        let document = self.store.document().ok()?;
        mutator::list(document, selector)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn engine_with(source: Option<&str>) -> (tempfile::TempDir, ConfigEngine) {
        let tmp = tempfile::tempdir().unwrap();
        let locator = ConfigLocator::new(tmp.path());
        if let Some(source) = source {
            fs::write(locator.resolve(), source).unwrap();
        }
        let engine = ConfigEngine::load(&locator).unwrap();
        (tmp, engine)
    }

    #[test]
    fn test_fresh_empty_list() {
        let (_tmp, engine) = engine_with(Some("module.exports = {plugins: []};"));
        assert!(engine.exists());
        for id in ["a", "", "🦁", "plugins"] {
            assert!(!engine.is_installed(id, ListSelector::Global));
        }
        assert_eq!(engine.list(ListSelector::Global), None);
        assert_eq!(engine.list(ListSelector::Local), None);
    }

    #[test]
    fn test_lifecycle_with_emoji_identifier() {
        let (tmp, mut engine) = engine_with(Some("module.exports = {plugins: []};"));

        assert!(!engine.is_installed("🦁", ListSelector::Global));
        engine.install("🦁", ListSelector::Global).unwrap();
        assert!(engine.is_installed("🦁", ListSelector::Global));
        assert_eq!(
            engine.list(ListSelector::Global),
            Some(vec!["🦁".to_string()])
        );

        let err = engine.install("🦁", ListSelector::Global).unwrap_err();
        assert!(matches!(err, ConfigError::AlreadyInstalled(_)));
        assert!(err.is_expected());

        engine.uninstall("🦁", ListSelector::Global).unwrap();
        assert!(!engine.is_installed("🦁", ListSelector::Global));

        let err = engine.uninstall("🦁", ListSelector::Global).unwrap_err();
        assert!(matches!(err, ConfigError::NotInstalled(_)));

        assert_eq!(
            fs::read_to_string(tmp.path().join(".hyperterm.js")).unwrap(),
            "module.exports = {plugins: []};"
        );
    }

    #[test]
    fn test_uniqueness_after_double_install() {
        let (_tmp, mut engine) = engine_with(Some("module.exports = {plugins: ['a']};"));
        engine.install("b", ListSelector::Global).unwrap();
        assert!(engine.install("b", ListSelector::Global).is_err());
        let listed = engine.list(ListSelector::Global).unwrap();
        assert_eq!(listed.iter().filter(|id| *id == "b").count(), 1);
    }

    #[test]
    fn test_missing_config_never_panics() {
        let (tmp, mut engine) = engine_with(None);
        assert!(!engine.exists());
        assert!(!engine.is_installed("a", ListSelector::Global));
        assert_eq!(engine.list(ListSelector::Global), None);
        assert!(matches!(
            engine.install("a", ListSelector::Global),
            Err(ConfigError::Absent { .. })
        ));
        assert!(matches!(
            engine.uninstall("a", ListSelector::Local),
            Err(ConfigError::Absent { .. })
        ));
        assert_eq!(engine.config_path(), tmp.path().join(".hyperterm.js"));
    }

    #[test]
    fn test_list_of_local_plugins() {
        let (_tmp, engine) =
            engine_with(Some("export default {\n  plugins: [],\n  localPlugins: ['mine'],\n}\n"));
        assert_eq!(engine.list(ListSelector::Global), None);
        assert_eq!(
            engine.list(ListSelector::Local),
            Some(vec!["mine".to_string()])
        );
        assert!(engine.is_installed("mine", ListSelector::Local));
        assert!(!engine.is_installed("mine", ListSelector::Global));
    }
}
