use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULTS: &str = include_str!("../../config/default.toml");

/// Settings for hpm itself. The HyperTerm config it edits is not configured here.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub registry: RegistryConfig,
    pub search: SearchConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    pub log_filter: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConfig {
    pub url: String,
    /// Keyword plugins are tagged with on the registry.
    pub keyword: String,
    pub timeout_secs: u64,
    pub page_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    pub max_results: usize,
}

impl AppConfig {
    /// Load configuration with layering: defaults → user config.
    pub fn load() -> Result<Self> {
        let user_path = directories::ProjectDirs::from("", "", "hpm")
            .map(|dirs| dirs.config_dir().join("config.toml"));
        Self::load_from(user_path.as_deref())
    }

    pub fn load_from(user_path: Option<&Path>) -> Result<Self> {
        let mut table: toml::Table = toml::from_str(DEFAULTS)?;

        if let Some(path) = user_path.filter(|path| path.exists()) {
            let user_str = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let user_table: toml::Table = toml::from_str(&user_str)
                .with_context(|| format!("failed to parse {}", path.display()))?;
            merge_tables(&mut table, user_table);
        }

        let config: AppConfig = toml::Value::Table(table)
            .try_into()
            .context("invalid hpm configuration")?;
        Ok(config)
    }

    /// Where log files go; stdout belongs to command output.
    pub fn log_dir() -> PathBuf {
        directories::ProjectDirs::from("", "", "hpm")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| std::env::temp_dir().join("hpm"))
    }
}

/// Overlays `overlay` onto `base`, descending into tables so a user file only
/// needs the keys it changes.
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match value {
            toml::Value::Table(overlay_table) => {
                if let Some(toml::Value::Table(base_table)) = base.get_mut(&key) {
                    merge_tables(base_table, overlay_table);
                    continue;
                }
                base.insert(key, toml::Value::Table(overlay_table));
            }
            value => {
                base.insert(key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_parse() {
        let config = AppConfig::load_from(None).unwrap();
        assert_eq!(config.general.log_filter, "hpm=info");
        assert_eq!(config.registry.url, "https://registry.npmjs.org");
        assert_eq!(config.registry.keyword, "hyperterm");
        assert_eq!(config.registry.page_size, 250);
        assert_eq!(config.search.max_results, 100);
    }

    #[test]
    fn test_user_file_overrides_single_keys() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(
            &path,
            "[registry]\nurl = \"https://npm.example.com\"\n\n[search]\nmax_results = 5\n",
        )
        .unwrap();

        let config = AppConfig::load_from(Some(path.as_path())).unwrap();
        assert_eq!(config.registry.url, "https://npm.example.com");
        assert_eq!(config.registry.keyword, "hyperterm");
        assert_eq!(config.registry.timeout_secs, 10);
        assert_eq!(config.search.max_results, 5);
    }

    #[test]
    fn test_missing_user_file_uses_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("nope.toml");
        let config = AppConfig::load_from(Some(missing.as_path())).unwrap();
        assert_eq!(config.search.max_results, 100);
    }

    #[test]
    fn test_invalid_user_value_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "[search]\nmax_results = \"many\"\n").unwrap();
        assert!(AppConfig::load_from(Some(path.as_path())).is_err());
    }
}
