//! The package registry plugins are published to.

pub mod npm;
pub mod search;

use thiserror::Error;

pub use npm::NpmRegistry;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginSummary {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("registry request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("registry returned {status} for {url}")]
    Status { status: u16, url: String },
}

pub trait Registry {
    /// Every package tagged with `keyword`, in registry order.
    fn query_by_keyword(&self, keyword: &str) -> Result<Vec<PluginSummary>, RegistryError>;

    /// Whether a package called `name` is published.
    fn is_name_taken(&self, name: &str) -> Result<bool, RegistryError>;
}
