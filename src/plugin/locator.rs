use std::path::PathBuf;

/// Name of the HyperTerm config file inside the home directory.
pub const CONFIG_FILE_NAME: &str = ".hyperterm.js";

/// Resolves where the HyperTerm config lives.
#[derive(Debug, Clone)]
pub struct ConfigLocator {
    home: PathBuf,
}

impl ConfigLocator {
    pub fn new(home: impl Into<PathBuf>) -> Self {
        Self { home: home.into() }
    }

    /// Locator rooted at the current user's home directory.
    pub fn from_home_dir() -> Option<Self> {
        directories::BaseDirs::new().map(|dirs| Self::new(dirs.home_dir()))
    }

    pub fn resolve(&self) -> PathBuf {
        self.home.join(CONFIG_FILE_NAME)
    }
}
