use std::path::PathBuf;

use thiserror::Error;

use crate::syntax::ParseError;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file does not exist. A state rather than a fault: mutating
    /// operations report it instead of touching the disk.
    #[error("no config file at {}", .path.display())]
    Absent { path: PathBuf },

    #[error("I/O error accessing config at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config: {0}")]
    Malformed(#[from] ParseError),

    #[error("config has no `{field}` list")]
    FieldNotFound { field: &'static str },

    #[error("{0} is already installed")]
    AlreadyInstalled(String),

    #[error("{0} is not installed")]
    NotInstalled(String),
}

impl ConfigError {
    /// Outcomes a caller should render as a friendly message, not a failure trace.
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            Self::AlreadyInstalled(_) | Self::NotInstalled(_) | Self::Absent { .. }
        )
    }
}
