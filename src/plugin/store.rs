use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::plugin::accessor::{self, ListSelector};
use crate::plugin::document::ConfigDocument;
use crate::plugin::error::ConfigError;
use crate::syntax::SyntaxError;

/// Owns the config file on disk and the single document loaded from it.
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    document: Option<ConfigDocument>,
}

impl ConfigStore {
    /// Reads and parses the file at `path`. A missing file is not an error:
    /// the store loads empty and [`ConfigStore::exists`] reports `false`.
    pub fn load(path: PathBuf) -> Result<Self, ConfigError> {
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "config file not found");
                return Ok(Self {
                    path,
                    document: None,
                });
            }
            Err(source) => return Err(ConfigError::Io { path, source }),
        };

        let source = String::from_utf8(bytes).map_err(|err| {
            let offset = err.utf8_error().valid_up_to();
            let text = String::from_utf8_lossy(err.as_bytes());
            ConfigError::Malformed(SyntaxError::at(&text, offset, "invalid UTF-8").into())
        })?;
        let document = ConfigDocument::parse(source)?;

        // Recognized fields must be well-formed up front; a missing one is
        // only reported when an operation needs it.
        for selector in ListSelector::ALL {
            match accessor::get_list(&document, selector) {
                Ok(_) | Err(ConfigError::FieldNotFound { .. }) => {}
                Err(err) => return Err(err),
            }
        }

        debug!(path = %path.display(), bytes = document.source().len(), "config loaded");
        Ok(Self {
            path,
            document: Some(document),
        })
    }

    pub fn exists(&self) -> bool {
        self.document.is_some()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn document(&self) -> Result<&ConfigDocument, ConfigError> {
        self.document.as_ref().ok_or_else(|| ConfigError::Absent {
            path: self.path.clone(),
        })
    }

    /// Writes `document` to a sibling temp file and renames it over the
    /// config. A symlinked config keeps its link; the target is replaced.
    pub fn save(&self, document: &ConfigDocument) -> Result<(), ConfigError> {
        let target = fs::canonicalize(&self.path).unwrap_or_else(|_| self.path.clone());
        let tmp = temp_path(&target);

        if let Err(source) = write_atomically(&tmp, &target, document.source()) {
            let _ = fs::remove_file(&tmp);
            return Err(ConfigError::Io {
                path: target,
                source,
            });
        }

        info!(path = %target.display(), bytes = document.source().len(), "config saved");
        Ok(())
    }

    /// Saves `document` and, only once it is on disk, makes it the current one.
    pub fn commit(&mut self, document: ConfigDocument) -> Result<(), ConfigError> {
        self.save(&document)?;
        self.document = Some(document);
        Ok(())
    }
}

fn temp_path(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    target.with_file_name(name)
}

fn write_atomically(tmp: &Path, target: &Path, text: &str) -> io::Result<()> {
    let file = fs::File::create(tmp)?;
    if let Ok(metadata) = fs::metadata(target) {
        file.set_permissions(metadata.permissions())?;
    }

    let mut writer = io::BufWriter::new(file);
    writer.write_all(text.as_bytes())?;
    writer.flush()?;
    writer.get_ref().sync_all()?;
    drop(writer);

    fs::rename(tmp, target)
}
