use anyhow::{ensure, Context, Result};
use clio::{ClioPath, Output};
use std::path::Path;

/// A file path taken from the CLI or the config file. Serializes as the path itself so the
/// summary shows what was passed in.
#[derive(Clone, Debug)]
pub(crate) struct ConfigPath(ClioPath);

impl ConfigPath {
    pub(crate) fn new(path: &str) -> Result<Self> {
        Ok(Self(ClioPath::new(path).with_context(|| format!("invalid path {:?}", path))?))
    }

    /// For paths we read from, which have to name a regular file
    pub(crate) fn existing_file(path: &str) -> Result<Self> {
        let config_path = Self::new(path)?;

        ensure!(config_path.path().try_exists()?, "{} does not exist", config_path);
        ensure!(config_path.path().is_file(), "{} is not a file", config_path);

        Ok(config_path)
    }

    pub(crate) fn path(&self) -> &Path {
        self.0.path()
    }

    /// Opens the path for writing, truncating whatever is there
    pub(crate) fn create(&self) -> Result<Output> {
        self.0.clone().create().with_context(|| format!("creating {}", self))
    }
}

impl From<ClioPath> for ConfigPath {
    fn from(clio_path: ClioPath) -> Self {
        Self(clio_path)
    }
}

impl std::fmt::Display for ConfigPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path().display())
    }
}

impl serde::Serialize for ConfigPath {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
