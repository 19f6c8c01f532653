//! Layer environment files
//!
//! Each variable is one file named `<NAME>.<action>` whose content is the
//! value, under `<layer>/env.build` or `<layer>/env.launch`.

use crate::error::{JvmLayerError, JvmLayerResult};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::debug;

/// How a variable combines with any value already set
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EnvAction {
    /// Replace any existing value
    Override,
    /// Set only when not already set
    Default,
    /// Append to an existing value
    Append,
    /// Prepend to an existing value
    Prepend,
}

impl EnvAction {
    fn suffix(self) -> &'static str {
        match self {
            Self::Override => "override",
            Self::Default => "default",
            Self::Append => "append",
            Self::Prepend => "prepend",
        }
    }

    fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "override" => Some(Self::Override),
            "default" => Some(Self::Default),
            "append" => Some(Self::Append),
            "prepend" => Some(Self::Prepend),
            _ => None,
        }
    }
}

/// Environment mutations a layer exports
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    entries: BTreeMap<(String, EnvAction), String>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_override(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.set(name, EnvAction::Override, value);
    }

    pub fn set_default(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.set(name, EnvAction::Default, value);
    }

    fn set(&mut self, name: impl Into<String>, action: EnvAction, value: impl Into<String>) {
        self.entries.insert((name.into(), action), value.into());
    }

    pub fn get(&self, name: &str, action: EnvAction) -> Option<&str> {
        self.entries
            .get(&(name.to_string(), action))
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write one file per variable into `dir`; nothing is created when empty
    pub fn write(&self, dir: &Path) -> JvmLayerResult<()> {
        if self.entries.is_empty() {
            return Ok(());
        }

        fs::create_dir_all(dir)
            .map_err(|e| JvmLayerError::io(format!("creating {}", dir.display()), e))?;
        for ((name, action), value) in &self.entries {
            let path = dir.join(format!("{}.{}", name, action.suffix()));
            fs::write(&path, value)
                .map_err(|e| JvmLayerError::io(format!("writing {}", path.display()), e))?;
        }
        Ok(())
    }

    /// Read the variables stored in `dir`; a missing directory is empty
    pub fn load(dir: &Path) -> JvmLayerResult<Self> {
        let mut environment = Self::new();
        if !dir.is_dir() {
            return Ok(environment);
        }

        let entries = fs::read_dir(dir)
            .map_err(|e| JvmLayerError::io(format!("reading {}", dir.display()), e))?;
        for entry in entries {
            let path = entry
                .map_err(|e| JvmLayerError::io(format!("reading entry of {}", dir.display()), e))?
                .path();
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();

            let Some((name, action)) = file_name
                .rsplit_once('.')
                .and_then(|(name, suffix)| Some((name, EnvAction::from_suffix(suffix)?)))
            else {
                debug!(path = %path.display(), "Ignoring unrecognized environment file");
                continue;
            };

            let value = fs::read_to_string(&path)
                .map_err(|e| JvmLayerError::io(format!("reading {}", path.display()), e))?;
            environment.set(name, action, value);
        }
        Ok(environment)
    }
}
