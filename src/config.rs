use crate::error::{PersephoneError, Result};
use log::{debug, info, warn};
use serde::Serialize;
use serde_yaml::{Mapping, Value};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const BORG_SECTION: &str = "borg";
pub const BACKUP_SECTION: &str = "backup";

/// The persisted YAML document.
///
/// Both the `borg` and `backup` sections are always present as mappings.
/// Anything else in the file is carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ConfigDocument(Mapping);

impl Default for ConfigDocument {
    fn default() -> Self {
        let mut doc = ConfigDocument(Mapping::new());
        doc.ensure_sections();
        doc
    }
}

impl ConfigDocument {
    /// Parse a document, returning `None` when the text is not a YAML mapping.
    pub fn from_yaml(text: &str) -> Option<Self> {
        match serde_yaml::from_str::<Value>(text) {
            Ok(Value::Mapping(mapping)) => {
                let mut doc = ConfigDocument(mapping);
                doc.ensure_sections();
                Some(doc)
            }
            Ok(other) => {
                debug!("Configuration is not a mapping: {:?}", other);
                None
            }
            Err(e) => {
                debug!("Configuration does not parse: {}", e);
                None
            }
        }
    }

    pub fn to_yaml(&self) -> std::result::Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    fn ensure_sections(&mut self) {
        for name in [BORG_SECTION, BACKUP_SECTION] {
            let is_mapping = matches!(self.0.get(name), Some(Value::Mapping(_)));
            if !is_mapping {
                self.0
                    .insert(Value::String(name.to_string()), Value::Mapping(Mapping::new()));
            }
        }
    }

    pub fn section(&self, name: &str) -> Option<&Mapping> {
        self.0.get(name).and_then(Value::as_mapping)
    }

    pub fn get(&self, section: &str, field: &str) -> Option<&Value> {
        self.section(section).and_then(|s| s.get(field))
    }

    pub fn get_str(&self, section: &str, field: &str) -> Option<&str> {
        self.get(section, field).and_then(Value::as_str)
    }

    /// Write `value` at `section.field`, creating the section if needed.
    pub fn set(&mut self, section: &str, field: &str, value: Value) {
        let entry = self
            .0
            .entry(Value::String(section.to_string()))
            .or_insert_with(|| Value::Mapping(Mapping::new()));
        if !entry.is_mapping() {
            *entry = Value::Mapping(Mapping::new());
        }
        if let Value::Mapping(mapping) = entry {
            mapping.insert(Value::String(field.to_string()), value);
        }
    }

    /// A scalar rendered as text. Numbers and booleans count, so a
    /// hand-written `passphrase: 123456` is usable.
    pub fn get_scalar_string(&self, section: &str, field: &str) -> Option<String> {
        self.get(section, field).and_then(scalar_to_string)
    }

    /// A list of strings. A plain string is read as a comma-separated list;
    /// empty entries are dropped.
    pub fn get_string_list(&self, section: &str, field: &str) -> Vec<String> {
        match self.get(section, field) {
            Some(Value::Sequence(items)) => items
                .iter()
                .filter_map(scalar_to_string)
                .filter(|item| !item.is_empty())
                .collect(),
            Some(Value::String(s)) => split_list(s),
            Some(other) => scalar_to_string(other).into_iter().collect(),
            None => Vec::new(),
        }
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Split a comma-separated line, trimming entries and dropping empty ones.
pub fn split_list(line: &str) -> Vec<String> {
    line.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

/// Durable storage for the [`ConfigDocument`] at a fixed path.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the document, falling back to an empty skeleton.
    ///
    /// A missing, unreadable or unparseable file is the first-run case and
    /// never an error. The skeleton is written back straight away.
    pub fn load(&self) -> ConfigDocument {
        match fs::read_to_string(&self.path) {
            Ok(text) => {
                if let Some(doc) = ConfigDocument::from_yaml(&text) {
                    debug!("Loaded configuration from {}", self.path.display());
                    return doc;
                }
                warn!(
                    "Configuration at {} is not valid YAML, starting from an empty one",
                    self.path.display()
                );
            }
            Err(e) => {
                debug!("Cannot read {}: {}", self.path.display(), e);
                println!("No configuration file found. Creating a new one...");
            }
        }

        let doc = ConfigDocument::default();
        if let Err(e) = self.save(&doc) {
            warn!("{}", e);
        }
        doc
    }

    /// Overwrite the file with `doc`.
    pub fn save(&self, doc: &ConfigDocument) -> Result<()> {
        let write_error = |source: io::Error| PersephoneError::ConfigWrite {
            path: self.path.clone(),
            source,
        };

        let text = doc
            .to_yaml()
            .map_err(|e| write_error(io::Error::new(io::ErrorKind::InvalidData, e)))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(write_error)?;
            }
        }
        fs::write(&self.path, text).map_err(write_error)?;

        info!("Configuration saved to {}", self.path.display());
        Ok(())
    }
}
