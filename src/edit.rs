use crate::config::{ConfigDocument, ConfigStore, BACKUP_SECTION, BORG_SECTION};
use crate::error::{PersephoneError, Result};
use dialoguer::{Input, Select};
use serde_yaml::Value;

pub const DEFAULT_ENCRYPTION: &str = "repokey";

/// Fields that can be changed with `persephone edit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditableField {
    Repo,
    Passphrase,
    Encryption,
    Filter,
    Compression,
}

impl EditableField {
    pub const ALL: [EditableField; 5] = [
        EditableField::Repo,
        EditableField::Passphrase,
        EditableField::Encryption,
        EditableField::Filter,
        EditableField::Compression,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EditableField::Repo => "repo",
            EditableField::Passphrase => "passphrase",
            EditableField::Encryption => "encryption",
            EditableField::Filter => "filter",
            EditableField::Compression => "compression",
        }
    }

    pub fn section(self) -> &'static str {
        match self {
            EditableField::Repo | EditableField::Passphrase | EditableField::Encryption => {
                BORG_SECTION
            }
            EditableField::Filter | EditableField::Compression => BACKUP_SECTION,
        }
    }

    fn current(self, doc: &ConfigDocument) -> String {
        match (doc.get_scalar_string(self.section(), self.name()), self) {
            (Some(value), _) => value,
            (None, EditableField::Encryption) => DEFAULT_ENCRYPTION.to_string(),
            (None, _) => String::new(),
        }
    }
}

/// Write `value` into `field`. An empty encryption falls back to the default.
pub fn apply_edit(doc: &mut ConfigDocument, field: EditableField, value: &str) {
    let value = if field == EditableField::Encryption && value.is_empty() {
        DEFAULT_ENCRYPTION
    } else {
        value
    };
    doc.set(field.section(), field.name(), Value::String(value.to_string()));
}

/// Apply every `(field, value)` pair and save once. Returns false when there
/// was nothing to apply.
pub fn apply_edits(
    doc: &mut ConfigDocument,
    store: &ConfigStore,
    edits: &[(EditableField, String)],
) -> Result<bool> {
    if edits.is_empty() {
        return Ok(false);
    }
    for (field, value) in edits {
        apply_edit(doc, *field, value);
    }
    store.save(doc)?;
    println!("Configuration updated.");
    Ok(true)
}

/// Ask which field to change and its new value. Empty input keeps the
/// current value.
pub fn edit_interactive(doc: &mut ConfigDocument, store: &ConfigStore) -> Result<()> {
    let names: Vec<&str> = EditableField::ALL.iter().map(|f| f.name()).collect();
    let selection = Select::new()
        .with_prompt("Which variable would you like to edit?")
        .items(&names)
        .default(0)
        .interact_opt()
        .map_err(|dialoguer::Error::IO(e)| PersephoneError::Io(e))?
        .ok_or(PersephoneError::Cancelled)?;

    let field = EditableField::ALL[selection];
    let current = field.current(doc);
    let value: String = Input::new()
        .with_prompt(format!("Enter new value for {} (default: {})", field.name(), current))
        .allow_empty(true)
        .interact_text()
        .map_err(|dialoguer::Error::IO(e)| PersephoneError::Io(e))?;
    let value = if value.is_empty() { current } else { value };

    apply_edits(doc, store, &[(field, value)])?;
    Ok(())
}
