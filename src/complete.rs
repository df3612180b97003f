use crate::config::{split_list, ConfigDocument, ConfigStore, BACKUP_SECTION, BORG_SECTION};
use crate::error::Result;
use crate::prompt::Prompter;
use log::{info, warn};
use serde_yaml::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Scalar,
    /// Entered as a comma-separated line, stored as a sequence.
    List,
}

/// A `section.field` location that must be filled before borg can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequiredField {
    pub section: &'static str,
    pub field: &'static str,
    pub kind: FieldKind,
}

impl fmt::Display for RequiredField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.section, self.field)
    }
}

impl RequiredField {
    /// Absent, null, empty, or of a shape borg cannot take for this field.
    pub fn is_missing_in(&self, doc: &ConfigDocument) -> bool {
        match self.kind {
            FieldKind::Scalar => doc
                .get_scalar_string(self.section, self.field)
                .map_or(true, |value| value.is_empty()),
            FieldKind::List => doc.get_string_list(self.section, self.field).is_empty(),
        }
    }

    fn value_from_answer(&self, answer: String) -> Value {
        match self.kind {
            FieldKind::Scalar => Value::String(answer),
            FieldKind::List => {
                Value::Sequence(split_list(&answer).into_iter().map(Value::String).collect())
            }
        }
    }
}

pub const REQUIRED_FIELDS: [RequiredField; 4] = [
    RequiredField {
        section: BORG_SECTION,
        field: "repo",
        kind: FieldKind::Scalar,
    },
    RequiredField {
        section: BORG_SECTION,
        field: "passphrase",
        kind: FieldKind::Scalar,
    },
    RequiredField {
        section: BORG_SECTION,
        field: "encryption",
        kind: FieldKind::Scalar,
    },
    RequiredField {
        section: BACKUP_SECTION,
        field: "paths_to_backup",
        kind: FieldKind::List,
    },
];

/// Required fields that are currently missing from `doc`, in fixed order.
pub fn missing_fields(doc: &ConfigDocument) -> Vec<RequiredField> {
    REQUIRED_FIELDS
        .iter()
        .filter(|required| required.is_missing_in(doc))
        .copied()
        .collect()
}

/// Prompt for every missing required field, then save the document.
///
/// The set of fields to ask for is fixed before the first prompt. The
/// document is saved even when nothing was missing. Returns the dotted keys
/// that were filled in.
pub fn ensure_required(
    doc: &mut ConfigDocument,
    prompter: &mut dyn Prompter,
    store: &ConfigStore,
) -> Result<Vec<String>> {
    let missing = missing_fields(doc);
    let mut filled = Vec::with_capacity(missing.len());

    for required in missing {
        let key = required.to_string();
        let answer = prompter.prompt(&key)?;
        if answer.is_empty() {
            warn!("Empty value entered for {}", key);
        }
        doc.set(
            required.section,
            required.field,
            required.value_from_answer(answer),
        );
        info!("Set {}", key);
        filled.push(key);
    }

    store.save(doc)?;
    Ok(filled)
}
