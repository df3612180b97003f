//! Convenience layer over the `borg` backup tool: keeps a YAML
//! configuration complete and passes list/restore requests through to borg.

pub mod borg;
pub mod command_utils;
pub mod commands;
pub mod complete;
pub mod config;
pub mod edit;
pub mod error;
pub mod logging;
pub mod prompt;
pub mod system_config;

pub use error::PersephoneError;
