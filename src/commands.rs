use crate::borg::{self, BackupSettings, BorgCli, BorgSettings};
use crate::complete::ensure_required;
use crate::config::{ConfigDocument, ConfigStore};
use crate::edit::{apply_edits, edit_interactive, EditableField};
use crate::prompt::{ConsolePrompter, Prompter};
use crate::system_config::SystemConfig;
use anyhow::{Context, Result};
use chrono::Local;
use std::path::Path;

/// Load the configuration and fill in whatever required values are missing.
pub fn complete_config(
    store: &ConfigStore,
    prompter: &mut dyn Prompter,
) -> Result<ConfigDocument> {
    let mut doc = store.load();
    ensure_required(&mut doc, prompter, store)
        .context("Could not complete the configuration")?;
    println!("All required configuration values are set.");
    Ok(doc)
}

fn prepare(system: &SystemConfig) -> Result<(BorgCli, BorgSettings, ConfigDocument)> {
    let store = ConfigStore::new(&system.config_path);
    let doc = complete_config(&store, &mut ConsolePrompter)?;
    let settings = BorgSettings::from_config(&doc)?;
    Ok((BorgCli::new(&system.borg_path), settings, doc))
}

pub fn run_check(system: &SystemConfig) -> Result<()> {
    let store = ConfigStore::new(&system.config_path);
    complete_config(&store, &mut ConsolePrompter)?;
    Ok(())
}

pub fn run_list(system: &SystemConfig) -> Result<()> {
    let (tool, settings, _) = prepare(system)?;
    let archives = borg::list_archives(&tool, &settings).context("Listing archives failed")?;
    print!("{}", archives);
    Ok(())
}

pub fn run_backup(system: &SystemConfig, dry_run: bool) -> Result<()> {
    let (tool, settings, doc) = prepare(system)?;
    let backup = BackupSettings::from_config(&doc)?;
    let archive = borg::archive_name(&system.hostname, &Local::now());

    let output = borg::create_backup(&tool, &settings, &backup, &archive, dry_run)
        .context("Borg backup failed")?;
    print!("{}", output);
    Ok(())
}

pub fn run_restore(system: &SystemConfig, archive: &str, target: &Path) -> Result<()> {
    let (tool, settings, _) = prepare(system)?;
    borg::restore_archive(&tool, &settings, archive, target)
        .context("Restoring archive failed")?;
    Ok(())
}

pub fn run_init(system: &SystemConfig) -> Result<()> {
    let (tool, settings, _) = prepare(system)?;
    borg::init_repo(&tool, &settings)
        .with_context(|| format!("Failed to create repository {}", settings.repo))?;
    Ok(())
}

pub fn run_check_repo(system: &SystemConfig) -> Result<()> {
    let (tool, settings, _) = prepare(system)?;
    borg::check_repo(&tool, &settings)
        .with_context(|| format!("Repository check failed for {}", settings.repo))?;
    Ok(())
}

/// Apply `edits`, or ask interactively when there are none.
pub fn run_edit(system: &SystemConfig, edits: Vec<(EditableField, String)>) -> Result<()> {
    let store = ConfigStore::new(&system.config_path);
    let mut doc = store.load();

    if !apply_edits(&mut doc, &store, &edits)? {
        edit_interactive(&mut doc, &store)?;
    }
    Ok(())
}
