use crate::command_utils::execute_command;
use crate::config::{ConfigDocument, BACKUP_SECTION, BORG_SECTION};
use crate::error::{PersephoneError, Result};
use chrono::{DateTime, Local};
use log::{debug, info};
use std::fs;
use std::path::Path;

/// Something that can run the backup tool.
pub trait BackupTool {
    /// Run with `args`, adding `env` to this invocation only.
    fn run(
        &self,
        args: &[&str],
        env: &[(&str, &str)],
        current_dir: Option<&Path>,
    ) -> Result<String>;
}

/// The real `borg` binary.
#[derive(Debug, Clone)]
pub struct BorgCli {
    binary: String,
}

impl BorgCli {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl BackupTool for BorgCli {
    fn run(
        &self,
        args: &[&str],
        env: &[(&str, &str)],
        current_dir: Option<&Path>,
    ) -> Result<String> {
        let output = execute_command(&self.binary, args, env, current_dir)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(PersephoneError::BorgFailed { stderr });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// The parts of the configuration borg itself needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BorgSettings {
    pub repo: String,
    pub passphrase: String,
    pub encryption: String,
}

impl BorgSettings {
    pub fn from_config(doc: &ConfigDocument) -> Result<Self> {
        let field = |name: &str| -> Result<String> {
            match doc.get_scalar_string(BORG_SECTION, name) {
                Some(value) if !value.is_empty() => Ok(value),
                _ => Err(PersephoneError::ConfigMissing {
                    key: format!("{}.{}", BORG_SECTION, name),
                }),
            }
        };

        Ok(Self {
            repo: field("repo")?,
            passphrase: field("passphrase")?,
            encryption: field("encryption")?,
        })
    }

    fn env(&self) -> [(&str, &str); 1] {
        [("BORG_PASSPHRASE", self.passphrase.as_str())]
    }
}

pub const DEFAULT_COMPRESSION: &str = "zstd";

/// What goes into a new archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupSettings {
    pub paths: Vec<String>,
    pub compression: String,
    pub exclude_patterns: Vec<String>,
    /// Status characters for `--filter`, only meaningful with `--list`.
    pub filter: Option<String>,
}

impl BackupSettings {
    pub fn from_config(doc: &ConfigDocument) -> Result<Self> {
        let paths = doc.get_string_list(BACKUP_SECTION, "paths_to_backup");
        if paths.is_empty() {
            return Err(PersephoneError::ConfigMissing {
                key: format!("{}.paths_to_backup", BACKUP_SECTION),
            });
        }

        let compression = doc
            .get_scalar_string(BACKUP_SECTION, "compression")
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_COMPRESSION.to_string());
        let filter = doc
            .get_scalar_string(BACKUP_SECTION, "filter")
            .filter(|f| !f.is_empty());

        Ok(Self {
            paths,
            compression,
            exclude_patterns: doc.get_string_list(BACKUP_SECTION, "exclude_patterns"),
            filter,
        })
    }
}

/// `<host>-<timestamp>`, safe to use after `repo::`.
pub fn archive_name(host: &str, now: &DateTime<Local>) -> String {
    format!("{}-{}", host, now.format("%Y-%m-%dT%H-%M-%S"))
}

/// Create `archive` from the configured paths and return borg's output.
pub fn create_backup(
    tool: &dyn BackupTool,
    settings: &BorgSettings,
    backup: &BackupSettings,
    archive: &str,
    dry_run: bool,
) -> Result<String> {
    let location = format!("{}::{}", settings.repo, archive);

    let mut args: Vec<&str> = vec!["create", location.as_str()];
    args.extend(backup.paths.iter().map(String::as_str));
    args.extend([
        "--verbose",
        "--compression",
        backup.compression.as_str(),
        "--list",
        "--stats",
        "--show-rc",
        "--exclude-caches",
    ]);
    if let Some(filter) = &backup.filter {
        args.extend(["--filter", filter.as_str()]);
    }
    for pattern in &backup.exclude_patterns {
        args.extend(["--exclude", pattern.as_str()]);
    }
    if dry_run {
        args.push("--dry-run");
    }

    println!("Running Borg backup for {}...", location);
    let output = tool.run(&args, &settings.env(), None)?;

    info!("Created {}", location);
    println!("Borg backup completed successfully!");
    Ok(output)
}

pub fn list_archives(tool: &dyn BackupTool, settings: &BorgSettings) -> Result<String> {
    tool.run(&["list", &settings.repo], &settings.env(), None)
}

/// Extract `archive` into `target`.
///
/// A target directory created here is removed again if borg fails and left
/// it empty.
pub fn restore_archive(
    tool: &dyn BackupTool,
    settings: &BorgSettings,
    archive: &str,
    target: &Path,
) -> Result<()> {
    let created = !target.exists();
    if created {
        fs::create_dir_all(target)?;
    }
    let location = format!("{}::{}", settings.repo, archive);

    // borg extract always writes into its working directory
    if let Err(e) = tool.run(&["extract", &location], &settings.env(), Some(target)) {
        if created {
            if let Err(cleanup) = fs::remove_dir(target) {
                debug!("Leaving {} in place: {}", target.display(), cleanup);
            }
        }
        return Err(e);
    }

    info!("Restored {} into {}", location, target.display());
    println!("Restored archive '{}' to '{}'", archive, target.display());
    Ok(())
}

pub fn init_repo(tool: &dyn BackupTool, settings: &BorgSettings) -> Result<()> {
    tool.run(
        &["init", "--encryption", &settings.encryption, &settings.repo],
        &settings.env(),
        None,
    )?;

    println!("Repository {} created successfully.", settings.repo);
    Ok(())
}

pub fn check_repo(tool: &dyn BackupTool, settings: &BorgSettings) -> Result<()> {
    tool.run(&["check", &settings.repo], &settings.env(), None)?;

    println!("Repository check passed for {}.", settings.repo);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::cell::RefCell;
    use std::path::PathBuf;

    #[derive(Debug, Clone, PartialEq)]
    struct Call {
        args: Vec<String>,
        env: Vec<(String, String)>,
        current_dir: Option<PathBuf>,
    }

    #[derive(Default)]
    struct RecordingTool {
        calls: RefCell<Vec<Call>>,
        fail_with: Option<String>,
    }

    impl BackupTool for RecordingTool {
        fn run(
            &self,
            args: &[&str],
            env: &[(&str, &str)],
            current_dir: Option<&Path>,
        ) -> Result<String> {
            self.calls.borrow_mut().push(Call {
                args: args.iter().map(|a| a.to_string()).collect(),
                env: env
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                current_dir: current_dir.map(Path::to_path_buf),
            });
            match &self.fail_with {
                Some(stderr) => Err(PersephoneError::BorgFailed {
                    stderr: stderr.clone(),
                }),
                None => Ok("archive-1\narchive-2\n".to_string()),
            }
        }
    }

    fn settings() -> BorgSettings {
        BorgSettings {
            repo: "/data/repo".to_string(),
            passphrase: "secret".to_string(),
            encryption: "repokey".to_string(),
        }
    }

    #[test]
    fn test_settings_from_config() {
        let doc = ConfigDocument::from_yaml(
            "borg:\n  repo: /data/repo\n  passphrase: secret\n  encryption: repokey\nbackup: {}\n",
        )
        .unwrap();
        assert_eq!(BorgSettings::from_config(&doc).unwrap(), settings());
    }

    #[test]
    fn test_settings_accept_non_string_scalars() {
        let doc = ConfigDocument::from_yaml(
            "borg:\n  repo: /data/repo\n  passphrase: 123456\n  encryption: repokey\nbackup: {}\n",
        )
        .unwrap();

        let settings = BorgSettings::from_config(&doc).unwrap();
        assert_eq!(settings.passphrase, "123456");
    }

    #[test]
    fn test_backup_settings_defaults() {
        let doc = ConfigDocument::from_yaml("borg: {}\nbackup:\n  paths_to_backup: [/etc]\n")
            .unwrap();

        let backup = BackupSettings::from_config(&doc).unwrap();
        assert_eq!(backup.paths, vec!["/etc"]);
        assert_eq!(backup.compression, "zstd");
        assert!(backup.exclude_patterns.is_empty());
        assert_eq!(backup.filter, None);
    }

    #[test]
    fn test_backup_settings_need_paths() {
        let doc = ConfigDocument::from_yaml("borg: {}\nbackup:\n  paths_to_backup: []\n").unwrap();
        assert!(matches!(
            BackupSettings::from_config(&doc),
            Err(PersephoneError::ConfigMissing { .. })
        ));
    }

    #[test]
    fn test_create_backup_arguments() {
        let tool = RecordingTool::default();
        let backup = BackupSettings {
            paths: vec!["/etc".to_string(), "/home".to_string()],
            compression: "lz4".to_string(),
            exclude_patterns: vec!["home/*/.cache/*".to_string(), "var/tmp/*".to_string()],
            filter: Some("AME".to_string()),
        };

        create_backup(&tool, &settings(), &backup, "host-2024-01-01T00-00-00", true).unwrap();

        let calls = tool.calls.borrow();
        assert_eq!(
            calls[0].args,
            vec![
                "create",
                "/data/repo::host-2024-01-01T00-00-00",
                "/etc",
                "/home",
                "--verbose",
                "--compression",
                "lz4",
                "--list",
                "--stats",
                "--show-rc",
                "--exclude-caches",
                "--filter",
                "AME",
                "--exclude",
                "home/*/.cache/*",
                "--exclude",
                "var/tmp/*",
                "--dry-run",
            ]
        );
        assert_eq!(
            calls[0].env,
            vec![("BORG_PASSPHRASE".to_string(), "secret".to_string())]
        );
    }

    #[test]
    fn test_create_backup_without_dry_run() {
        let tool = RecordingTool::default();
        let backup = BackupSettings {
            paths: vec!["/srv".to_string()],
            compression: "zstd".to_string(),
            exclude_patterns: Vec::new(),
            filter: None,
        };

        create_backup(&tool, &settings(), &backup, "a", false).unwrap();

        let args = &tool.calls.borrow()[0].args;
        assert!(!args.contains(&"--dry-run".to_string()));
        assert!(!args.contains(&"--filter".to_string()));
    }

    #[test]
    fn test_archive_name_has_no_colons() {
        let now = Local.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap();
        assert_eq!(archive_name("nas", &now), "nas-2024-03-05T14-07-09");
    }

    #[test]
    fn test_settings_report_first_missing_key() {
        let doc =
            ConfigDocument::from_yaml("borg:\n  repo: /data/repo\n  passphrase: ''\n").unwrap();
        match BorgSettings::from_config(&doc) {
            Err(PersephoneError::ConfigMissing { key }) => assert_eq!(key, "borg.passphrase"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_list_passes_passphrase_in_call_env() {
        let tool = RecordingTool::default();
        let out = list_archives(&tool, &settings()).unwrap();

        assert_eq!(out, "archive-1\narchive-2\n");
        let calls = tool.calls.borrow();
        assert_eq!(calls[0].args, vec!["list", "/data/repo"]);
        assert_eq!(
            calls[0].env,
            vec![("BORG_PASSPHRASE".to_string(), "secret".to_string())]
        );
        assert!(std::env::var("BORG_PASSPHRASE").map_or(true, |v| v != "secret"));
    }

    #[test]
    fn test_restore_runs_in_target() {
        let dir = tempfile::TempDir::new().unwrap();
        let target = dir.path().join("restore");
        let tool = RecordingTool::default();

        restore_archive(&tool, &settings(), "host-2024-01-01", &target).unwrap();

        assert!(target.is_dir());
        let calls = tool.calls.borrow();
        assert_eq!(calls[0].args, vec!["extract", "/data/repo::host-2024-01-01"]);
        assert_eq!(calls[0].current_dir.as_deref(), Some(target.as_path()));
    }

    #[test]
    fn test_failed_restore_removes_created_target() {
        let dir = tempfile::TempDir::new().unwrap();
        let target = dir.path().join("restore");
        let tool = RecordingTool {
            fail_with: Some("Archive host does not exist".to_string()),
            ..Default::default()
        };

        assert!(restore_archive(&tool, &settings(), "host", &target).is_err());
        assert!(!target.exists());
    }

    #[test]
    fn test_failed_restore_keeps_existing_target() {
        let dir = tempfile::TempDir::new().unwrap();
        let tool = RecordingTool {
            fail_with: Some("Archive host does not exist".to_string()),
            ..Default::default()
        };

        assert!(restore_archive(&tool, &settings(), "host", dir.path()).is_err());
        assert!(dir.path().is_dir());
    }

    #[test]
    fn test_init_uses_configured_encryption() {
        let tool = RecordingTool::default();
        init_repo(&tool, &settings()).unwrap();

        assert_eq!(
            tool.calls.borrow()[0].args,
            vec!["init", "--encryption", "repokey", "/data/repo"]
        );
    }

    #[test]
    fn test_failure_carries_stderr() {
        let tool = RecordingTool {
            fail_with: Some("Repository /data/repo does not exist.".to_string()),
            ..Default::default()
        };

        let err = check_repo(&tool, &settings()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Borg command failed: Repository /data/repo does not exist."
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_cli_non_zero_exit_is_borg_failed() {
        let cli = BorgCli::new("sh");
        let err = cli
            .run(&["-c", "echo boom >&2; exit 2"], &[], None)
            .unwrap_err();

        match err {
            PersephoneError::BorgFailed { stderr } => assert_eq!(stderr, "boom"),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
