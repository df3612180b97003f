#![allow(dead_code)]

use persephone::error::{PersephoneError, Result};
use persephone::prompt::Prompter;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

pub const COMPLETE_CONFIG: &str = r#"borg:
  repo: /data/repo
  passphrase: secret
  encryption: repokey
backup:
  compression: lz4
  paths_to_backup:
    - /etc
    - /home
"#;

/// Answers prompts from a fixed list and records which keys were asked.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<String>,
    pub asked: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: answers.iter().map(|a| a.to_string()).collect(),
            asked: Vec::new(),
        }
    }
}

impl Prompter for ScriptedPrompter {
    fn prompt(&mut self, key: &str) -> Result<String> {
        self.asked.push(key.to_string());
        self.answers.pop_front().ok_or_else(|| PersephoneError::Prompt {
            key: key.to_string(),
            source: std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "no scripted answer"),
        })
    }
}

pub fn write_config(dir: &Path, contents: &str) -> PathBuf {
    let path = dir.join("config.yaml");
    fs::write(&path, contents).unwrap();
    path
}

/// A stand-in for borg that echoes its arguments and the passphrase it got.
#[cfg(unix)]
pub fn fake_borg(dir: &Path, exit_code: i32) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("fake-borg");
    let script = format!(
        "#!/bin/sh\necho \"args: $*\"\necho \"passphrase: $BORG_PASSPHRASE\"\necho \"cwd: $(pwd)\"\nif [ {code} -ne 0 ]; then echo \"Repository does not exist.\" >&2; fi\nexit {code}\n",
        code = exit_code
    );
    fs::write(&path, script).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}
