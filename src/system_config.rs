use std::path::PathBuf;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/persephone/config.yaml";

#[derive(Debug, Clone)]
pub struct SystemConfig {
    pub config_path: PathBuf,
    pub borg_path: String,
    pub hostname: String,
}

impl SystemConfig {
    pub fn from_env() -> Self {
        let config_path = std::env::var("PERSEPHONE_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
        let borg_path = std::env::var("BORG_PATH").unwrap_or_else(|_| "borg".to_string());

        Self {
            config_path,
            borg_path,
            hostname: hostname(),
        }
    }

    /// A `--config` flag on the command line wins over the environment.
    pub fn with_config_override(mut self, config: Option<PathBuf>) -> Self {
        if let Some(path) = config {
            self.config_path = path;
        }
        self
    }
}

/// `HOSTNAME` if exported, then `/etc/hostname`.
fn hostname() -> String {
    std::env::var("HOSTNAME")
        .ok()
        .or_else(|| std::fs::read_to_string("/etc/hostname").ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "persephone".to_string())
}
