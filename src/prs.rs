use anyhow::Result;
use clap::Parser;
use persephone::commands;
use persephone::logging;
use persephone::system_config::SystemConfig;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "prs")]
#[command(about = "Restore a borg archive (shortcut for persephone restore)")]
struct Cli {
    /// Name of the archive to restore
    archive: String,

    /// Directory to extract into
    #[arg(long, default_value = ".")]
    target: PathBuf,

    /// Configuration file
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(false);
    let system = SystemConfig::from_env().with_config_override(cli.config);
    commands::run_restore(&system, &cli.archive, &cli.target)?;
    Ok(())
}
