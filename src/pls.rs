use anyhow::Result;
use clap::Parser;
use persephone::commands;
use persephone::logging;
use persephone::system_config::SystemConfig;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pls")]
#[command(about = "List borg archives (shortcut for persephone list)")]
struct Cli {
    /// Configuration file
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(false);
    let system = SystemConfig::from_env().with_config_override(cli.config);
    commands::run_list(&system)?;
    Ok(())
}
