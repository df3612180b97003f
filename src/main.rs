use anyhow::Result;
use clap::{Parser, Subcommand};
use persephone::commands;
use persephone::edit::EditableField;
use persephone::logging;
use persephone::prompt;
use persephone::system_config::SystemConfig;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "persephone")]
#[command(about = "Keep a borg configuration complete and back up, list or restore its archives")]
struct Cli {
    /// Configuration file (defaults to $PERSEPHONE_CONFIG or /etc/persephone/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Prompt for any missing required configuration values
    Check,
    /// Create a new archive from the configured paths
    Backup {
        /// Show what would be archived without writing to the repository
        #[arg(long)]
        dry_run: bool,
    },
    /// List archives in the repository
    #[command(alias = "l")]
    List,
    /// Restore an archive
    #[command(alias = "r")]
    Restore {
        /// Name of the archive to restore
        archive: String,
        /// Directory to extract into
        #[arg(long, default_value = ".")]
        target: PathBuf,
    },
    /// Initialise the repository with the configured encryption
    Init,
    /// Verify repository consistency
    CheckRepo,
    /// Edit configuration values (interactive when no flags are given)
    Edit {
        /// Repository location
        #[arg(long)]
        repo: Option<String>,
        /// Prompt for a new repository passphrase
        #[arg(long)]
        passphrase: bool,
        /// Encryption mode (empty means repokey)
        #[arg(long)]
        encryption: Option<String>,
        /// Item filter for backups
        #[arg(long)]
        filter: Option<String>,
        /// Compression method
        #[arg(long)]
        compression: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    let system = SystemConfig::from_env().with_config_override(cli.config);

    match cli.command {
        Commands::Check => commands::run_check(&system)?,
        Commands::Backup { dry_run } => commands::run_backup(&system, dry_run)?,
        Commands::List => commands::run_list(&system)?,
        Commands::Restore { archive, target } => {
            commands::run_restore(&system, &archive, &target)?;
        }
        Commands::Init => commands::run_init(&system)?,
        Commands::CheckRepo => commands::run_check_repo(&system)?,
        Commands::Edit {
            repo,
            passphrase,
            encryption,
            filter,
            compression,
        } => {
            let passphrase = if passphrase {
                Some(prompt::read_secret("borg.passphrase")?)
            } else {
                None
            };
            let edits = [
                (EditableField::Repo, repo),
                (EditableField::Passphrase, passphrase),
                (EditableField::Encryption, encryption),
                (EditableField::Filter, filter),
                (EditableField::Compression, compression),
            ]
            .into_iter()
            .filter_map(|(field, value)| value.map(|v| (field, v)))
            .collect();
            commands::run_edit(&system, edits)?;
        }
    }

    Ok(())
}
