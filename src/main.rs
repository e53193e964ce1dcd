//! bootkeep - boot image lifecycle manager.
//!
//! Runs once per kernel update: selects the kernel, builds its initramfs
//! and optional unified EFI image, rotates old copies in the boot
//! partition, and regenerates the bootloader menu.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use bootkeep::cleanup;
use bootkeep::commands::{self, show::ShowTarget};
use bootkeep::config::{Config, DEFAULT_CONFIG_PATH};

#[derive(Parser)]
#[command(name = "bootkeep")]
#[command(about = "Boot image lifecycle manager")]
#[command(
    after_help = "TYPICAL USE:\n  bootkeep preflight  Check host tools before the first managed run\n  bootkeep run        Build and rotate boot images for the newest kernel\n  bootkeep menu       Regenerate the boot menu from what is on disk"
)]
struct Cli {
    /// Configuration file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build initramfs and EFI images, rotate old copies, regenerate the menu
    Run {
        /// Use this kernel image instead of discovering the newest one
        #[arg(long)]
        kernel: Option<PathBuf>,
    },

    /// Regenerate the boot menu from the retained images (no builds)
    Menu,

    /// Show information
    Show {
        #[command(subcommand)]
        what: ShowArg,
    },

    /// Run preflight checks (verify host tools and preconditions)
    Preflight {
        /// Fail if any checks fail (exit code 1)
        #[arg(long)]
        strict: bool,
    },
}

#[derive(Subcommand)]
enum ShowArg {
    /// Show the effective configuration
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;

    match cli.command {
        Commands::Run { kernel } => {
            if !config.managed {
                println!("Boot image management is disabled (set MANAGED=yes); nothing to do.");
                return Ok(());
            }
            cleanup::install_signal_handlers();
            commands::cmd_run(&config, kernel.as_deref())
        }

        Commands::Menu => {
            if !config.managed {
                println!("Boot image management is disabled (set MANAGED=yes); nothing to do.");
                return Ok(());
            }
            cleanup::install_signal_handlers();
            commands::cmd_menu(&config)
        }

        Commands::Show { what } => {
            let target = match what {
                ShowArg::Config => ShowTarget::Config,
            };
            commands::cmd_show(&config, target)
        }

        Commands::Preflight { strict } => commands::cmd_preflight(&config, strict),
    }
}
