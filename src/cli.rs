use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// gametui - Linux gaming setup tool
#[derive(Parser)]
#[command(name = "gametui")]
#[command(about = "Set up gaming on Linux: launchers, drivers, tools, and game drives")]
#[command(version)]
pub struct Cli {
    /// Dry-run mode: show what would be executed without making changes.
    ///
    /// Every command of the plan is printed but not spawned. Detection and
    /// other read-only discovery still run so the preview is realistic.
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Install the selected components
    Install {
        /// Component keys to install (comma-separated or repeated)
        #[arg(short, long, value_delimiter = ',')]
        components: Vec<String>,

        /// Load the selection from a JSON file instead
        #[arg(long)]
        config: Option<PathBuf>,

        /// Save the effective selection to a JSON file as well
        #[arg(long)]
        save_selection: Option<PathBuf>,
    },
    /// Remove previously installed components (mounts are never touched)
    Uninstall {
        /// Component keys to remove (comma-separated or repeated)
        #[arg(short, long, value_delimiter = ',')]
        components: Vec<String>,

        /// Load the selection from a JSON file instead
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Resolve and print the plan without executing anything
    Plan {
        /// Component keys to plan for (comma-separated or repeated)
        #[arg(short, long, value_delimiter = ',')]
        components: Vec<String>,

        /// Load the selection from a JSON file instead
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// List all installable components
    List,
    /// Show detected system facts and candidate drives
    Detect,
    /// Game drive operations
    Drives {
        #[command(subcommand)]
        drive_command: DriveCommands,
    },
}

#[derive(Subcommand)]
pub enum DriveCommands {
    /// List unmounted drives eligible for provisioning
    List,
    /// Persist and mount a detected drive
    Mount {
        /// Device node to mount (e.g. /dev/sdb1)
        #[arg(short, long)]
        device: String,

        /// Mount point (default: /mnt/games_<node>)
        #[arg(short, long)]
        mountpoint: Option<String>,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        <Self as clap::Parser>::parse()
    }
}
