//! CLI argument parsing with clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::DEFAULT_CONFIG_PATH;

#[derive(Parser)]
#[command(name = "maintgate")]
#[command(author, version, about = "Maintenance mode gate for web applications")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file path
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH, global = true)]
    pub config: PathBuf,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug output)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Put the application into maintenance mode
    Down {
        /// Message shown to blocked visitors
        #[arg(short, long)]
        message: Option<String>,

        /// IP address or CIDR range allowed through (repeatable)
        #[arg(long = "ip", value_name = "IP")]
        ips: Vec<String>,

        /// Expected duration in minutes (informational)
        #[arg(short, long)]
        duration: Option<u64>,

        /// Secret key allowing bypass via ?maintenance_secret=<key>
        #[arg(long, conflicts_with = "generate_secret")]
        secret: Option<String>,

        /// Generate a random secret key
        #[arg(long)]
        generate_secret: bool,

        /// Bypass cookie name (random if omitted)
        #[arg(long)]
        cookie: Option<String>,
    },

    /// Bring the application out of maintenance mode
    Up,

    /// Show maintenance status
    Status {
        /// Print the stored record as JSON
        #[arg(long)]
        json: bool,

        /// Show the bypass secret instead of masking it
        #[arg(long)]
        show_secret: bool,
    },

    /// Move maintenance data from file storage to the cache
    Migrate {
        /// Migrate even if the configured backend is not the cache
        #[arg(long)]
        force: bool,

        /// Clear maintenance data from all storage backends instead
        #[arg(long)]
        clear: bool,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Simulate a request through the gate
    Check {
        /// Client IP address
        #[arg(long, default_value = "127.0.0.1")]
        ip: String,

        /// Value of the maintenance_secret query parameter
        #[arg(long)]
        secret: Option<String>,

        /// Cookie sent with the request, as NAME=VALUE (repeatable)
        #[arg(long = "cookie", value_name = "NAME=VALUE")]
        cookies: Vec<String>,
    },

    /// Write a default configuration file to the --config path
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show version
    Version,
}
