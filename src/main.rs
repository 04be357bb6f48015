//! maintgate - Maintenance mode gate for web applications
//!
//! Command-line front end for enabling, inspecting and testing maintenance mode.

use anyhow::Result;
use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use maintgate::cli::{Cli, Commands};
use maintgate::commands::down::DownOptions;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    let log_level = if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::ERROR
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Execute command
    match cli.command {
        Commands::Down {
            message,
            ips,
            duration,
            secret,
            generate_secret,
            cookie,
        } => {
            let options = DownOptions {
                message,
                ips,
                duration,
                secret,
                generate_secret,
                cookie,
            };
            maintgate::commands::down::run(options, &cli.config)
        }
        Commands::Up => maintgate::commands::up::run(&cli.config),
        Commands::Status { json, show_secret } => {
            maintgate::commands::status::run(json, show_secret, &cli.config)
        }
        Commands::Migrate { force, clear, yes } => {
            maintgate::commands::migrate::run(force, clear, yes, &cli.config)
        }
        Commands::Check {
            ip,
            secret,
            cookies,
        } => maintgate::commands::check::run(&ip, secret, &cookies, &cli.config),
        Commands::Init { force } => maintgate::commands::init::run(force, &cli.config),
        Commands::Version => {
            println!("maintgate {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
