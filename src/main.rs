//! Rip Catalog CLI
//!
//! A command-line tool that links movie rips to TMDB and enriches them.

use anyhow::Context;
use clap::Parser;
use rip_catalog::cli::{
    args::{Cli, Commands},
    commands::{enrich, import, link, parse},
};
use rip_catalog::core::resolver::ResolveOptions;
use rip_catalog::models::config::{default_config_file, load_config, Config};
use rip_catalog::preflight;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    let config_path = cli.config.clone().unwrap_or_else(default_config_file);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;

    // Run the appropriate command
    match cli.command {
        Commands::Parse { filenames } => {
            parse::parse(&filenames)?;
        }

        Commands::Import { list_file } => {
            import::import(&config, &list_file)?;
        }

        Commands::Link {
            max_calls,
            local_only,
        } => {
            link::link(
                &config,
                ResolveOptions {
                    max_calls,
                    local_only,
                },
            )
            .await?;
        }

        Commands::LinkManual { max_calls } => {
            link::link_manual(&config, max_calls).await?;
        }

        Commands::ValidateManual => {
            link::validate_manual(&config).await?;
        }

        Commands::Enrich { kind, max_calls } => {
            enrich::enrich(&config, kind, max_calls).await?;
        }

        Commands::Check => {
            run_preflight_checks(&config).await?;
        }
    }

    Ok(())
}

/// Initialize the logging system.
fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("rip_catalog=debug")
    } else {
        EnvFilter::new("rip_catalog=info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time())
        .with(filter)
        .init();
}

/// Run preflight checks and fail if any of them did.
async fn run_preflight_checks(config: &Config) -> anyhow::Result<()> {
    use colored::Colorize;

    println!("{}", "Running preflight checks...".bold());
    println!();

    let results = preflight::run_preflight_checks(config).await;
    preflight::print_results(&results);

    println!();

    if !preflight::all_passed(&results) {
        anyhow::bail!("Preflight checks failed. Fix the issues above and try again.");
    }

    Ok(())
}
