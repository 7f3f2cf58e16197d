//! Command line argument definitions.

use crate::models::DetailKind;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Rip Catalog - Link movie rips to TMDB and enrich them with details
#[derive(Parser, Debug)]
#[command(name = "rip-catalog")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config.toml (default: <config dir>/rip_catalog/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse filenames and print what was extracted
    Parse {
        /// Rip filenames
        #[arg(value_name = "FILENAME", required = true)]
        filenames: Vec<String>,
    },

    /// Add rips from a list of filenames (one per line) to the catalog
    Import {
        /// File with one rip filename per line
        #[arg(value_name = "LIST_FILE")]
        list_file: PathBuf,
    },

    /// Link unlinked rips to movies
    Link {
        /// Maximum number of rips searched online
        #[arg(long, value_name = "N")]
        max_calls: Option<usize>,

        /// Only match against movies already in the catalog
        #[arg(long)]
        local_only: bool,
    },

    /// Link rips listed in manual_external_ids
    LinkManual {
        /// Maximum number of movies fetched from TMDB
        #[arg(long, value_name = "N")]
        max_calls: Option<usize>,
    },

    /// Check that every id in manual_external_ids exists on TMDB
    ValidateManual,

    /// Fetch one kind of detail for movies that lack it
    Enrich {
        /// Detail kind: genres, cast, directors, keywords, imdb-id
        #[arg(value_name = "KIND")]
        kind: DetailKind,

        /// Maximum number of movies fetched from TMDB
        #[arg(long, value_name = "N")]
        max_calls: Option<usize>,
    },

    /// Check configuration, catalog and TMDB access
    Check,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_enrich() {
        let cli = Cli::try_parse_from(["rip-catalog", "enrich", "imdb-id", "--max-calls", "5"]).unwrap();
        match cli.command {
            Commands::Enrich { kind, max_calls } => {
                assert_eq!(kind, DetailKind::ImdbId);
                assert_eq!(max_calls, Some(5));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_unknown_kind_rejected() {
        assert!(Cli::try_parse_from(["rip-catalog", "enrich", "trivia"]).is_err());
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::try_parse_from(["rip-catalog", "link", "--local-only", "-v", "--config", "c.toml"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("c.toml")));
        assert!(matches!(cli.command, Commands::Link { local_only: true, max_calls: None }));
    }
}
