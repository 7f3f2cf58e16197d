//! CLI command implementations.

pub mod enrich;
pub mod import;
pub mod link;
pub mod parse;

use crate::core::events::{EventSink, PipelineEvent, RunSummary, TracingSink};
use crate::core::policy::RateLimitedRetryPolicy;
use crate::models::config::Config;
use crate::services::tmdb::TmdbClient;
use crate::store::CatalogStore;
use crate::Result;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Open the catalog named in the configuration.
pub(crate) fn open_catalog(config: &Config) -> Result<CatalogStore> {
    CatalogStore::open(&config.catalog_path)
}

/// TMDB client and the policy every call goes through.
pub(crate) fn remote(config: &Config) -> Result<(TmdbClient, RateLimitedRetryPolicy)> {
    let client = TmdbClient::new(&config.tmdb)?;
    let policy = RateLimitedRetryPolicy::from_settings(config)?;
    Ok((client, policy))
}

/// Spinner that shows the latest event and forwards everything to tracing.
pub(crate) struct ProgressSink {
    pb: ProgressBar,
}

impl ProgressSink {
    pub(crate) fn new() -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.enable_steady_tick(Duration::from_millis(120));
        Self { pb }
    }

    pub(crate) fn finish(&self) {
        self.pb.finish_and_clear();
    }
}

impl EventSink for ProgressSink {
    fn emit(&self, event: &PipelineEvent) {
        match event {
            PipelineEvent::WarmingUp { delay } => {
                self.pb
                    .set_message(format!("Waiting {}s for the rate limiter", delay.as_secs()));
            }
            PipelineEvent::Linked { file_name, .. } => self.pb.set_message(file_name.clone()),
            PipelineEvent::DetailsAssigned { movie_id, kind, .. } => {
                self.pb.set_message(format!("{} for movie {}", kind, movie_id));
            }
            PipelineEvent::ManualIdChecked { file_name, .. } => self.pb.set_message(file_name.clone()),
            _ => {}
        }
        self.pb.suspend(|| TracingSink.emit(event));
    }
}

/// Print a run summary the way every command does.
pub(crate) fn print_summary(summary: &RunSummary) {
    println!();
    println!("{}", format!("📊 Summary ({})", summary.pipeline).bold().green());
    println!("  {} {}", "Processed:".bold(), summary.processed);
    println!("  {} {}", "Found:".bold(), summary.found);
    if summary.new_entities > 0 {
        println!("  {} {}", "New entities:".bold(), summary.new_entities);
    }
    println!("  {} {}", "Skipped:".bold(), summary.skipped);
    println!("  {} {}", "Errors:".bold(), summary.errored());

    if !summary.errors.is_empty() {
        println!();
        println!("{}", "❌ Errors:".bold().red());
        for error in &summary.errors {
            println!("  {}", error);
        }
    }
}
