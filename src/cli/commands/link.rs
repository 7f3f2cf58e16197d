//! Link, link-manual and validate-manual commands.

use super::{open_catalog, print_summary, remote, ProgressSink};
use crate::core::resolver::{IdentityResolver, ResolveOptions};
use crate::core::PipelineContext;
use crate::core::policy::RateLimitedRetryPolicy;
use crate::models::config::Config;
use crate::services::tmdb::TmdbClient;
use crate::services::{MetadataApi, OfflineApi};
use crate::Result;
use colored::Colorize;

/// Link unlinked rips to movies.
pub async fn link(config: &Config, options: ResolveOptions) -> Result<()> {
    println!("{}", "🔗 Linking rips to movies...".bold().cyan());

    let mut store = open_catalog(config)?;
    // Local-only runs work without a TMDB key.
    let client: Box<dyn MetadataApi> = if options.local_only {
        Box::new(OfflineApi)
    } else {
        Box::new(TmdbClient::new(&config.tmdb)?)
    };
    let policy = RateLimitedRetryPolicy::from_settings(config)?;
    let sink = ProgressSink::new();

    let result = IdentityResolver::new(
        &mut store,
        config,
        PipelineContext::new(client.as_ref(), &policy, &sink),
    )
    .resolve_identities(options)
    .await;
    sink.finish();

    print_summary(&result?);
    Ok(())
}

/// Link rips from the manual override table.
pub async fn link_manual(config: &Config, max_calls: Option<usize>) -> Result<()> {
    println!("{}", "🔗 Applying manual links...".bold().cyan());

    let mut store = open_catalog(config)?;
    let (client, policy) = remote(config)?;
    let sink = ProgressSink::new();

    let result = IdentityResolver::new(&mut store, config, PipelineContext::new(&client, &policy, &sink))
        .link_manual_overrides(max_calls)
        .await;
    sink.finish();

    print_summary(&result?);
    Ok(())
}

/// Check the manual override table against TMDB.
pub async fn validate_manual(config: &Config) -> Result<()> {
    println!("{}", "🔍 Validating manual ids...".bold().cyan());

    let mut store = open_catalog(config)?;
    let (client, policy) = remote(config)?;
    let sink = ProgressSink::new();

    let result = IdentityResolver::new(&mut store, config, PipelineContext::new(&client, &policy, &sink))
        .validate_manual_ids()
        .await;
    sink.finish();

    let summary = result?;
    print_summary(&summary);
    if summary.errored() == 0 {
        println!();
        println!("{}", "✅ All manual ids exist".green());
    }
    Ok(())
}
