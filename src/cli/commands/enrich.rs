//! Enrich command implementation.

use super::{open_catalog, print_summary, remote, ProgressSink};
use crate::core::enrichment::enrich_details;
use crate::core::PipelineContext;
use crate::models::config::Config;
use crate::models::DetailKind;
use crate::Result;
use colored::Colorize;

/// Fetch `kind` for every movie in the catalog that lacks it.
pub async fn enrich(config: &Config, kind: DetailKind, max_calls: Option<usize>) -> Result<()> {
    println!("{}", format!("🎬 Fetching {}...", kind).bold().cyan());

    let mut store = open_catalog(config)?;
    let (client, policy) = remote(config)?;
    let sink = ProgressSink::new();

    let result = enrich_details(
        kind,
        &mut store,
        PipelineContext::new(&client, &policy, &sink),
        max_calls,
    )
    .await;
    sink.finish();

    print_summary(&result?);
    Ok(())
}
