//! TMDB preflight check.
//!
//! Only `link --local-only` works without this check passing.

use super::CheckResult;
use crate::models::config::Config;
use crate::services::tmdb::TmdbClient;
use crate::services::MetadataApi;

const NAME: &str = "TMDB API";

/// Verify that the configured key is accepted by the configured endpoint.
pub async fn check(config: &Config) -> CheckResult {
    let client = match TmdbClient::new(&config.tmdb) {
        Ok(client) => client,
        Err(e) => {
            return CheckResult::fail(
                NAME,
                e.to_string(),
                "Only `link --local-only` runs without a key",
            )
        }
    };

    match client.verify_api_key().await {
        Ok(true) => CheckResult::ok(
            NAME,
            format!(
                "{} accepted by {} ({})",
                client.auth_scheme(),
                client.base_address(),
                config.tmdb.language
            ),
        ),
        Ok(false) => CheckResult::fail(
            NAME,
            format!("{} rejected by {}", client.auth_scheme(), client.base_address()),
            "Check tmdb.api_key in config.toml or the TMDB_API_KEY environment variable",
        ),
        Err(e) => CheckResult::fail(
            NAME,
            format!("{} unreachable: {}", client.base_address(), e),
            "Check your network connection and tmdb.base_url",
        ),
    }
}
