//! Local preflight checks: rate limit settings and the catalog file.

use super::CheckResult;
use crate::core::policy::RateLimitedRetryPolicy;
use crate::models::config::Config;
use crate::store::CatalogStore;

/// Rate limit settings must build a valid token bucket.
pub fn check_rate_limit(config: &Config) -> CheckResult {
    match RateLimitedRetryPolicy::from_settings(config) {
        Ok(policy) => CheckResult::ok(
            "Rate limit",
            format!(
                "{} calls per {}ms",
                config.rate_limit.executions_per_window,
                policy.initial_warmup_delay().as_millis()
            ),
        ),
        Err(e) => CheckResult::fail("Rate limit", e.to_string(), "Fix the [rate_limit] section"),
    }
}

/// The catalog file must load (a missing file is fine).
pub fn check_catalog(config: &Config) -> CheckResult {
    let path = &config.catalog_path;
    match CatalogStore::open(path) {
        Ok(store) if path.exists() => CheckResult::ok(
            "Catalog",
            format!("{} ({} rips)", path.display(), store.rip_count()),
        ),
        Ok(_) => CheckResult::ok(
            "Catalog",
            format!("{} (will be created)", path.display()),
        ),
        Err(e) => CheckResult::fail(
            "Catalog",
            e.to_string(),
            "Restore the .backup file next to the catalog or set catalog_path",
        ),
    }
}
