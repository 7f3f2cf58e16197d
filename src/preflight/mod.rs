//! Preflight checks module.
//!
//! `rip-catalog check` runs these before a long linking or enrichment run so
//! that a bad key or a corrupt catalog shows up before the warm-up delay.

mod catalog;
mod tmdb;

use crate::models::config::Config;
use colored::Colorize;

/// Result of a preflight check.
#[derive(Debug)]
pub struct CheckResult {
    pub name: &'static str,
    pub success: bool,
    pub message: String,
    pub hint: Option<&'static str>,
}

impl CheckResult {
    pub fn ok(name: &'static str, message: impl Into<String>) -> Self {
        Self {
            name,
            success: true,
            message: message.into(),
            hint: None,
        }
    }

    pub fn fail(name: &'static str, message: impl Into<String>, hint: &'static str) -> Self {
        Self {
            name,
            success: false,
            message: message.into(),
            hint: Some(hint),
        }
    }
}

/// Run every check against the loaded configuration, local ones first.
pub async fn run_preflight_checks(config: &Config) -> Vec<CheckResult> {
    vec![
        catalog::check_rate_limit(config),
        catalog::check_catalog(config),
        tmdb::check(config).await,
    ]
}

/// Print one line per check, with a hint under each failure.
pub fn print_results(results: &[CheckResult]) {
    let width = results.iter().map(|r| r.name.len()).max().unwrap_or(0);

    for result in results {
        let status = if result.success {
            "[OK]  ".green()
        } else {
            "[FAIL]".red()
        };
        println!(
            "{} {:<width$}  {}",
            status,
            result.name.bold(),
            result.message,
            width = width
        );
        if let Some(hint) = result.hint {
            println!("       {} {}", "->".yellow(), hint);
        }
    }
}

pub fn all_passed(results: &[CheckResult]) -> bool {
    results.iter().all(|r| r.success)
}
