//! Import command implementation.
//!
//! Reads a list of rip filenames, parses them and adds the new ones to the
//! catalog.

use super::open_catalog;
use crate::core::parser;
use crate::models::config::Config;
use crate::store::EntityStore;
use crate::utils::fs::read_filename_list;
use crate::Result;
use colored::Colorize;
use std::path::Path;

/// Counts reported by [`import_list`].
#[derive(Debug, Default, PartialEq)]
pub struct ImportReport {
    pub added: usize,
    pub duplicates: usize,
    pub failed: Vec<String>,
}

/// Parse `filenames` and add the new rips to `store`, committing once.
pub fn import_list(store: &mut dyn EntityStore, filenames: &[String]) -> Result<ImportReport> {
    let mut report = ImportReport::default();

    for (filename, result) in parser::parse_filenames(filenames) {
        if store.find_rip(&filename)?.is_some() {
            report.duplicates += 1;
            continue;
        }
        match result {
            Ok(rip) => {
                store.add_rip(rip)?;
                report.added += 1;
            }
            Err(e) => {
                tracing::warn!("{}", e);
                report.failed.push(format!("{}: {}", filename, e));
            }
        }
    }

    store.complete()?;
    Ok(report)
}

/// Import a filename list into the configured catalog.
pub fn import(config: &Config, list_file: &Path) -> Result<()> {
    println!("{}", "📥 Importing rips...".bold().cyan());

    let filenames = read_filename_list(list_file)?;
    println!("Read {} filenames from {}", filenames.len(), list_file.display());

    let mut store = open_catalog(config)?;
    let report = import_list(&mut store, &filenames)?;

    println!();
    println!("{}", "📊 Import Summary".bold().green());
    println!("  {} {}", "Added:".bold(), report.added);
    println!("  {} {}", "Duplicates:".bold(), report.duplicates);
    println!("  {} {}", "Failed:".bold(), report.failed.len());

    if !report.failed.is_empty() {
        println!();
        println!("{}", "❌ Unparseable filenames:".bold().red());
        for failure in &report.failed {
            println!("  {}", failure);
        }
    }

    Ok(())
}
