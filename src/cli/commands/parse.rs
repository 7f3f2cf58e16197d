//! Parse command implementation.

use crate::core::parser;
use crate::Result;
use colored::Colorize;

/// Parse each filename and print the extracted fields.
pub fn parse(filenames: &[String]) -> Result<()> {
    for (filename, result) in parser::parse_filenames(filenames) {
        println!("{}", filename.bold());
        match result {
            Ok(rip) => {
                print_field("Title", Some(&rip.parsed_title));
                print_field("Year", rip.parsed_release_date.as_ref());
                print_field("Quality", rip.parsed_quality.as_ref());
                print_field("Release", rip.parsed_release_info.as_ref());
                print_field("Group", rip.parsed_group.as_ref());
            }
            Err(e) => println!("  {} {}", "✗".red(), e),
        }
        println!();
    }
    Ok(())
}

fn print_field(name: &str, value: Option<&String>) {
    match value {
        Some(value) => println!("  {:<8} {}", format!("{}:", name).cyan(), value),
        None => println!("  {:<8} {}", format!("{}:", name).cyan(), "-".dimmed()),
    }
}
