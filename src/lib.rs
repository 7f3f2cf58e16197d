//! Rip Catalog Library
//!
//! Parses movie rip filenames, links them to TMDB movies and enriches the
//! linked movies with genres, cast, directors, keywords and IMDb ids.

pub mod cli;
pub mod core;
pub mod error;
pub mod models;
pub mod preflight;
pub mod services;
pub mod store;
pub mod utils;

pub use error::{Error, Result};
