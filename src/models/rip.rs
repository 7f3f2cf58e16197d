//! Rip descriptor model.

use super::movie::MovieIdentity;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Structured fields extracted from a rip's filename.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RipDescriptor {
    /// Raw filename, unique within the catalog.
    pub file_name: String,
    /// Cleaned, case-folded title.
    pub parsed_title: String,
    /// Release year as found in the filename (usually 4 digits).
    pub parsed_release_date: Option<String>,
    /// Resolution marker (e.g., "1080p").
    pub parsed_quality: Option<String>,
    /// Source, codec and audio info (e.g., "BluRay x264 AC3").
    pub parsed_release_info: Option<String>,
    /// Release group (e.g., "JYK").
    pub parsed_group: Option<String>,
    /// Movie this rip has been linked to.
    #[serde(skip)]
    pub movie: Option<Arc<MovieIdentity>>,
}

impl RipDescriptor {
    /// Create an unlinked descriptor with only a filename and title.
    pub fn new(file_name: impl Into<String>, parsed_title: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            parsed_title: parsed_title.into(),
            ..Default::default()
        }
    }

    /// Builder-style setter for the release date.
    pub fn with_release_date(mut self, date: impl Into<String>) -> Self {
        self.parsed_release_date = Some(date.into());
        self
    }

    /// Parsed release year, if it is a plausible movie year.
    ///
    /// The first commercial film is from 1888, so anything earlier (or
    /// beyond 2100) is treated as noise in the filename.
    pub fn release_year(&self) -> Option<i32> {
        self.parsed_release_date
            .as_deref()
            .and_then(|d| d.trim().parse::<i32>().ok())
            .filter(|y| (1888..=2100).contains(y))
    }

    /// External id of the linked movie.
    pub fn movie_id(&self) -> Option<u64> {
        self.movie.as_ref().map(|m| m.external_id)
    }

    /// Whether this rip is linked to a movie.
    pub fn is_linked(&self) -> bool {
        self.movie.is_some()
    }
}
