//! Movie and detail models.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Canonical movie record keyed by the TMDB id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieIdentity {
    /// TMDB ID.
    pub external_id: u64,
    /// Localized title.
    pub title: String,
    /// Original title.
    pub original_title: String,
    /// Release year.
    pub release_year: Option<i32>,
}

impl MovieIdentity {
    /// Human readable label used in logs and error messages.
    pub fn label(&self) -> String {
        match self.release_year {
            Some(year) => format!("{} ({}) [{}]", self.title, year, self.external_id),
            None => format!("{} [{}]", self.title, self.external_id),
        }
    }
}

impl From<SearchResult> for MovieIdentity {
    fn from(result: SearchResult) -> Self {
        Self {
            external_id: result.external_id,
            title: result.title,
            original_title: result.original_title,
            release_year: result.release_year,
        }
    }
}

/// Movie returned by a remote search or movie-info call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub external_id: u64,
    pub title: String,
    pub original_title: String,
    pub release_year: Option<i32>,
}

impl SearchResult {
    pub fn label(&self) -> String {
        match self.release_year {
            Some(year) => format!("{} ({}) [{}]", self.title, year, self.external_id),
            None => format!("{} [{}]", self.title, self.external_id),
        }
    }
}

/// Genre, cast member, director or keyword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailEntity {
    /// TMDB ID (unique per detail kind).
    pub external_id: u64,
    pub name: String,
}

/// One item of a remote detail call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailResult {
    pub external_id: u64,
    pub name: String,
}

/// Detail kinds the enrichment pipeline knows how to populate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DetailKind {
    Genres,
    Cast,
    Directors,
    Keywords,
    ImdbId,
}

impl DetailKind {
    /// All kinds, in enrichment order.
    pub const ALL: [DetailKind; 5] = [
        DetailKind::Genres,
        DetailKind::Cast,
        DetailKind::Directors,
        DetailKind::Keywords,
        DetailKind::ImdbId,
    ];

    /// Kinds backed by shared detail entities.
    pub const ENTITY_KINDS: [DetailKind; 4] = [
        DetailKind::Genres,
        DetailKind::Cast,
        DetailKind::Directors,
        DetailKind::Keywords,
    ];

    pub fn is_entity_kind(self) -> bool {
        self != DetailKind::ImdbId
    }
}

impl std::fmt::Display for DetailKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DetailKind::Genres => write!(f, "genres"),
            DetailKind::Cast => write!(f, "cast"),
            DetailKind::Directors => write!(f, "directors"),
            DetailKind::Keywords => write!(f, "keywords"),
            DetailKind::ImdbId => write!(f, "imdb-id"),
        }
    }
}

impl std::str::FromStr for DetailKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "genres" | "genre" => Ok(DetailKind::Genres),
            "cast" | "actors" => Ok(DetailKind::Cast),
            "directors" | "director" => Ok(DetailKind::Directors),
            "keywords" | "keyword" => Ok(DetailKind::Keywords),
            "imdb-id" | "imdb_id" | "imdb" => Ok(DetailKind::ImdbId),
            other => Err(crate::Error::other(format!("Unknown detail kind: {}", other))),
        }
    }
}

/// Details attached to a movie.
///
/// `None` means the kind has never been fetched; `Some(vec![])` means it was
/// fetched and the service had nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MovieDetails {
    pub genres: Option<Vec<Arc<DetailEntity>>>,
    pub cast: Option<Vec<Arc<DetailEntity>>>,
    pub directors: Option<Vec<Arc<DetailEntity>>>,
    pub keywords: Option<Vec<Arc<DetailEntity>>>,
    pub imdb_id: Option<String>,
    /// Set once the IMDb id was looked up, even if the service had none.
    pub imdb_checked: bool,
}

impl MovieDetails {
    /// Entities of a list kind. Always `None` for [`DetailKind::ImdbId`].
    pub fn entities(&self, kind: DetailKind) -> Option<&Vec<Arc<DetailEntity>>> {
        match kind {
            DetailKind::Genres => self.genres.as_ref(),
            DetailKind::Cast => self.cast.as_ref(),
            DetailKind::Directors => self.directors.as_ref(),
            DetailKind::Keywords => self.keywords.as_ref(),
            DetailKind::ImdbId => None,
        }
    }

    pub fn entities_mut(&mut self, kind: DetailKind) -> Option<&mut Option<Vec<Arc<DetailEntity>>>> {
        match kind {
            DetailKind::Genres => Some(&mut self.genres),
            DetailKind::Cast => Some(&mut self.cast),
            DetailKind::Directors => Some(&mut self.directors),
            DetailKind::Keywords => Some(&mut self.keywords),
            DetailKind::ImdbId => None,
        }
    }

    /// Whether this kind still needs fetching.
    pub fn is_missing(&self, kind: DetailKind) -> bool {
        match kind {
            DetailKind::ImdbId => self.imdb_id.is_none() && !self.imdb_checked,
            _ => self.entities(kind).is_none(),
        }
    }
}
