//! JSON catalog file.
//!
//! The whole catalog lives in memory; [`CatalogStore::complete`] writes it
//! back in one go. Shared movies and detail entities are stored once and
//! referenced by id in the file, then rebuilt as shared `Arc`s on load.

use super::EntityStore;
use crate::models::{DetailEntity, DetailKind, MovieDetails, MovieIdentity, RipDescriptor};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const CATALOG_VERSION: &str = "1.0";

/// On-disk catalog layout.
#[derive(Debug, Default, Serialize, Deserialize)]
struct CatalogFile {
    version: String,
    #[serde(default)]
    rips: Vec<RipRecord>,
    #[serde(default)]
    movies: Vec<MovieRecord>,
    #[serde(default)]
    genres: Vec<DetailEntity>,
    #[serde(default)]
    cast: Vec<DetailEntity>,
    #[serde(default)]
    directors: Vec<DetailEntity>,
    #[serde(default)]
    keywords: Vec<DetailEntity>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RipRecord {
    #[serde(flatten)]
    rip: RipDescriptor,
    movie_id: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct MovieRecord {
    #[serde(flatten)]
    movie: MovieIdentity,
    genre_ids: Option<Vec<u64>>,
    cast_ids: Option<Vec<u64>>,
    director_ids: Option<Vec<u64>>,
    keyword_ids: Option<Vec<u64>>,
    imdb_id: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    imdb_checked: bool,
}

/// Movie held by the store together with its details.
#[derive(Debug, Clone)]
struct StoredMovie {
    identity: Arc<MovieIdentity>,
    details: MovieDetails,
}

/// Catalog store backed by a JSON file.
#[derive(Debug, Default)]
pub struct CatalogStore {
    path: Option<PathBuf>,
    rips: BTreeMap<String, RipDescriptor>,
    movies: BTreeMap<u64, StoredMovie>,
    details: BTreeMap<DetailKind, BTreeMap<u64, Arc<DetailEntity>>>,
    commits: usize,
}

impl CatalogStore {
    /// Store with no backing file.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open a catalog file; a missing file is an empty catalog.
    pub fn open(path: &Path) -> Result<Self> {
        let mut store = if path.exists() {
            let content = fs::read_to_string(path)?;
            let file: CatalogFile = serde_json::from_str(&content)?;
            Self::from_file(file)?
        } else {
            tracing::debug!("Catalog {} does not exist yet", path.display());
            Self::default()
        };
        store.path = Some(path.to_path_buf());
        Ok(store)
    }

    /// Number of successful [`EntityStore::complete`] calls.
    pub fn commit_count(&self) -> usize {
        self.commits
    }

    pub fn rip_count(&self) -> usize {
        self.rips.len()
    }

    pub fn movie_count(&self) -> usize {
        self.movies.len()
    }

    fn from_file(file: CatalogFile) -> Result<Self> {
        let mut store = Self::default();

        for (kind, entities) in [
            (DetailKind::Genres, file.genres),
            (DetailKind::Cast, file.cast),
            (DetailKind::Directors, file.directors),
            (DetailKind::Keywords, file.keywords),
        ] {
            let map = store.details.entry(kind).or_default();
            for entity in entities {
                map.insert(entity.external_id, Arc::new(entity));
            }
        }

        for record in file.movies {
            let details = MovieDetails {
                genres: store.resolve_ids(DetailKind::Genres, record.genre_ids)?,
                cast: store.resolve_ids(DetailKind::Cast, record.cast_ids)?,
                directors: store.resolve_ids(DetailKind::Directors, record.director_ids)?,
                keywords: store.resolve_ids(DetailKind::Keywords, record.keyword_ids)?,
                imdb_checked: record.imdb_checked || record.imdb_id.is_some(),
                imdb_id: record.imdb_id,
            };
            store.movies.insert(
                record.movie.external_id,
                StoredMovie {
                    identity: Arc::new(record.movie),
                    details,
                },
            );
        }

        for record in file.rips {
            let mut rip = record.rip;
            if let Some(id) = record.movie_id {
                let movie = store.movies.get(&id).ok_or_else(|| {
                    Error::Store(format!("rip {} links to unknown movie {}", rip.file_name, id))
                })?;
                rip.movie = Some(movie.identity.clone());
            }
            store.rips.insert(rip.file_name.clone(), rip);
        }

        Ok(store)
    }

    fn resolve_ids(
        &self,
        kind: DetailKind,
        ids: Option<Vec<u64>>,
    ) -> Result<Option<Vec<Arc<DetailEntity>>>> {
        let Some(ids) = ids else {
            return Ok(None);
        };
        let known = self.details.get(&kind);
        ids.into_iter()
            .map(|id| {
                known
                    .and_then(|m| m.get(&id))
                    .cloned()
                    .ok_or_else(|| Error::Store(format!("unknown {} id {}", kind, id)))
            })
            .collect::<Result<Vec<_>>>()
            .map(Some)
    }

    fn to_file(&self) -> CatalogFile {
        let ids = |list: &Option<Vec<Arc<DetailEntity>>>| {
            list.as_ref()
                .map(|l| l.iter().map(|e| e.external_id).collect::<Vec<_>>())
        };
        let entities = |kind: DetailKind| {
            self.details
                .get(&kind)
                .map(|m| m.values().map(|e| (**e).clone()).collect::<Vec<_>>())
                .unwrap_or_default()
        };

        CatalogFile {
            version: CATALOG_VERSION.to_string(),
            rips: self
                .rips
                .values()
                .map(|rip| RipRecord {
                    movie_id: rip.movie_id(),
                    rip: rip.clone(),
                })
                .collect(),
            movies: self
                .movies
                .values()
                .map(|m| MovieRecord {
                    movie: (*m.identity).clone(),
                    genre_ids: ids(&m.details.genres),
                    cast_ids: ids(&m.details.cast),
                    director_ids: ids(&m.details.directors),
                    keyword_ids: ids(&m.details.keywords),
                    imdb_id: m.details.imdb_id.clone(),
                    imdb_checked: m.details.imdb_checked,
                })
                .collect(),
            genres: entities(DetailKind::Genres),
            cast: entities(DetailKind::Cast),
            directors: entities(DetailKind::Directors),
            keywords: entities(DetailKind::Keywords),
        }
    }

    fn movie_mut(&mut self, movie_id: u64) -> Result<&mut StoredMovie> {
        self.movies
            .get_mut(&movie_id)
            .ok_or_else(|| Error::Store(format!("unknown movie {}", movie_id)))
    }

    fn require_entity_kind(kind: DetailKind) -> Result<()> {
        if kind.is_entity_kind() {
            Ok(())
        } else {
            Err(Error::Store(format!("{} has no detail entities", kind)))
        }
    }
}

impl EntityStore for CatalogStore {
    fn rips(&self) -> Result<Vec<RipDescriptor>> {
        Ok(self.rips.values().cloned().collect())
    }

    fn find_rip(&self, file_name: &str) -> Result<Option<RipDescriptor>> {
        Ok(self.rips.get(file_name).cloned())
    }

    fn add_rip(&mut self, rip: RipDescriptor) -> Result<()> {
        if self.rips.contains_key(&rip.file_name) {
            return Err(Error::Store(format!("duplicate rip {}", rip.file_name)));
        }
        self.rips.insert(rip.file_name.clone(), rip);
        Ok(())
    }

    fn link_rip(&mut self, file_name: &str, movie: Arc<MovieIdentity>) -> Result<()> {
        // One instance per id: a movie the store already holds wins.
        let movie = self
            .movies
            .entry(movie.external_id)
            .or_insert_with(|| StoredMovie {
                identity: movie,
                details: MovieDetails::default(),
            })
            .identity
            .clone();

        let rip = self
            .rips
            .get_mut(file_name)
            .ok_or_else(|| Error::Store(format!("unknown rip {}", file_name)))?;
        rip.movie = Some(movie);
        Ok(())
    }

    fn movies(&self) -> Result<Vec<Arc<MovieIdentity>>> {
        Ok(self.movies.values().map(|m| m.identity.clone()).collect())
    }

    fn find_movie(&self, external_id: u64) -> Result<Option<Arc<MovieIdentity>>> {
        Ok(self.movies.get(&external_id).map(|m| m.identity.clone()))
    }

    fn add_movie(&mut self, movie: Arc<MovieIdentity>) -> Result<()> {
        if self.movies.contains_key(&movie.external_id) {
            return Err(Error::Store(format!("duplicate movie {}", movie.external_id)));
        }
        self.movies.insert(
            movie.external_id,
            StoredMovie {
                identity: movie,
                details: MovieDetails::default(),
            },
        );
        Ok(())
    }

    fn movie_details(&self, external_id: u64) -> Result<Option<MovieDetails>> {
        Ok(self.movies.get(&external_id).map(|m| m.details.clone()))
    }

    fn movies_without(&self, kind: DetailKind) -> Result<Vec<Arc<MovieIdentity>>> {
        Ok(self
            .movies
            .values()
            .filter(|m| m.details.is_missing(kind))
            .map(|m| m.identity.clone())
            .collect())
    }

    fn detail_entities(&self, kind: DetailKind) -> Result<Vec<Arc<DetailEntity>>> {
        Self::require_entity_kind(kind)?;
        Ok(self
            .details
            .get(&kind)
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default())
    }

    fn add_detail_entities(&mut self, kind: DetailKind, entities: Vec<Arc<DetailEntity>>) -> Result<()> {
        Self::require_entity_kind(kind)?;
        let map = self.details.entry(kind).or_default();
        for entity in entities {
            if map.contains_key(&entity.external_id) {
                return Err(Error::Store(format!("duplicate {} {}", kind, entity.external_id)));
            }
            map.insert(entity.external_id, entity);
        }
        Ok(())
    }

    fn assign_details(
        &mut self,
        movie_id: u64,
        kind: DetailKind,
        entities: Vec<Arc<DetailEntity>>,
    ) -> Result<()> {
        Self::require_entity_kind(kind)?;

        // Keep the catalog closed over ids: unknown entities are adopted.
        let map = self.details.entry(kind).or_default();
        let entities: Vec<_> = entities
            .into_iter()
            .map(|e| map.entry(e.external_id).or_insert(e).clone())
            .collect();

        let movie = self.movie_mut(movie_id)?;
        if let Some(slot) = movie.details.entities_mut(kind) {
            *slot = Some(entities);
        }
        Ok(())
    }

    fn set_imdb_id(&mut self, movie_id: u64, imdb_id: Option<String>) -> Result<()> {
        let details = &mut self.movie_mut(movie_id)?.details;
        details.imdb_id = imdb_id;
        details.imdb_checked = true;
        Ok(())
    }

    fn complete(&mut self) -> Result<()> {
        if let Some(path) = &self.path {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }

            // Backup existing file
            if path.exists() {
                let backup_path = path.with_extension("json.backup");
                fs::copy(path, &backup_path)?;
            }

            let content = serde_json::to_string_pretty(&self.to_file())?;
            fs::write(path, content)?;
            tracing::info!("Catalog saved to: {}", path.display());
        }

        self.commits += 1;
        Ok(())
    }
}
