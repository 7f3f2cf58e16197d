//! Entity storage used by the pipelines.
//!
//! Pipelines only read from the store while they work and write everything
//! at the end of a run, immediately followed by a single [`EntityStore::complete`].

pub mod catalog;

pub use catalog::CatalogStore;

use crate::models::{DetailEntity, DetailKind, MovieDetails, MovieIdentity, RipDescriptor};
use crate::Result;
use std::sync::Arc;

/// Storage for rips, movies and detail entities.
pub trait EntityStore {
    /// All rips, ordered by filename.
    fn rips(&self) -> Result<Vec<RipDescriptor>>;

    fn find_rip(&self, file_name: &str) -> Result<Option<RipDescriptor>>;

    /// Add a new rip; its filename must not be known yet.
    fn add_rip(&mut self, rip: RipDescriptor) -> Result<()>;

    /// Point a rip at a movie, replacing any previous link.
    fn link_rip(&mut self, file_name: &str, movie: Arc<MovieIdentity>) -> Result<()>;

    fn movies(&self) -> Result<Vec<Arc<MovieIdentity>>>;

    fn find_movies(&self, predicate: &dyn Fn(&MovieIdentity) -> bool) -> Result<Vec<Arc<MovieIdentity>>> {
        Ok(self.movies()?.into_iter().filter(|m| predicate(m.as_ref())).collect())
    }

    fn find_movie(&self, external_id: u64) -> Result<Option<Arc<MovieIdentity>>>;

    /// Add a new movie; its external id must not be known yet.
    fn add_movie(&mut self, movie: Arc<MovieIdentity>) -> Result<()>;

    fn add_movies(&mut self, movies: Vec<Arc<MovieIdentity>>) -> Result<()> {
        for movie in movies {
            self.add_movie(movie)?;
        }
        Ok(())
    }

    fn movie_details(&self, external_id: u64) -> Result<Option<MovieDetails>>;

    /// Movies for which `kind` has never been populated.
    fn movies_without(&self, kind: DetailKind) -> Result<Vec<Arc<MovieIdentity>>>;

    /// Every known entity of a list kind.
    fn detail_entities(&self, kind: DetailKind) -> Result<Vec<Arc<DetailEntity>>>;

    fn add_detail_entities(&mut self, kind: DetailKind, entities: Vec<Arc<DetailEntity>>) -> Result<()>;

    /// Replace a movie's entities of a list kind.
    fn assign_details(
        &mut self,
        movie_id: u64,
        kind: DetailKind,
        entities: Vec<Arc<DetailEntity>>,
    ) -> Result<()>;

    /// Record the IMDb id lookup. `None` marks a movie the service has no id for.
    fn set_imdb_id(&mut self, movie_id: u64, imdb_id: Option<String>) -> Result<()>;

    /// Commit everything staged so far.
    fn complete(&mut self) -> Result<()>;
}
