//! Metadata service interface consumed by the pipelines.

use crate::models::{DetailResult, SearchResult};
use crate::{Error, Result};
use async_trait::async_trait;

/// Remote movie metadata service.
///
/// Implementations report an unknown id as [`crate::Error::NotFound`] and a
/// throttling response as [`crate::Error::Throttled`]; the pipelines rely on
/// both to decide between retrying, skipping an item and aborting.
#[async_trait]
pub trait MetadataApi: Send + Sync {
    /// Search movies by title, optionally restricted to a release year.
    async fn search_movie(&self, title: &str, year: Option<i32>) -> Result<Vec<SearchResult>>;

    /// Basic info for one movie.
    async fn get_movie_info(&self, external_id: u64) -> Result<SearchResult>;

    /// Whether the id refers to an existing movie.
    async fn external_id_exists(&self, external_id: u64) -> Result<bool>;

    async fn get_movie_genres(&self, external_id: u64) -> Result<Vec<DetailResult>>;

    async fn get_movie_cast(&self, external_id: u64) -> Result<Vec<DetailResult>>;

    async fn get_movie_directors(&self, external_id: u64) -> Result<Vec<DetailResult>>;

    async fn get_movie_keywords(&self, external_id: u64) -> Result<Vec<DetailResult>>;

    async fn get_movie_imdb_id(&self, external_id: u64) -> Result<Option<String>>;

    /// Root URL of the service, for logging.
    fn base_address(&self) -> &str;
}

/// Stand-in for runs that must not reach the network, such as
/// `link --local-only`. Every call fails with
/// [`Error::TmdbApiKeyMissing`], which aborts the run.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineApi;

#[async_trait]
impl MetadataApi for OfflineApi {
    async fn search_movie(&self, _title: &str, _year: Option<i32>) -> Result<Vec<SearchResult>> {
        Err(Error::TmdbApiKeyMissing)
    }

    async fn get_movie_info(&self, _external_id: u64) -> Result<SearchResult> {
        Err(Error::TmdbApiKeyMissing)
    }

    async fn external_id_exists(&self, _external_id: u64) -> Result<bool> {
        Err(Error::TmdbApiKeyMissing)
    }

    async fn get_movie_genres(&self, _external_id: u64) -> Result<Vec<DetailResult>> {
        Err(Error::TmdbApiKeyMissing)
    }

    async fn get_movie_cast(&self, _external_id: u64) -> Result<Vec<DetailResult>> {
        Err(Error::TmdbApiKeyMissing)
    }

    async fn get_movie_directors(&self, _external_id: u64) -> Result<Vec<DetailResult>> {
        Err(Error::TmdbApiKeyMissing)
    }

    async fn get_movie_keywords(&self, _external_id: u64) -> Result<Vec<DetailResult>> {
        Err(Error::TmdbApiKeyMissing)
    }

    async fn get_movie_imdb_id(&self, _external_id: u64) -> Result<Option<String>> {
        Err(Error::TmdbApiKeyMissing)
    }

    fn base_address(&self) -> &str {
        "offline"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_offline_api_refuses_calls() {
        let api = OfflineApi;
        assert!(matches!(api.search_movie("heat", Some(1995)).await, Err(Error::TmdbApiKeyMissing)));
        assert!(matches!(api.get_movie_info(949).await, Err(Error::TmdbApiKeyMissing)));
        assert!(!Error::TmdbApiKeyMissing.is_recoverable());
    }
}
