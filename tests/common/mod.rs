//! Fakes shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use rip_catalog::core::events::{EventSink, PipelineEvent};
use rip_catalog::core::policy::RateLimitedRetryPolicy;
use rip_catalog::models::config::{RateLimitSettings, RetrySettings};
use rip_catalog::models::{
    DetailEntity, DetailKind, DetailResult, MovieDetails, MovieIdentity, RipDescriptor, SearchResult,
};
use rip_catalog::services::MetadataApi;
use rip_catalog::store::{CatalogStore, EntityStore};
use rip_catalog::{Error, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn search_result(id: u64, title: &str, year: Option<i32>) -> SearchResult {
    SearchResult {
        external_id: id,
        title: title.to_string(),
        original_title: title.to_string(),
        release_year: year,
    }
}

pub fn movie(id: u64, title: &str, year: Option<i32>) -> Arc<MovieIdentity> {
    Arc::new(MovieIdentity::from(search_result(id, title, year)))
}

pub fn detail(id: u64, name: &str) -> DetailResult {
    DetailResult {
        external_id: id,
        name: name.to_string(),
    }
}

/// Policy that never limits and never retries.
pub fn fast_policy() -> RateLimitedRetryPolicy {
    RateLimitedRetryPolicy::new(
        RateLimitSettings {
            executions_per_window: 1000,
            window: Duration::from_millis(1),
            max_burst: None,
        },
        RetrySettings {
            retry_count: 0,
            sleep_between_retries: Duration::from_millis(1),
        },
    )
    .unwrap()
}

/// In-memory metadata service with a log of every call.
#[derive(Default)]
pub struct FakeApi {
    /// Search results keyed by lowercase query and year.
    pub searches: HashMap<(String, Option<i32>), Vec<SearchResult>>,
    /// Movies known by id.
    pub movies: HashMap<u64, SearchResult>,
    /// Detail lists keyed by kind and movie id; missing entries are 404s.
    pub details: HashMap<(DetailKind, u64), Vec<DetailResult>>,
    pub imdb_ids: HashMap<u64, String>,
    /// Movie ids whose detail fetch fails with a non-recoverable error.
    pub broken: Vec<u64>,
    /// Every search fails with a non-recoverable error.
    pub fail_searches: bool,
    /// Lowercase titles whose searches are throttled by the service.
    pub throttled_titles: Vec<String>,
    /// Movie ids whose lookups are throttled by the service.
    pub throttled_ids: Vec<u64>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, title: &str, year: Option<i32>, results: Vec<SearchResult>) -> Self {
        self.searches.insert((title.to_lowercase(), year), results);
        self
    }

    pub fn with_movie(mut self, result: SearchResult) -> Self {
        self.movies.insert(result.external_id, result);
        self
    }

    pub fn with_details(mut self, kind: DetailKind, movie_id: u64, results: Vec<DetailResult>) -> Self {
        self.details.insert((kind, movie_id), results);
        self
    }

    pub fn throttle_title(mut self, title: &str) -> Self {
        self.throttled_titles.push(title.to_lowercase());
        self
    }

    pub fn throttle_id(mut self, id: u64) -> Self {
        self.throttled_ids.push(id);
        self
    }

    pub fn call_log(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn fetch_details(&self, kind: DetailKind, id: u64) -> Result<Vec<DetailResult>> {
        self.record(format!("{} {}", kind, id));
        if self.throttled_ids.contains(&id) {
            return Err(Error::Throttled);
        }
        if self.broken.contains(&id) {
            return Err(Error::Api {
                status: 500,
                message: "boom".into(),
            });
        }
        self.details
            .get(&(kind, id))
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("movie/{}", id)))
    }
}

#[async_trait]
impl MetadataApi for FakeApi {
    async fn search_movie(&self, title: &str, year: Option<i32>) -> Result<Vec<SearchResult>> {
        self.record(format!("search {} {:?}", title, year));
        if self.fail_searches {
            return Err(Error::Api {
                status: 401,
                message: "invalid api key".into(),
            });
        }
        if self.throttled_titles.contains(&title.to_lowercase()) {
            return Err(Error::Throttled);
        }
        Ok(self
            .searches
            .get(&(title.to_lowercase(), year))
            .cloned()
            .unwrap_or_default())
    }

    async fn get_movie_info(&self, external_id: u64) -> Result<SearchResult> {
        self.record(format!("info {}", external_id));
        if self.throttled_ids.contains(&external_id) {
            return Err(Error::Throttled);
        }
        self.movies
            .get(&external_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("movie/{}", external_id)))
    }

    async fn external_id_exists(&self, external_id: u64) -> Result<bool> {
        self.record(format!("exists {}", external_id));
        Ok(self.movies.contains_key(&external_id))
    }

    async fn get_movie_genres(&self, external_id: u64) -> Result<Vec<DetailResult>> {
        self.fetch_details(DetailKind::Genres, external_id)
    }

    async fn get_movie_cast(&self, external_id: u64) -> Result<Vec<DetailResult>> {
        self.fetch_details(DetailKind::Cast, external_id)
    }

    async fn get_movie_directors(&self, external_id: u64) -> Result<Vec<DetailResult>> {
        self.fetch_details(DetailKind::Directors, external_id)
    }

    async fn get_movie_keywords(&self, external_id: u64) -> Result<Vec<DetailResult>> {
        self.fetch_details(DetailKind::Keywords, external_id)
    }

    async fn get_movie_imdb_id(&self, external_id: u64) -> Result<Option<String>> {
        self.record(format!("imdb-id {}", external_id));
        Ok(self.imdb_ids.get(&external_id).cloned())
    }

    fn base_address(&self) -> &str {
        "fake://tmdb"
    }
}

/// Collects every event it receives.
#[derive(Default)]
pub struct RecordingSink {
    pub events: Mutex<Vec<PipelineEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: &PipelineEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// Catalog store whose detail assignment always fails.
pub struct FailingAssignStore {
    pub inner: CatalogStore,
}

impl EntityStore for FailingAssignStore {
    fn rips(&self) -> Result<Vec<RipDescriptor>> {
        self.inner.rips()
    }

    fn find_rip(&self, file_name: &str) -> Result<Option<RipDescriptor>> {
        self.inner.find_rip(file_name)
    }

    fn add_rip(&mut self, rip: RipDescriptor) -> Result<()> {
        self.inner.add_rip(rip)
    }

    fn link_rip(&mut self, file_name: &str, movie: Arc<MovieIdentity>) -> Result<()> {
        self.inner.link_rip(file_name, movie)
    }

    fn movies(&self) -> Result<Vec<Arc<MovieIdentity>>> {
        self.inner.movies()
    }

    fn find_movie(&self, external_id: u64) -> Result<Option<Arc<MovieIdentity>>> {
        self.inner.find_movie(external_id)
    }

    fn add_movie(&mut self, movie: Arc<MovieIdentity>) -> Result<()> {
        self.inner.add_movie(movie)
    }

    fn movie_details(&self, external_id: u64) -> Result<Option<MovieDetails>> {
        self.inner.movie_details(external_id)
    }

    fn movies_without(&self, kind: DetailKind) -> Result<Vec<Arc<MovieIdentity>>> {
        self.inner.movies_without(kind)
    }

    fn detail_entities(&self, kind: DetailKind) -> Result<Vec<Arc<DetailEntity>>> {
        self.inner.detail_entities(kind)
    }

    fn add_detail_entities(&mut self, kind: DetailKind, entities: Vec<Arc<DetailEntity>>) -> Result<()> {
        self.inner.add_detail_entities(kind, entities)
    }

    fn assign_details(&mut self, movie_id: u64, _kind: DetailKind, _entities: Vec<Arc<DetailEntity>>) -> Result<()> {
        Err(Error::Store(format!("cannot assign details to {}", movie_id)))
    }

    fn set_imdb_id(&mut self, movie_id: u64, imdb_id: Option<String>) -> Result<()> {
        self.inner.set_imdb_id(movie_id, imdb_id)
    }

    fn complete(&mut self) -> Result<()> {
        self.inner.complete()
    }
}
