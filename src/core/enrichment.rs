//! Detail enrichment for linked movies.
//!
//! One generic runner handles every detail kind. A [`DetailSource`] says how
//! to find movies missing the detail, how to fetch it and how to store it;
//! the runner does the rest:
//!
//! 1. list movies missing the detail and truncate to `max_calls`
//! 2. fetch each movie's detail through the rate limited policy, staging
//!    entities that are neither in the catalog nor already staged
//! 3. add the staged entities, assign each movie its entities, commit once

use super::events::{PipelineEvent, RunSummary};
use super::PipelineContext;
use crate::models::{DetailEntity, DetailKind, DetailResult, MovieIdentity};
use crate::services::MetadataApi;
use crate::store::EntityStore;
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;
use std::sync::Arc;

/// How one detail kind is listed, fetched and stored.
#[async_trait]
pub trait DetailSource: Send + Sync {
    /// Identity of an entity, shared by its remote and stored forms.
    type Key: Eq + Hash + Clone + Display + Send + Sync;
    /// What the service returns.
    type Remote: Send;
    /// What the catalog keeps.
    type Entity: Send + Sync;

    fn kind(&self) -> DetailKind;

    fn list_missing(&self, store: &dyn EntityStore) -> Result<Vec<Arc<MovieIdentity>>> {
        store.movies_without(self.kind())
    }

    fn known_entities(&self, store: &dyn EntityStore) -> Result<Vec<Arc<Self::Entity>>>;

    async fn fetch_remote(&self, api: &dyn MetadataApi, movie_id: u64) -> Result<Vec<Self::Remote>>;

    fn key_of(&self, remote: &Self::Remote) -> Self::Key;

    fn entity_key(&self, entity: &Self::Entity) -> Self::Key;

    fn entity_name(&self, entity: &Self::Entity) -> String;

    fn to_entity(&self, remote: Self::Remote) -> Self::Entity;

    /// Stage entities the catalog has never seen.
    fn stage_new(&self, store: &mut dyn EntityStore, entities: Vec<Arc<Self::Entity>>) -> Result<()>;

    /// Attach entities to their movie.
    fn assign(&self, store: &mut dyn EntityStore, movie_id: u64, entities: Vec<Arc<Self::Entity>>) -> Result<()>;
}

/// Genres, cast, directors or keywords.
#[derive(Debug, Clone, Copy)]
pub struct EntityDetails {
    kind: DetailKind,
}

impl EntityDetails {
    pub fn new(kind: DetailKind) -> Result<Self> {
        if !kind.is_entity_kind() {
            return Err(Error::other(format!("{} is not an entity detail", kind)));
        }
        Ok(Self { kind })
    }
}

#[async_trait]
impl DetailSource for EntityDetails {
    type Key = u64;
    type Remote = DetailResult;
    type Entity = DetailEntity;

    fn kind(&self) -> DetailKind {
        self.kind
    }

    fn known_entities(&self, store: &dyn EntityStore) -> Result<Vec<Arc<DetailEntity>>> {
        store.detail_entities(self.kind)
    }

    async fn fetch_remote(&self, api: &dyn MetadataApi, movie_id: u64) -> Result<Vec<DetailResult>> {
        match self.kind {
            DetailKind::Genres => api.get_movie_genres(movie_id).await,
            DetailKind::Cast => api.get_movie_cast(movie_id).await,
            DetailKind::Directors => api.get_movie_directors(movie_id).await,
            DetailKind::Keywords => api.get_movie_keywords(movie_id).await,
            DetailKind::ImdbId => Err(Error::other("imdb ids are not entity details")),
        }
    }

    fn key_of(&self, remote: &DetailResult) -> u64 {
        remote.external_id
    }

    fn entity_key(&self, entity: &DetailEntity) -> u64 {
        entity.external_id
    }

    fn entity_name(&self, entity: &DetailEntity) -> String {
        entity.name.clone()
    }

    fn to_entity(&self, remote: DetailResult) -> DetailEntity {
        DetailEntity {
            external_id: remote.external_id,
            name: remote.name,
        }
    }

    fn stage_new(&self, store: &mut dyn EntityStore, entities: Vec<Arc<DetailEntity>>) -> Result<()> {
        store.add_detail_entities(self.kind, entities)
    }

    fn assign(&self, store: &mut dyn EntityStore, movie_id: u64, entities: Vec<Arc<DetailEntity>>) -> Result<()> {
        store.assign_details(movie_id, self.kind, entities)
    }
}

/// IMDb ids. A movie has at most one and there is no shared entity table.
/// A lookup that finds nothing is still recorded, so the movie is not
/// fetched again.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImdbIds;

#[async_trait]
impl DetailSource for ImdbIds {
    type Key = String;
    type Remote = String;
    type Entity = String;

    fn kind(&self) -> DetailKind {
        DetailKind::ImdbId
    }

    fn known_entities(&self, _store: &dyn EntityStore) -> Result<Vec<Arc<String>>> {
        Ok(Vec::new())
    }

    async fn fetch_remote(&self, api: &dyn MetadataApi, movie_id: u64) -> Result<Vec<String>> {
        Ok(api.get_movie_imdb_id(movie_id).await?.into_iter().collect())
    }

    fn key_of(&self, remote: &String) -> String {
        remote.clone()
    }

    fn entity_key(&self, entity: &String) -> String {
        entity.clone()
    }

    fn entity_name(&self, entity: &String) -> String {
        entity.clone()
    }

    fn to_entity(&self, remote: String) -> String {
        remote
    }

    fn stage_new(&self, _store: &mut dyn EntityStore, _entities: Vec<Arc<String>>) -> Result<()> {
        Ok(())
    }

    fn assign(&self, store: &mut dyn EntityStore, movie_id: u64, entities: Vec<Arc<String>>) -> Result<()> {
        store.set_imdb_id(movie_id, entities.first().map(|id| id.as_ref().clone()))
    }
}

/// Fill in one detail kind for every movie that lacks it.
///
/// Movies whose fetch fails with a recoverable error are reported and left
/// without the detail, so the next run picks them up again. Any other error
/// aborts the run before anything is committed.
pub async fn populate_details<S: DetailSource>(
    source: &S,
    store: &mut dyn EntityStore,
    ctx: PipelineContext<'_>,
    max_calls: Option<usize>,
) -> Result<RunSummary> {
    let kind = source.kind();
    let mut summary = RunSummary::new(format!("enrich {}", kind));

    let mut movies = source.list_missing(store)?;
    ctx.sink.emit(&PipelineEvent::RunStarted {
        pipeline: summary.pipeline.clone(),
        items: movies.len(),
    });

    if let Some(max_calls) = max_calls {
        if movies.len() > max_calls {
            ctx.sink.emit(&PipelineEvent::WorkListTruncated {
                pipeline: summary.pipeline.clone(),
                pending: movies.len(),
                max_calls,
            });
            movies.truncate(max_calls);
        }
    }

    if !movies.is_empty() {
        ctx.sink.emit(&PipelineEvent::WarmingUp {
            delay: ctx.policy.initial_warmup_delay(),
        });
        ctx.policy.warm_up().await;
    }

    let known: HashMap<S::Key, Arc<S::Entity>> = source
        .known_entities(store)?
        .into_iter()
        .map(|e| (source.entity_key(&e), e))
        .collect();

    let mut staged: Vec<Arc<S::Entity>> = Vec::new();
    let mut staged_by_key: HashMap<S::Key, Arc<S::Entity>> = HashMap::new();
    let mut fetched: Vec<(u64, Vec<S::Key>)> = Vec::new();

    for movie in &movies {
        summary.processed += 1;
        let movie_id = movie.external_id;

        match ctx.policy.run(|| source.fetch_remote(ctx.api, movie_id)).await {
            Ok(results) => {
                let mut keys: Vec<S::Key> = Vec::with_capacity(results.len());
                for remote in results {
                    let key = source.key_of(&remote);
                    if !known.contains_key(&key) && !staged_by_key.contains_key(&key) {
                        let entity = Arc::new(source.to_entity(remote));
                        ctx.sink.emit(&PipelineEvent::EntityDiscovered {
                            kind,
                            external_id: key.to_string(),
                            name: source.entity_name(&entity),
                        });
                        staged_by_key.insert(key.clone(), entity.clone());
                        staged.push(entity);
                    }
                    if !keys.contains(&key) {
                        keys.push(key);
                    }
                }
                summary.found += 1;
                fetched.push((movie_id, keys));
            }
            Err(e) if e.is_recoverable() => {
                summary.record_error(ctx.sink, &movie.label(), &e);
            }
            Err(e) => return Err(e),
        }
    }

    summary.new_entities = staged.len();
    source.stage_new(store, staged)?;

    for (movie_id, keys) in fetched {
        let entities: Vec<Arc<S::Entity>> = keys
            .iter()
            .filter_map(|k| known.get(k).or_else(|| staged_by_key.get(k)).cloned())
            .collect();
        ctx.sink.emit(&PipelineEvent::DetailsAssigned {
            movie_id,
            kind,
            count: entities.len(),
        });
        source.assign(store, movie_id, entities)?;
    }

    store.complete()?;

    ctx.sink.emit(&PipelineEvent::RunFinished {
        summary: summary.clone(),
    });
    Ok(summary)
}

/// Run [`populate_details`] with the source for `kind`.
pub async fn enrich_details(
    kind: DetailKind,
    store: &mut dyn EntityStore,
    ctx: PipelineContext<'_>,
    max_calls: Option<usize>,
) -> Result<RunSummary> {
    match kind {
        DetailKind::ImdbId => populate_details(&ImdbIds, store, ctx, max_calls).await,
        kind => populate_details(&EntityDetails::new(kind)?, store, ctx, max_calls).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_details_rejects_imdb() {
        assert!(EntityDetails::new(DetailKind::ImdbId).is_err());
        for kind in DetailKind::ENTITY_KINDS {
            assert_eq!(EntityDetails::new(kind).unwrap().kind(), kind);
        }
    }

    #[test]
    fn test_to_entity_keeps_key() {
        let source = EntityDetails::new(DetailKind::Cast).unwrap();
        let remote = DetailResult {
            external_id: 1892,
            name: "Matt Damon".into(),
        };
        let key = source.key_of(&remote);
        let entity = source.to_entity(remote);
        assert_eq!(source.entity_key(&entity), key);
        assert_eq!(source.entity_name(&entity), "Matt Damon");
    }
}
