//! Integration tests for detail enrichment.

mod common;

use common::{detail, fast_policy, movie, FailingAssignStore, FakeApi, RecordingSink};
use rip_catalog::core::enrichment::enrich_details;
use rip_catalog::core::events::PipelineEvent;
use rip_catalog::core::PipelineContext;
use rip_catalog::models::{DetailEntity, DetailKind};
use rip_catalog::store::{CatalogStore, EntityStore};
use rip_catalog::Error;
use std::sync::Arc;

fn store_with_movies(ids: &[u64]) -> CatalogStore {
    let mut store = CatalogStore::in_memory();
    for id in ids {
        store.add_movie(movie(*id, &format!("Movie {}", id), Some(2000))).unwrap();
    }
    store
}

fn genres_of(store: &CatalogStore, movie_id: u64) -> Option<Vec<Arc<DetailEntity>>> {
    store.movie_details(movie_id).unwrap().unwrap().genres
}

#[tokio::test]
async fn test_shared_entities_are_one_instance() {
    let mut store = store_with_movies(&[1, 2]);

    let api = FakeApi::new()
        .with_details(DetailKind::Genres, 1, vec![detail(18, "Drama"), detail(80, "Crime")])
        .with_details(DetailKind::Genres, 2, vec![detail(18, "Drama")]);
    let policy = fast_policy();
    let sink = RecordingSink::default();

    let summary = enrich_details(
        DetailKind::Genres,
        &mut store,
        PipelineContext::new(&api, &policy, &sink),
        None,
    )
    .await
    .unwrap();

    assert_eq!(summary.processed, 2);
    assert_eq!(summary.found, 2);
    assert_eq!(summary.new_entities, 2);
    assert_eq!(store.commit_count(), 1);

    let first = genres_of(&store, 1).unwrap();
    let second = genres_of(&store, 2).unwrap();
    assert_eq!(first.len(), 2);
    assert!(Arc::ptr_eq(&first[0], &second[0]));
    assert_eq!(store.detail_entities(DetailKind::Genres).unwrap().len(), 2);

    let discovered = sink
        .events()
        .iter()
        .filter(|e| matches!(e, PipelineEvent::EntityDiscovered { .. }))
        .count();
    assert_eq!(discovered, 2);
}

#[tokio::test]
async fn test_known_entities_are_reused() {
    let mut store = store_with_movies(&[1]);
    let drama = Arc::new(DetailEntity {
        external_id: 18,
        name: "Drama".into(),
    });
    store.add_detail_entities(DetailKind::Genres, vec![drama.clone()]).unwrap();

    let api = FakeApi::new().with_details(DetailKind::Genres, 1, vec![detail(18, "Drama")]);
    let policy = fast_policy();
    let sink = RecordingSink::default();

    let summary = enrich_details(
        DetailKind::Genres,
        &mut store,
        PipelineContext::new(&api, &policy, &sink),
        None,
    )
    .await
    .unwrap();

    assert_eq!(summary.new_entities, 0);
    assert!(Arc::ptr_eq(&genres_of(&store, 1).unwrap()[0], &drama));
}

#[tokio::test]
async fn test_duplicate_results_assigned_once() {
    let mut store = store_with_movies(&[1]);

    let api = FakeApi::new().with_details(
        DetailKind::Directors,
        1,
        vec![detail(525, "Christopher Nolan"), detail(525, "Christopher Nolan")],
    );
    let policy = fast_policy();
    let sink = RecordingSink::default();

    let summary = enrich_details(
        DetailKind::Directors,
        &mut store,
        PipelineContext::new(&api, &policy, &sink),
        None,
    )
    .await
    .unwrap();

    assert_eq!(summary.new_entities, 1);
    let details = store.movie_details(1).unwrap().unwrap();
    assert_eq!(details.directors.unwrap().len(), 1);
}

#[tokio::test]
async fn test_max_calls_limits_fetches() {
    let mut store = store_with_movies(&[1, 2, 3]);

    let api = FakeApi::new()
        .with_details(DetailKind::Keywords, 1, vec![detail(10, "heist")])
        .with_details(DetailKind::Keywords, 2, vec![detail(10, "heist")])
        .with_details(DetailKind::Keywords, 3, vec![detail(11, "cartel")]);
    let policy = fast_policy();
    let sink = RecordingSink::default();

    let summary = enrich_details(
        DetailKind::Keywords,
        &mut store,
        PipelineContext::new(&api, &policy, &sink),
        Some(2),
    )
    .await
    .unwrap();

    assert_eq!(api.call_count(), 2);
    assert_eq!(summary.processed, 2);
    assert_eq!(store.movies_without(DetailKind::Keywords).unwrap().len(), 1);
}

#[tokio::test]
async fn test_throttled_movie_is_skipped() {
    let mut store = store_with_movies(&[1, 2]);

    let api = FakeApi::new()
        .throttle_id(1)
        .with_details(DetailKind::Genres, 2, vec![detail(18, "Drama")]);
    let policy = fast_policy();
    let sink = RecordingSink::default();

    let summary = enrich_details(
        DetailKind::Genres,
        &mut store,
        PipelineContext::new(&api, &policy, &sink),
        None,
    )
    .await
    .unwrap();

    assert_eq!(summary.processed, 2);
    assert_eq!(summary.found, 1);
    assert_eq!(summary.errors.len(), 1);
    assert!(summary.errors[0].starts_with("Movie 1 (2000) [1]: Rate limit exceeded"));
    assert_eq!(genres_of(&store, 1), None);
    assert_eq!(genres_of(&store, 2).map(|g| g.len()), Some(1));
    assert_eq!(store.commit_count(), 1);
}

#[tokio::test]
async fn test_missing_movie_stays_unassigned() {
    let mut store = store_with_movies(&[1, 2]);

    let api = FakeApi::new().with_details(DetailKind::Cast, 1, vec![detail(1892, "Matt Damon")]);
    let policy = fast_policy();
    let sink = RecordingSink::default();

    let summary = enrich_details(
        DetailKind::Cast,
        &mut store,
        PipelineContext::new(&api, &policy, &sink),
        None,
    )
    .await
    .unwrap();

    assert_eq!(summary.found, 1);
    assert_eq!(summary.errored(), 1);
    assert!(summary.errors[0].starts_with("Movie 2 (2000) [2]"));

    let without: Vec<u64> = store
        .movies_without(DetailKind::Cast)
        .unwrap()
        .iter()
        .map(|m| m.external_id)
        .collect();
    assert_eq!(without, vec![2]);
}

#[tokio::test]
async fn test_empty_result_marks_fetched() {
    let mut store = store_with_movies(&[1]);

    let api = FakeApi::new().with_details(DetailKind::Genres, 1, vec![]);
    let policy = fast_policy();
    let sink = RecordingSink::default();

    enrich_details(
        DetailKind::Genres,
        &mut store,
        PipelineContext::new(&api, &policy, &sink),
        None,
    )
    .await
    .unwrap();

    assert_eq!(genres_of(&store, 1), Some(vec![]));
    assert!(store.movies_without(DetailKind::Genres).unwrap().is_empty());
}

#[tokio::test]
async fn test_nothing_missing_skips_warm_up() {
    let mut store = CatalogStore::in_memory();

    let api = FakeApi::new();
    let policy = fast_policy();
    let sink = RecordingSink::default();

    let summary = enrich_details(
        DetailKind::Genres,
        &mut store,
        PipelineContext::new(&api, &policy, &sink),
        None,
    )
    .await
    .unwrap();

    assert_eq!(summary.processed, 0);
    assert_eq!(api.call_count(), 0);
    assert!(!sink
        .events()
        .iter()
        .any(|e| matches!(e, PipelineEvent::WarmingUp { .. })));
}

#[tokio::test]
async fn test_failed_assignment_commits_nothing() {
    let mut store = FailingAssignStore {
        inner: store_with_movies(&[1]),
    };

    let api = FakeApi::new().with_details(DetailKind::Genres, 1, vec![detail(18, "Drama")]);
    let policy = fast_policy();
    let sink = RecordingSink::default();

    let result = enrich_details(
        DetailKind::Genres,
        &mut store,
        PipelineContext::new(&api, &policy, &sink),
        None,
    )
    .await;

    assert!(matches!(result, Err(Error::Store(_))));
    assert_eq!(store.inner.commit_count(), 0);
}

#[tokio::test]
async fn test_fatal_fetch_error_commits_nothing() {
    let mut store = store_with_movies(&[1, 2]);

    let api = FakeApi {
        broken: vec![1],
        ..FakeApi::new()
    }
    .with_details(DetailKind::Genres, 2, vec![detail(18, "Drama")]);
    let policy = fast_policy();
    let sink = RecordingSink::default();

    let result = enrich_details(
        DetailKind::Genres,
        &mut store,
        PipelineContext::new(&api, &policy, &sink),
        None,
    )
    .await;

    assert!(matches!(result, Err(Error::Api { status: 500, .. })));
    assert_eq!(store.commit_count(), 0);
}

#[tokio::test]
async fn test_imdb_ids() {
    let mut store = store_with_movies(&[1, 2]);

    let mut api = FakeApi::new();
    api.imdb_ids.insert(1, "tt0113277".into());
    let policy = fast_policy();
    let sink = RecordingSink::default();

    let summary = enrich_details(
        DetailKind::ImdbId,
        &mut store,
        PipelineContext::new(&api, &policy, &sink),
        None,
    )
    .await
    .unwrap();

    assert_eq!(summary.found, 2);
    assert_eq!(summary.new_entities, 1);
    assert_eq!(
        store.movie_details(1).unwrap().unwrap().imdb_id.as_deref(),
        Some("tt0113277")
    );
    let without: Vec<u64> = store
        .movies_without(DetailKind::ImdbId)
        .unwrap()
        .iter()
        .map(|m| m.external_id)
        .collect();
    assert!(without.is_empty());

    let details = store.movie_details(2).unwrap().unwrap();
    assert_eq!(details.imdb_id, None);
    assert!(details.imdb_checked);
}

#[tokio::test]
async fn test_movies_without_imdb_id_are_not_refetched() {
    let mut store = store_with_movies(&[1, 2, 3]);

    let mut api = FakeApi::new();
    api.imdb_ids.insert(3, "tt0113277".into());
    let policy = fast_policy();
    let sink = RecordingSink::default();

    for _ in 0..2 {
        enrich_details(
            DetailKind::ImdbId,
            &mut store,
            PipelineContext::new(&api, &policy, &sink),
            Some(2),
        )
        .await
        .unwrap();
    }

    assert_eq!(api.call_log(), vec!["imdb-id 1", "imdb-id 2", "imdb-id 3"]);
    assert_eq!(
        store.movie_details(3).unwrap().unwrap().imdb_id.as_deref(),
        Some("tt0113277")
    );
    assert!(store.movies_without(DetailKind::ImdbId).unwrap().is_empty());
}
