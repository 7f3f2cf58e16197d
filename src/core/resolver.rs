//! Rip to movie linking.
//!
//! A rip is resolved in this order:
//!
//! 1. **Exclusion**: ignored filenames and filenames with a manual id are
//!    left alone.
//! 2. **Local match**: movies already in the catalog whose title or
//!    original title tokenizes like the rip's parsed title.
//! 3. **Online search**: TMDB search by title and year, widened to the
//!    neighbouring years when the exact year finds nothing.
//!
//! Manual overrides and their validation are separate runs. Every run stages
//! its changes in memory and commits them once at the end.

use super::events::{MatchSource, PipelineEvent, RunSummary};
use super::parser::parse_filename;
use super::PipelineContext;
use crate::models::config::SettingsProvider;
use crate::models::{MovieIdentity, RipDescriptor, SearchResult};
use crate::store::EntityStore;
use crate::utils::text::title_key;
use crate::{Error, Result};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Result of disambiguating a candidate list.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome<T> {
    Matched(T),
    NoMatch,
    Ambiguous(Vec<T>),
}

/// Something that can be picked by release year.
pub trait Candidate {
    fn external_id(&self) -> u64;
    fn release_year(&self) -> Option<i32>;
    fn label(&self) -> String;
}

impl Candidate for Arc<MovieIdentity> {
    fn external_id(&self) -> u64 {
        self.external_id
    }

    fn release_year(&self) -> Option<i32> {
        self.release_year
    }

    fn label(&self) -> String {
        MovieIdentity::label(self)
    }
}

impl Candidate for SearchResult {
    fn external_id(&self) -> u64 {
        self.external_id
    }

    fn release_year(&self) -> Option<i32> {
        self.release_year
    }

    fn label(&self) -> String {
        SearchResult::label(self)
    }
}

/// Pick one candidate, using the release year to break ties.
///
/// An exact year match wins; failing that, a single candidate within one
/// year either way. Anything else is ambiguous and never guessed.
pub fn disambiguate<T: Candidate>(mut candidates: Vec<T>, year: Option<i32>) -> MatchOutcome<T> {
    match candidates.len() {
        0 => return MatchOutcome::NoMatch,
        1 => return MatchOutcome::Matched(candidates.remove(0)),
        _ => {}
    }

    let Some(year) = year else {
        return MatchOutcome::Ambiguous(candidates);
    };

    let exact: Vec<usize> = positions(&candidates, |y| y == year);
    if exact.len() == 1 {
        return MatchOutcome::Matched(candidates.swap_remove(exact[0]));
    }

    let window: Vec<usize> = positions(&candidates, |y| (year - 1..=year + 1).contains(&y));
    if window.len() == 1 {
        return MatchOutcome::Matched(candidates.swap_remove(window[0]));
    }

    MatchOutcome::Ambiguous(candidates)
}

fn positions<T: Candidate>(candidates: &[T], accept: impl Fn(i32) -> bool) -> Vec<usize> {
    candidates
        .iter()
        .enumerate()
        .filter(|(_, c)| c.release_year().map_or(false, &accept))
        .map(|(i, _)| i)
        .collect()
}

/// Whether either title tokenizes to `key`.
fn title_matches(key: &[String], title: &str, original_title: &str) -> bool {
    !key.is_empty() && (title_key(title) == key || title_key(original_title) == key)
}

fn outcome_to_result<T: Candidate>(outcome: MatchOutcome<T>, title: &str) -> Result<T> {
    match outcome {
        MatchOutcome::Matched(c) => Ok(c),
        MatchOutcome::NoMatch => Err(Error::NoMatch(title.to_string())),
        MatchOutcome::Ambiguous(candidates) => Err(Error::MultipleMatch {
            title: title.to_string(),
            candidates: candidates.iter().map(Candidate::label).collect(),
        }),
    }
}

/// Options for [`IdentityResolver::resolve_identities`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolveOptions {
    /// At most this many rips are searched online.
    pub max_calls: Option<usize>,
    /// Skip the online search entirely.
    pub local_only: bool,
}

/// Movies created during one run, keyed by external id.
#[derive(Default)]
struct RunMovies {
    by_id: HashMap<u64, Arc<MovieIdentity>>,
    created: Vec<Arc<MovieIdentity>>,
}

/// Links rips to movies.
pub struct IdentityResolver<'a> {
    store: &'a mut dyn EntityStore,
    settings: &'a dyn SettingsProvider,
    ctx: PipelineContext<'a>,
}

impl<'a> IdentityResolver<'a> {
    pub fn new(
        store: &'a mut dyn EntityStore,
        settings: &'a dyn SettingsProvider,
        ctx: PipelineContext<'a>,
    ) -> Self {
        Self { store, settings, ctx }
    }

    /// Link every unlinked rip, locally first and then online.
    pub async fn resolve_identities(&mut self, options: ResolveOptions) -> Result<RunSummary> {
        let mut summary = RunSummary::new("link");

        let ignored: HashSet<String> = self.settings.rip_filenames_to_ignore().into_iter().collect();
        let manual = self.settings.manual_external_ids();

        let mut work = Vec::new();
        for rip in self.store.rips()? {
            if rip.is_linked() {
                continue;
            }
            if ignored.contains(&rip.file_name) || manual.contains_key(&rip.file_name) {
                summary.skipped += 1;
                continue;
            }
            work.push(rip);
        }

        self.ctx.sink.emit(&PipelineEvent::RunStarted {
            pipeline: summary.pipeline.clone(),
            items: work.len(),
        });

        let mut links: Vec<(String, Arc<MovieIdentity>)> = Vec::new();
        let mut pending = Vec::new();

        for rip in work {
            summary.processed += 1;
            match self.match_locally(&rip)? {
                MatchOutcome::Matched(movie) => {
                    self.emit_linked(&rip.file_name, &movie, MatchSource::Local);
                    summary.found += 1;
                    links.push((rip.file_name, movie));
                }
                MatchOutcome::NoMatch => pending.push(rip),
                ambiguous @ MatchOutcome::Ambiguous(_) => {
                    if let Err(e) = outcome_to_result(ambiguous, &rip.parsed_title) {
                        summary.record_error(self.ctx.sink, &rip.file_name, &e);
                    }
                }
            }
        }

        let mut run_movies = RunMovies::default();

        if !options.local_only && !pending.is_empty() {
            self.truncate(&mut pending, options.max_calls, &summary.pipeline);
            self.warm_up().await;

            for rip in pending {
                match self.search_online(&rip).await {
                    Ok(result) => {
                        let movie = self.materialize(result, &mut run_movies)?;
                        self.emit_linked(&rip.file_name, &movie, MatchSource::Online);
                        summary.found += 1;
                        links.push((rip.file_name, movie));
                    }
                    Err(e) if e.is_recoverable() => {
                        summary.record_error(self.ctx.sink, &rip.file_name, &e);
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        self.store.add_movies(run_movies.created)?;
        for (file_name, movie) in links {
            self.store.link_rip(&file_name, movie)?;
        }
        self.store.complete()?;

        self.finish(&summary);
        Ok(summary)
    }

    /// Link rips listed in the manual override table to their configured ids.
    ///
    /// Rips the catalog does not know yet are created from the filename.
    /// At most `max_calls` movies are fetched from the service.
    pub async fn link_manual_overrides(&mut self, max_calls: Option<usize>) -> Result<RunSummary> {
        let mut summary = RunSummary::new("link manual");
        let manual = self.settings.manual_external_ids();

        self.ctx.sink.emit(&PipelineEvent::RunStarted {
            pipeline: summary.pipeline.clone(),
            items: manual.len(),
        });

        let mut run_movies = RunMovies::default();
        let mut new_rips = Vec::new();
        let mut links: Vec<(String, Arc<MovieIdentity>)> = Vec::new();
        let mut remote: Vec<(String, u64)> = Vec::new();

        for (file_name, external_id) in manual {
            summary.processed += 1;

            match self.store.find_rip(&file_name)? {
                Some(rip) if rip.movie_id() == Some(external_id) => {
                    summary.skipped += 1;
                    continue;
                }
                Some(rip) => {
                    if let Some(previous) = &rip.movie {
                        tracing::debug!(
                            "Overriding link {} -> {} with manual id {}",
                            file_name,
                            previous.external_id,
                            external_id
                        );
                    }
                }
                None => match parse_filename(&file_name) {
                    Ok(rip) => new_rips.push(rip),
                    Err(e) => {
                        summary.record_error(self.ctx.sink, &file_name, &e);
                        continue;
                    }
                },
            }

            match self.known_movie(external_id, &mut run_movies)? {
                Some(movie) => {
                    self.emit_linked(&file_name, &movie, MatchSource::Manual);
                    summary.found += 1;
                    links.push((file_name, movie));
                }
                None => remote.push((file_name, external_id)),
            }
        }

        if !remote.is_empty() {
            self.truncate(&mut remote, max_calls, &summary.pipeline);
            self.warm_up().await;
        }

        for (file_name, external_id) in remote {
            // An earlier item in this run may already have fetched it.
            if let Some(movie) = run_movies.by_id.get(&external_id).cloned() {
                self.emit_linked(&file_name, &movie, MatchSource::Manual);
                summary.found += 1;
                links.push((file_name, movie));
                continue;
            }

            let api = self.ctx.api;
            match self.ctx.policy.run(|| api.get_movie_info(external_id)).await {
                Ok(info) => {
                    let movie = self.materialize(info, &mut run_movies)?;
                    self.emit_linked(&file_name, &movie, MatchSource::Manual);
                    summary.found += 1;
                    links.push((file_name, movie));
                }
                Err(e) if e.is_recoverable() => {
                    summary.record_error(self.ctx.sink, &file_name, &e);
                }
                Err(e) => return Err(e),
            }
        }

        for rip in new_rips {
            self.store.add_rip(rip)?;
        }
        self.store.add_movies(run_movies.created)?;
        for (file_name, movie) in links {
            self.store.link_rip(&file_name, movie)?;
        }
        self.store.complete()?;

        self.finish(&summary);
        Ok(summary)
    }

    /// Check that every manual id exists on the service. Nothing is linked
    /// and nothing is committed.
    pub async fn validate_manual_ids(&mut self) -> Result<RunSummary> {
        let mut summary = RunSummary::new("validate manual");
        let manual = self.settings.manual_external_ids();

        self.ctx.sink.emit(&PipelineEvent::RunStarted {
            pipeline: summary.pipeline.clone(),
            items: manual.len(),
        });
        if !manual.is_empty() {
            self.warm_up().await;
        }

        let api = self.ctx.api;
        for (file_name, external_id) in manual {
            summary.processed += 1;
            match self.ctx.policy.run(|| api.external_id_exists(external_id)).await {
                Ok(valid) => {
                    self.ctx.sink.emit(&PipelineEvent::ManualIdChecked {
                        file_name: file_name.clone(),
                        external_id,
                        valid,
                    });
                    if valid {
                        summary.found += 1;
                    } else {
                        summary
                            .errors
                            .push(format!("{}: external id {} does not exist", file_name, external_id));
                    }
                }
                Err(e) if e.is_recoverable() => {
                    summary.record_error(self.ctx.sink, &file_name, &e);
                }
                Err(e) => return Err(e),
            }
        }

        self.finish(&summary);
        Ok(summary)
    }

    /// Match a rip against movies already in the catalog.
    pub fn match_locally(&self, rip: &RipDescriptor) -> Result<MatchOutcome<Arc<MovieIdentity>>> {
        let key = title_key(&rip.parsed_title);
        let candidates = self
            .store
            .find_movies(&|m: &MovieIdentity| title_matches(&key, &m.title, &m.original_title))?;
        Ok(disambiguate(candidates, rip.release_year()))
    }

    /// Search the service for a rip's movie.
    pub async fn search_online(&self, rip: &RipDescriptor) -> Result<SearchResult> {
        let key = title_key(&rip.parsed_title);
        let title = rip.parsed_title.as_str();
        let year = rip.release_year();
        let api = self.ctx.api;

        let mut candidates: Vec<SearchResult> = self
            .ctx
            .policy
            .run(|| api.search_movie(title, year))
            .await?
            .into_iter()
            .filter(|r| title_matches(&key, &r.title, &r.original_title))
            .collect();

        if candidates.is_empty() {
            if let Some(year) = year {
                for neighbour in [year + 1, year - 1] {
                    let results = self
                        .ctx
                        .policy
                        .run(|| api.search_movie(title, Some(neighbour)))
                        .await?;
                    for r in results {
                        if title_matches(&key, &r.title, &r.original_title)
                            && !candidates.iter().any(|c| c.external_id == r.external_id)
                        {
                            candidates.push(r);
                        }
                    }
                }
            }
        }

        outcome_to_result(disambiguate(candidates, year), title)
    }

    /// Movie with this id from the run or the catalog, without a remote call.
    fn known_movie(
        &self,
        external_id: u64,
        run_movies: &mut RunMovies,
    ) -> Result<Option<Arc<MovieIdentity>>> {
        if let Some(movie) = run_movies.by_id.get(&external_id) {
            return Ok(Some(movie.clone()));
        }
        if let Some(movie) = self.store.find_movie(external_id)? {
            run_movies.by_id.insert(external_id, movie.clone());
            return Ok(Some(movie));
        }
        Ok(None)
    }

    /// The single instance for a search result's id, creating it if needed.
    fn materialize(&self, result: SearchResult, run_movies: &mut RunMovies) -> Result<Arc<MovieIdentity>> {
        if let Some(movie) = self.known_movie(result.external_id, run_movies)? {
            return Ok(movie);
        }
        let movie = Arc::new(MovieIdentity::from(result));
        run_movies.by_id.insert(movie.external_id, movie.clone());
        run_movies.created.push(movie.clone());
        Ok(movie)
    }

    fn truncate<T>(&self, work: &mut Vec<T>, max_calls: Option<usize>, pipeline: &str) {
        if let Some(max_calls) = max_calls {
            if work.len() > max_calls {
                self.ctx.sink.emit(&PipelineEvent::WorkListTruncated {
                    pipeline: pipeline.to_string(),
                    pending: work.len(),
                    max_calls,
                });
                work.truncate(max_calls);
            }
        }
    }

    async fn warm_up(&self) {
        self.ctx.sink.emit(&PipelineEvent::WarmingUp {
            delay: self.ctx.policy.initial_warmup_delay(),
        });
        self.ctx.policy.warm_up().await;
    }

    fn emit_linked(&self, file_name: &str, movie: &MovieIdentity, source: MatchSource) {
        self.ctx.sink.emit(&PipelineEvent::Linked {
            file_name: file_name.to_string(),
            movie: movie.label(),
            source,
        });
    }

    fn finish(&self, summary: &RunSummary) {
        self.ctx.sink.emit(&PipelineEvent::RunFinished {
            summary: summary.clone(),
        });
    }
}
