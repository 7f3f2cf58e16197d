//! Pipeline events and run summaries.
//!
//! Pipelines never log directly; they hand structured [`PipelineEvent`]s to
//! an [`EventSink`] supplied by the caller. The CLI uses [`TracingSink`].

use crate::models::DetailKind;
use std::fmt;
use std::time::Duration;

/// How a rip was matched to its movie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchSource {
    Local,
    Online,
    Manual,
}

impl fmt::Display for MatchSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchSource::Local => write!(f, "local"),
            MatchSource::Online => write!(f, "online"),
            MatchSource::Manual => write!(f, "manual"),
        }
    }
}

/// Something worth reporting that happened during a run.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    RunStarted {
        pipeline: String,
        items: usize,
    },
    WorkListTruncated {
        pipeline: String,
        pending: usize,
        max_calls: usize,
    },
    WarmingUp {
        delay: Duration,
    },
    Linked {
        file_name: String,
        movie: String,
        source: MatchSource,
    },
    ItemFailed {
        item: String,
        error: String,
    },
    EntityDiscovered {
        kind: DetailKind,
        external_id: String,
        name: String,
    },
    DetailsAssigned {
        movie_id: u64,
        kind: DetailKind,
        count: usize,
    },
    ManualIdChecked {
        file_name: String,
        external_id: u64,
        valid: bool,
    },
    RunFinished {
        summary: RunSummary,
    },
}

/// Receiver of pipeline events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &PipelineEvent);
}

impl<F> EventSink for F
where
    F: Fn(&PipelineEvent) + Send + Sync,
{
    fn emit(&self, event: &PipelineEvent) {
        self(event)
    }
}

/// Forwards events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &PipelineEvent) {
        match event {
            PipelineEvent::RunStarted { pipeline, items } => {
                tracing::info!("[{}] {} items to process", pipeline, items);
            }
            PipelineEvent::WorkListTruncated {
                pipeline,
                pending,
                max_calls,
            } => {
                tracing::info!(
                    "[{}] {} pending, limited to {} remote calls",
                    pipeline,
                    pending,
                    max_calls
                );
            }
            PipelineEvent::WarmingUp { delay } => {
                tracing::debug!("Waiting {}ms for the rate limiter", delay.as_millis());
            }
            PipelineEvent::Linked {
                file_name,
                movie,
                source,
            } => {
                tracing::info!("[{}] {} -> {}", source, file_name, movie);
            }
            PipelineEvent::ItemFailed { item, error } => {
                tracing::warn!("Skipped {}: {}", item, error);
            }
            PipelineEvent::EntityDiscovered {
                kind,
                external_id,
                name,
            } => {
                tracing::debug!("New {} entry: {} ({})", kind, name, external_id);
            }
            PipelineEvent::DetailsAssigned {
                movie_id,
                kind,
                count,
            } => {
                tracing::debug!("Assigned {} {} to movie {}", count, kind, movie_id);
            }
            PipelineEvent::ManualIdChecked {
                file_name,
                external_id,
                valid,
            } => {
                if *valid {
                    tracing::debug!("Manual id {} for {} is valid", external_id, file_name);
                } else {
                    tracing::warn!("Manual id {} for {} does not exist", external_id, file_name);
                }
            }
            PipelineEvent::RunFinished { summary } => {
                tracing::info!("{}", summary);
            }
        }
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: &PipelineEvent) {}
}

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    /// Pipeline name (e.g., "link", "enrich genres").
    pub pipeline: String,
    /// Items looked at, locally or remotely.
    pub processed: usize,
    /// Items that were linked, enriched or validated.
    pub found: usize,
    /// Detail entities seen for the first time.
    pub new_entities: usize,
    /// Items filtered out or already correct.
    pub skipped: usize,
    /// One message per failed item.
    pub errors: Vec<String>,
}

impl RunSummary {
    pub fn new(pipeline: impl Into<String>) -> Self {
        Self {
            pipeline: pipeline.into(),
            ..Default::default()
        }
    }

    pub fn errored(&self) -> usize {
        self.errors.len()
    }

    /// Record a per-item failure and tell the sink about it.
    pub(crate) fn record_error(
        &mut self,
        sink: &dyn EventSink,
        item: &str,
        error: &crate::Error,
    ) {
        sink.emit(&PipelineEvent::ItemFailed {
            item: item.to_string(),
            error: error.to_string(),
        });
        self.errors.push(format!("{}: {}", item, error));
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] processed {}, found {}, new entities {}, skipped {}, errors {}",
            self.pipeline,
            self.processed,
            self.found,
            self.new_entities,
            self.skipped,
            self.errored()
        )
    }
}
