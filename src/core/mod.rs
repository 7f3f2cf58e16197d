//! Core business logic modules.

pub mod enrichment;
pub mod events;
pub mod parser;
pub mod policy;
pub mod resolver;

use crate::services::MetadataApi;
use events::EventSink;
use policy::RateLimitedRetryPolicy;

/// What every remote pipeline needs besides the store.
#[derive(Clone, Copy)]
pub struct PipelineContext<'a> {
    pub api: &'a dyn MetadataApi,
    pub policy: &'a RateLimitedRetryPolicy,
    pub sink: &'a dyn EventSink,
}

impl<'a> PipelineContext<'a> {
    pub fn new(
        api: &'a dyn MetadataApi,
        policy: &'a RateLimitedRetryPolicy,
        sink: &'a dyn EventSink,
    ) -> Self {
        Self { api, policy, sink }
    }
}
