//! Data models.

pub mod config;
pub mod movie;
pub mod rip;

pub use movie::{DetailEntity, DetailKind, DetailResult, MovieDetails, MovieIdentity, SearchResult};
pub use rip::RipDescriptor;
