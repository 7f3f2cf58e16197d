//! External services.

pub mod metadata;
pub mod tmdb;

pub use metadata::{MetadataApi, OfflineApi};
