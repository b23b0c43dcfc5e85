pub mod config;
pub mod error;
pub mod lastfm;
pub mod pool;
pub mod registry;
pub mod store;
pub mod walker;

#[cfg(test)]
pub(crate) mod testutil;

pub use config::Config;
pub use error::{FmexportError, Result};
pub use lastfm::{LastfmClient, MetadataService, Snapshot};
pub use registry::VisitedRegistry;
pub use walker::{WalkStats, Walker};
