pub mod concept_repository;
pub mod config;
pub mod error;
pub mod hashing;
pub mod index;
pub mod merge;
pub mod models;
pub mod popularity;
pub mod prune;
pub mod record;
pub mod store;
pub mod wiki_entity_repository;
pub mod wiki_search_name_repository;
pub mod wiki_title_repository;

pub use concept_repository::ConceptRepository;
pub use config::{Locale, StoreConfig};
pub use error::*;
pub use merge::Update;
pub use models::*;
pub use popularity::PopularHash;
pub use store::Collection;
pub use wiki_entity_repository::WikiEntityRepository;
pub use wiki_search_name_repository::WikiSearchNameRepository;
pub use wiki_title_repository::WikiTitleRepository;

use tracing_subscriber::EnvFilter;

/// Install a stderr fmt subscriber filtered by `RUST_LOG` (default `info`).
///
/// Safe to call more than once; later calls keep the first subscriber.
pub fn init_tracing(service: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!(service, "tracing initialized");
    }
}
