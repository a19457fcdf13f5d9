//! Problem catalog port - interface to the external problem bank.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{CatalogEntry, ProblemDetail};

/// Port for the external problem catalog.
///
/// Ordinary not-found conditions surface as `Ok(None)`; errors are reserved
/// for transport failures the caller maps to a transient/fatal distinction.
#[async_trait]
pub trait ProblemCatalog: Send + Sync {
    /// Fetches the full problem listing.
    async fn list_problems(&self) -> Result<Vec<CatalogEntry>, CatalogError>;

    /// Fetches the detail for a slug. `Ok(None)` when the catalog has no such
    /// problem or returned an empty payload.
    async fn fetch_problem(&self, slug: &str) -> Result<Option<ProblemDetail>, CatalogError>;
}

/// Transport-level catalog failure.
#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    #[error("catalog unreachable: {0}")]
    Unavailable(String),

    #[error("malformed catalog response: {0}")]
    Malformed(String),
}
