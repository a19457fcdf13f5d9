//! Problem-catalog value objects.

use serde::{Deserialize, Serialize};

/// One row in the catalog's full problem listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Displayed sequence number (the "frontend id").
    pub id: u32,
    /// Human-readable title, e.g. "Add Two Numbers".
    pub title: String,
    /// URL slug, e.g. "add-two-numbers".
    pub slug: String,
}

impl CatalogEntry {
    /// Creates a catalog entry.
    pub fn new(id: u32, title: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            slug: slug.into(),
        }
    }
}

/// Full problem detail fetched from the catalog's detail service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemDetail {
    /// Displayed sequence number.
    pub id: u32,
    /// Problem title.
    pub title: String,
    /// Difficulty label, e.g. "Easy".
    pub difficulty: String,
    /// Problem statement as plain text.
    pub body: String,
    /// Topic tags, e.g. ["Array", "Hash Table"].
    pub tags: Vec<String>,
}

/// A canonical reference produced by the resolver. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedProblem {
    /// Displayed sequence number.
    pub id: u32,
    /// Catalog slug the detail was fetched under.
    pub slug: String,
    /// Problem title.
    pub title: String,
    /// Difficulty label.
    pub difficulty: String,
    /// Problem statement as plain text.
    pub body: String,
    /// Topic tags.
    pub tags: Vec<String>,
}

impl ResolvedProblem {
    /// Combines a detail payload with the slug it was fetched under.
    pub fn from_detail(slug: impl Into<String>, detail: ProblemDetail) -> Self {
        Self {
            id: detail.id,
            slug: slug.into(),
            title: detail.title,
            difficulty: detail.difficulty,
            body: detail.body,
            tags: detail.tags,
        }
    }
}
