//! Problem-reference resolver: identifier in, canonical problem out.
//!
//! Wraps the pure matching helpers from `domain::resolve` with the two
//! catalog fetches they need: a process-wide cached listing (several
//! strategies need table lookups across all entries) and an uncached detail
//! fetch per resolved slug.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::resolve::{best_match, parse_identifier, IdentifierForm};
use crate::domain::{CatalogEntry, ResolvedProblem};
use crate::ports::{CatalogError, ProblemCatalog};

/// Resolves free-form identifiers against the problem catalog.
pub struct ProblemResolver {
    catalog: Arc<dyn ProblemCatalog>,
    // Listing cache. Time-unbounded on purpose: the catalog changes rarely
    // and this deployment is low traffic. A failed fetch leaves the slot
    // empty so the next call retries.
    listing: RwLock<Option<Arc<Vec<CatalogEntry>>>>,
}

impl ProblemResolver {
    /// Creates a resolver over the given catalog.
    pub fn new(catalog: Arc<dyn ProblemCatalog>) -> Self {
        Self {
            catalog,
            listing: RwLock::new(None),
        }
    }

    /// Resolves an identifier to a canonical problem.
    ///
    /// `Ok(None)` means no confident match or the catalog has no detail for
    /// the matched slug; `Err` is reserved for transport failures, which the
    /// orchestrator downgrades to "no reference found".
    pub async fn resolve(&self, identifier: &str) -> Result<Option<ResolvedProblem>, CatalogError> {
        // Direct-URL form carries the slug; no listing needed.
        if let IdentifierForm::UrlSlug(slug) = parse_identifier(identifier) {
            debug!(%slug, "resolving by direct URL slug");
            return self.fetch_by_slug(&slug).await;
        }

        let listing = self.listing().await?;
        let Some(found) = best_match(identifier, &listing) else {
            return Ok(None);
        };
        debug!(
            id = found.entry.id,
            slug = %found.entry.slug,
            confidence = ?found.confidence,
            "matched catalog entry"
        );
        self.fetch_by_slug(&found.entry.slug).await
    }

    async fn fetch_by_slug(&self, slug: &str) -> Result<Option<ResolvedProblem>, CatalogError> {
        let detail = self.catalog.fetch_problem(slug).await?;
        Ok(detail.map(|d| ResolvedProblem::from_detail(slug, d)))
    }

    /// Returns the cached listing, fetching it on first use.
    async fn listing(&self) -> Result<Arc<Vec<CatalogEntry>>, CatalogError> {
        if let Some(listing) = self.listing.read().await.as_ref() {
            return Ok(listing.clone());
        }

        let mut slot = self.listing.write().await;
        // Another task may have filled the slot while we waited.
        if let Some(listing) = slot.as_ref() {
            return Ok(listing.clone());
        }
        let fetched = Arc::new(self.catalog.list_problems().await?);
        *slot = Some(fetched.clone());
        Ok(fetched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use crate::domain::ProblemDetail;

    struct FakeCatalog {
        entries: Vec<CatalogEntry>,
        list_calls: AtomicUsize,
        fail_listing_once: AtomicBool,
    }

    impl FakeCatalog {
        fn new() -> Self {
            Self {
                entries: vec![
                    CatalogEntry::new(1, "Two Sum", "two-sum"),
                    CatalogEntry::new(2, "Add Two Numbers", "add-two-numbers"),
                ],
                list_calls: AtomicUsize::new(0),
                fail_listing_once: AtomicBool::new(false),
            }
        }

        fn failing_first_listing() -> Self {
            let catalog = Self::new();
            catalog.fail_listing_once.store(true, Ordering::SeqCst);
            catalog
        }
    }

    #[async_trait]
    impl ProblemCatalog for FakeCatalog {
        async fn list_problems(&self) -> Result<Vec<CatalogEntry>, CatalogError> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_listing_once.swap(false, Ordering::SeqCst) {
                return Err(CatalogError::Unavailable("connection refused".to_string()));
            }
            Ok(self.entries.clone())
        }

        async fn fetch_problem(
            &self,
            slug: &str,
        ) -> Result<Option<ProblemDetail>, CatalogError> {
            let entry = self.entries.iter().find(|e| e.slug == slug);
            Ok(entry.map(|e| ProblemDetail {
                id: e.id,
                title: e.title.clone(),
                difficulty: "Easy".to_string(),
                body: format!("Statement for {}", e.title),
                tags: vec!["Array".to_string()],
            }))
        }
    }

    fn resolver(catalog: FakeCatalog) -> ProblemResolver {
        ProblemResolver::new(Arc::new(catalog))
    }

    #[tokio::test]
    async fn url_form_skips_the_listing() {
        let catalog = FakeCatalog::new();
        let resolver = resolver(catalog);
        let problem = resolver
            .resolve("https://leetcode.com/problems/two-sum/description/")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(problem.slug, "two-sum");
        // No listing fetch happened.
        assert!(resolver.listing.read().await.is_none());
    }

    #[tokio::test]
    async fn numeric_form_resolves_via_listing() {
        let resolver = resolver(FakeCatalog::new());
        let problem = resolver.resolve("2").await.unwrap().unwrap();
        assert_eq!(problem.id, 2);
        assert_eq!(problem.title, "Add Two Numbers");
    }

    #[tokio::test]
    async fn numbered_title_resolves() {
        let resolver = resolver(FakeCatalog::new());
        let problem = resolver.resolve("2. Add Two Numbers").await.unwrap().unwrap();
        assert_eq!(problem.slug, "add-two-numbers");
    }

    #[tokio::test]
    async fn resolution_is_idempotent() {
        let resolver = resolver(FakeCatalog::new());
        let first = resolver.resolve("two sum").await.unwrap().unwrap();
        let second = resolver.resolve("two sum").await.unwrap().unwrap();
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn listing_is_fetched_once_and_cached() {
        let fake = Arc::new(FakeCatalog::new());
        let resolver = ProblemResolver::new(fake.clone());
        resolver.resolve("1").await.unwrap();
        resolver.resolve("2").await.unwrap();
        assert_eq!(fake.list_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_listing_fetch_does_not_poison_cache() {
        let catalog = FakeCatalog::failing_first_listing();
        let resolver = ProblemResolver::new(Arc::new(catalog));

        let first = resolver.resolve("1").await;
        assert!(first.is_err());

        // Next call retries and succeeds.
        let second = resolver.resolve("1").await.unwrap();
        assert!(second.is_some());
    }

    #[tokio::test]
    async fn unknown_identifier_is_not_found() {
        let resolver = resolver(FakeCatalog::new());
        assert!(resolver.resolve("999").await.unwrap().is_none());
    }
}
