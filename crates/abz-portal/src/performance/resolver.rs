use std::sync::atomic::{AtomicU64, Ordering};

use super::catalog::{default_catalog, CriteriaCatalog, Criterion};
use super::domain::CriterionId;

/// Which strategy settled a rating's criterion reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ResolutionOutcome {
    CatalogById,
    CatalogByName,
    FallbackCatalog,
    Synthesized,
}

/// A criterion reference after resolution, with its provenance.
#[derive(Debug, Clone)]
pub(crate) struct ResolvedCriterion {
    pub criterion: Criterion,
    pub outcome: ResolutionOutcome,
}

static SYNTHETIC_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn synthesize(reference: &CriterionId) -> Criterion {
    let id = SYNTHETIC_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    Criterion {
        id: CriterionId(format!("crit-gen-{id:06}")),
        name: reference.0.clone(),
        description: String::new(),
        category: "Uncategorized".to_string(),
        weight: 1.0,
        max_rating: 5.0,
        deleted: false,
    }
}

/// Ordered resolution chain for heterogeneous criterion references.
///
/// Rating rows accumulated over the portal's history reference criteria by
/// catalog id, by display name, or by retired legacy keys. Each strategy is
/// tried in turn; the final one always succeeds, so a malformed reference
/// can never drop a rating from scoring.
pub(crate) struct CriterionResolver<'a> {
    catalog: &'a CriteriaCatalog,
    fallback: Vec<Criterion>,
}

impl<'a> CriterionResolver<'a> {
    pub(crate) fn new(catalog: &'a CriteriaCatalog) -> Self {
        Self {
            catalog,
            fallback: default_catalog(),
        }
    }

    fn chain() -> [(ResolutionOutcome, fn(&Self, &CriterionId) -> Option<Criterion>); 3] {
        [
            (ResolutionOutcome::CatalogById, Self::catalog_by_id),
            (ResolutionOutcome::CatalogByName, Self::catalog_by_name),
            (
                ResolutionOutcome::FallbackCatalog,
                Self::fallback_by_id_or_name,
            ),
        ]
    }

    /// Ingestion-side resolution: runs the chain and mints a fresh id when
    /// nothing matches.
    pub(crate) fn resolve(&self, reference: &CriterionId) -> ResolvedCriterion {
        for (outcome, strategy) in Self::chain() {
            if let Some(criterion) = strategy(self, reference) {
                return ResolvedCriterion { criterion, outcome };
            }
        }
        ResolvedCriterion {
            criterion: synthesize(reference),
            outcome: ResolutionOutcome::Synthesized,
        }
    }

    /// Read-side resolution: the same chain without the id-minting tail, so
    /// display lookups never consume sequence numbers. Unmatched references
    /// pass through with neutral weight.
    pub(crate) fn resolve_for_display(&self, reference: &CriterionId) -> Criterion {
        for (_, strategy) in Self::chain() {
            if let Some(criterion) = strategy(self, reference) {
                return criterion;
            }
        }
        Criterion {
            id: reference.clone(),
            name: reference.0.clone(),
            description: String::new(),
            category: "Uncategorized".to_string(),
            weight: 1.0,
            max_rating: 5.0,
            deleted: false,
        }
    }

    pub(crate) fn catalog_by_id(&self, reference: &CriterionId) -> Option<Criterion> {
        self.catalog.resolve(reference).cloned()
    }

    pub(crate) fn catalog_by_name(&self, reference: &CriterionId) -> Option<Criterion> {
        self.catalog.resolve_by_name(reference.0.trim()).cloned()
    }

    pub(crate) fn fallback_by_id_or_name(&self, reference: &CriterionId) -> Option<Criterion> {
        let needle = reference.0.trim();
        self.fallback
            .iter()
            .find(|criterion| criterion.id.0 == needle || criterion.name == needle)
            .cloned()
    }
}
