use serde::Serialize;
use tracing::debug;

use super::catalog::{CriteriaCatalog, Criterion};
use super::domain::Rating;
use super::resolver::{CriterionResolver, ResolutionOutcome};

/// One resolved rating with its contribution to the total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreLine {
    pub criterion: Criterion,
    pub value: f64,
    pub weighted: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Full scoring result for one evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub total: Option<f64>,
    pub lines: Vec<ScoreLine>,
}

/// Score a set of ratings against a catalog snapshot.
///
/// Every rating contributes: unresolvable criterion references are remapped
/// by the resolver chain rather than dropped.
pub(crate) fn score_ratings(catalog: &CriteriaCatalog, ratings: &[Rating]) -> ScoreBreakdown {
    let resolver = CriterionResolver::new(catalog);
    let mut lines = Vec::with_capacity(ratings.len());

    for rating in ratings {
        let resolved = resolver.resolve(&rating.criterion);
        if resolved.outcome != ResolutionOutcome::CatalogById {
            debug!(
                reference = %rating.criterion.0,
                resolved = %resolved.criterion.id.0,
                "criterion reference remapped"
            );
        }
        let weighted = rating.value * resolved.criterion.weight;
        lines.push(ScoreLine {
            criterion: resolved.criterion,
            value: rating.value,
            weighted,
            comment: rating.comment.clone(),
        });
    }

    ScoreBreakdown {
        total: weighted_total(&lines),
        lines,
    }
}

/// `Σ value·weight / count(ratings)`, `None` when nothing was rated.
///
/// The divisor is the rating COUNT, not the weight sum. Every stored total
/// in the portal was produced this way; changing the divisor would rescale
/// historical scores.
pub(crate) fn weighted_total(lines: &[ScoreLine]) -> Option<f64> {
    if lines.is_empty() {
        return None;
    }
    let numerator: f64 = lines.iter().map(|line| line.weighted).sum();
    Some(numerator / lines.len() as f64)
}
