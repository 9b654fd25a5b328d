use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::domain::CriterionId;
use super::repository::CriterionStore;

/// A named, weighted, categorized yardstick used to score an employee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Criterion {
    pub id: CriterionId,
    pub name: String,
    pub description: String,
    /// Free-form grouping label, organizational only.
    pub category: String,
    /// Relative importance; always > 0.
    pub weight: f64,
    /// Rating scale ceiling; always > 0.
    pub max_rating: f64,
    /// Soft-delete marker so historical evaluations stay interpretable.
    #[serde(default)]
    pub deleted: bool,
}

/// Where a catalog snapshot came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogSource {
    Store,
    Seed,
}

/// Point-in-time snapshot of the criteria catalog.
///
/// Loading never fails: a store error or an empty store falls back to the
/// built-in seed set, so evaluation intake keeps working while the dynamic
/// catalog is unavailable.
#[derive(Debug, Clone)]
pub struct CriteriaCatalog {
    criteria: Vec<Criterion>,
    source: CatalogSource,
}

impl CriteriaCatalog {
    pub fn load(store: &dyn CriterionStore) -> Self {
        match store.list() {
            Ok(criteria) if !criteria.is_empty() => Self {
                criteria,
                source: CatalogSource::Store,
            },
            Ok(_) => Self::seeded(),
            Err(err) => {
                warn!(error = %err, "criteria store unavailable, using seed catalog");
                Self::seeded()
            }
        }
    }

    pub fn seeded() -> Self {
        Self {
            criteria: default_catalog(),
            source: CatalogSource::Seed,
        }
    }

    pub fn source(&self) -> CatalogSource {
        self.source
    }

    /// Non-deleted criteria in stable insertion order.
    pub fn active(&self) -> Vec<&Criterion> {
        self.criteria
            .iter()
            .filter(|criterion| !criterion.deleted)
            .collect()
    }

    /// Active criteria keyed by their category label.
    pub fn group_by_category(&self) -> BTreeMap<String, Vec<&Criterion>> {
        let mut groups: BTreeMap<String, Vec<&Criterion>> = BTreeMap::new();
        for criterion in self.active() {
            groups
                .entry(criterion.category.clone())
                .or_default()
                .push(criterion);
        }
        groups
    }

    /// Lookup by id, soft-deleted entries included: an evaluation created
    /// while a criterion was active must keep resolving its metadata.
    pub fn resolve(&self, id: &CriterionId) -> Option<&Criterion> {
        self.criteria.iter().find(|criterion| &criterion.id == id)
    }

    /// Exact name lookup against the live catalog.
    pub fn resolve_by_name(&self, name: &str) -> Option<&Criterion> {
        self.criteria.iter().find(|criterion| criterion.name == name)
    }
}

/// Built-in criteria used whenever the dynamic catalog cannot be read.
pub fn default_catalog() -> Vec<Criterion> {
    let seed = |id: &str, name: &str, description: &str, category: &str, weight: f64| Criterion {
        id: CriterionId(id.to_string()),
        name: name.to_string(),
        description: description.to_string(),
        category: category.to_string(),
        weight,
        max_rating: 5.0,
        deleted: false,
    };

    vec![
        seed(
            "crit-productivity",
            "Productivity",
            "Volume of work delivered within the period",
            "Performance",
            3.0,
        ),
        seed(
            "crit-quality",
            "Quality",
            "Accuracy and rework rate of delivered work",
            "Performance",
            3.0,
        ),
        seed(
            "crit-deadlines",
            "Deadlines",
            "Delivery within the agreed dates",
            "Performance",
            2.0,
        ),
        seed(
            "crit-teamwork",
            "Teamwork",
            "Cooperation with the team and other departments",
            "Behavior",
            2.0,
        ),
        seed(
            "crit-communication",
            "Communication",
            "Clarity when reporting progress and blockers",
            "Behavior",
            2.0,
        ),
        seed(
            "crit-initiative",
            "Initiative",
            "Proactivity in addressing problems without prompting",
            "Behavior",
            1.0,
        ),
    ]
}
