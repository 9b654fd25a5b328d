//! Performance-evaluation area of the portal: the criteria catalog, the
//! weighted scoring engine, and the disclosure rules applied when stored
//! evaluations are read back by employees, managers, and administrators.

pub mod catalog;
pub mod domain;
pub mod repository;
pub(crate) mod resolver;
pub mod router;
pub(crate) mod scoring;
pub mod service;
pub mod visibility;

#[cfg(test)]
mod tests;

pub use catalog::{default_catalog, CatalogSource, CriteriaCatalog, Criterion};
pub use domain::{
    CriterionId, Employee, EmployeeId, EvaluationFilter, EvaluationId, EvaluationStatus, Rating,
    RequesterIdentity, Role,
};
pub use repository::{
    CriterionStore, EmployeeDirectory, EvaluationRecord, EvaluationRepository, IdentityVerifier,
    NotificationError, NotificationPublisher, PortalNotice, RepositoryError,
};
pub use router::evaluation_router;
pub use scoring::{ScoreBreakdown, ScoreLine};
pub use service::{
    CriteriaGroup, EvaluationChanges, EvaluationDraft, EvaluationService, EvaluationServiceError,
    EvaluationView, EvaluatorView, RatingDraft, RatingView,
};
pub use visibility::{can_write, disclosure_for, Disclosure, CONFIDENTIAL_EVALUATOR};
