use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::catalog::Criterion;
use super::domain::{
    Employee, EmployeeId, EvaluationFilter, EvaluationId, EvaluationStatus, Rating,
    RequesterIdentity,
};

/// Stored evaluation row together with its owned rating rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub id: EvaluationId,
    pub subject: EmployeeId,
    pub evaluator: EmployeeId,
    /// Free-form period label, e.g. "2025-Q1".
    pub period: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: EvaluationStatus,
    /// Recomputed from the ratings on every write; never edited directly.
    pub total_score: Option<f64>,
    pub notes: Option<String>,
    pub ratings: Vec<Rating>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EvaluationFilter {
    /// Equality semantics mirrored from the relational store; the year
    /// filter keys off the start date.
    pub fn matches(&self, record: &EvaluationRecord) -> bool {
        if let Some(subject) = &self.subject {
            if record.subject.0 != *subject {
                return false;
            }
        }
        if let Some(year) = self.year {
            if record.start_date.year() != year {
                return false;
            }
        }
        if let Some(period) = &self.period {
            if record.period != *period {
                return false;
            }
        }
        true
    }
}

/// Storage abstraction over the portal's relational backend.
pub trait EvaluationRepository: Send + Sync {
    fn insert(&self, record: EvaluationRecord) -> Result<EvaluationRecord, RepositoryError>;
    fn update(&self, record: EvaluationRecord) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &EvaluationId) -> Result<Option<EvaluationRecord>, RepositoryError>;
    /// Cascades to the owned rating rows.
    fn delete(&self, id: &EvaluationId) -> Result<(), RepositoryError>;
    fn list(&self, filter: &EvaluationFilter) -> Result<Vec<EvaluationRecord>, RepositoryError>;
    /// Rating rows for one evaluation; NotFound once the owner is deleted.
    fn ratings_for(&self, id: &EvaluationId) -> Result<Vec<Rating>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Read side of the criteria table.
pub trait CriterionStore: Send + Sync {
    /// Every stored criterion, soft-deleted rows included.
    fn list(&self) -> Result<Vec<Criterion>, RepositoryError>;
}

/// Lookup into the employee directory owned by the identity platform.
pub trait EmployeeDirectory: Send + Sync {
    fn fetch(&self, id: &EmployeeId) -> Result<Option<Employee>, RepositoryError>;
    /// Legacy payloads sometimes carry a display name where an id belongs.
    fn find_by_name(&self, name: &str) -> Result<Option<Employee>, RepositoryError>;
}

/// Token verification boundary; token issuance lives outside the portal.
pub trait IdentityVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Option<RequesterIdentity>;
}

/// Outbound notification hook (an e-mail adapter in production).
pub trait NotificationPublisher: Send + Sync {
    fn publish(&self, notice: PortalNotice) -> Result<(), NotificationError>;
}

/// Notification payload so routes and tests can assert the boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortalNotice {
    pub template: String,
    pub evaluation: EvaluationId,
    pub recipient: EmployeeId,
    pub details: BTreeMap<String, String>,
}

/// Notification dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}
