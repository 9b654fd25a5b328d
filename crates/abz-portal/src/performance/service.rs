use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::catalog::{Criterion, CriteriaCatalog};
use super::domain::{
    CriterionId, Employee, EmployeeId, EvaluationFilter, EvaluationId, EvaluationStatus, Rating,
    RequesterIdentity,
};
use super::repository::{
    CriterionStore, EmployeeDirectory, EvaluationRecord, EvaluationRepository, IdentityVerifier,
    NotificationPublisher, PortalNotice, RepositoryError,
};
use super::resolver::CriterionResolver;
use super::scoring::score_ratings;
use super::visibility::{can_write, disclosure_for, Disclosure, CONFIDENTIAL_EVALUATOR};

/// Creation payload accepted by the POST endpoint. Employee references may
/// be ids or legacy display names.
#[derive(Debug, Clone, Deserialize)]
pub struct EvaluationDraft {
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub evaluator: String,
    #[serde(default)]
    pub period: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub ratings: Vec<RatingDraft>,
}

/// Rating payload as submitted; a missing or null value counts as zero.
#[derive(Debug, Clone, Deserialize)]
pub struct RatingDraft {
    pub criterion: String,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub comment: Option<String>,
}

impl RatingDraft {
    fn into_rating(self) -> Rating {
        Rating {
            criterion: CriterionId(self.criterion),
            value: self.value.unwrap_or(0.0),
            comment: self.comment,
        }
    }
}

/// Partial update payload accepted by the PUT endpoint. Ratings, when
/// present, replace the stored set and force a full total recompute.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EvaluationChanges {
    #[serde(default)]
    pub period: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: Option<EvaluationStatus>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub ratings: Option<Vec<RatingDraft>>,
}

/// Evaluator block serialized under the wire names the portal frontend
/// has always consumed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluatorView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<EmployeeId>,
    #[serde(rename = "nome")]
    pub name: String,
}

/// One rating enriched with the resolved criterion metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingView {
    pub criterion_id: CriterionId,
    pub criterion_name: String,
    pub category: String,
    pub weight: f64,
    pub max_rating: f64,
    pub value: f64,
    pub weighted: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Evaluation as returned over the wire, already disclosure-filtered.
/// `total_score` and the timestamps serialize as explicit nulls so the
/// frontend can render its "—" placeholder.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationView {
    pub id: EvaluationId,
    pub subject: EmployeeId,
    #[serde(rename = "avaliador")]
    pub evaluator: EvaluatorView,
    pub period: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: EvaluationStatus,
    pub total_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub ratings: Vec<RatingView>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Category bucket returned by the criteria listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CriteriaGroup {
    pub category: String,
    pub criteria: Vec<Criterion>,
}

/// Error raised by the evaluation service.
#[derive(Debug, thiserror::Error)]
pub enum EvaluationServiceError {
    #[error("identity could not be verified")]
    Unauthenticated,
    #[error("requester role does not allow this operation")]
    Forbidden,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Evaluation workflows composed over the storage and notification seams.
///
/// Constructed once at startup and shared by reference; the service holds
/// no mutable state of its own, so every operation is request-scoped.
pub struct EvaluationService<R, N> {
    repository: Arc<R>,
    notifications: Arc<N>,
    criteria: Arc<dyn CriterionStore>,
    directory: Arc<dyn EmployeeDirectory>,
    identity: Arc<dyn IdentityVerifier>,
}

static EVALUATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_evaluation_id() -> EvaluationId {
    let id = EVALUATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    EvaluationId(format!("eval-{id:06}"))
}

impl<R, N> EvaluationService<R, N>
where
    R: EvaluationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    pub fn new(
        repository: Arc<R>,
        notifications: Arc<N>,
        criteria: Arc<dyn CriterionStore>,
        directory: Arc<dyn EmployeeDirectory>,
        identity: Arc<dyn IdentityVerifier>,
    ) -> Self {
        Self {
            repository,
            notifications,
            criteria,
            directory,
            identity,
        }
    }

    /// Resolve a bearer token into a requester identity, if possible.
    pub fn authenticate(&self, token: Option<&str>) -> Option<RequesterIdentity> {
        token.and_then(|token| self.identity.verify(token))
    }

    /// Fetch one evaluation with visibility rules applied.
    ///
    /// An unverified identity is tolerated here: the record is returned
    /// without identity-based filtering (legacy single-read leniency).
    pub fn get(
        &self,
        requester: Option<&RequesterIdentity>,
        id: &EvaluationId,
    ) -> Result<EvaluationView, EvaluationServiceError> {
        let record = self
            .repository
            .fetch(id)?
            .ok_or(EvaluationServiceError::NotFound("evaluation"))?;

        let disclosure = disclosure_for(requester, &record.subject);
        if disclosure == Disclosure::Denied {
            return Err(EvaluationServiceError::Forbidden);
        }

        let catalog = CriteriaCatalog::load(self.criteria.as_ref());
        Ok(self.render(record, &catalog, disclosure))
    }

    /// Filtered listing; requires a verified identity. Records the caller
    /// may not see are omitted, own records are redacted per role.
    pub fn list(
        &self,
        requester: Option<&RequesterIdentity>,
        filter: &EvaluationFilter,
    ) -> Result<Vec<EvaluationView>, EvaluationServiceError> {
        let requester = requester.ok_or(EvaluationServiceError::Unauthenticated)?;
        let records = self.repository.list(filter)?;
        let catalog = CriteriaCatalog::load(self.criteria.as_ref());

        let mut views = Vec::new();
        for record in records {
            match disclosure_for(Some(requester), &record.subject) {
                Disclosure::Denied => continue,
                disclosure => views.push(self.render(record, &catalog, disclosure)),
            }
        }
        Ok(views)
    }

    /// Create an evaluation in pending status. Validation and authorization
    /// run before anything is persisted.
    pub fn create(
        &self,
        requester: Option<&RequesterIdentity>,
        draft: EvaluationDraft,
    ) -> Result<EvaluationView, EvaluationServiceError> {
        let requester = requester.ok_or(EvaluationServiceError::Unauthenticated)?;
        if !can_write(requester) {
            return Err(EvaluationServiceError::Forbidden);
        }

        validate_draft(&draft)?;

        let subject = self.resolve_employee(&draft.subject)?;
        let evaluator = self.resolve_employee(&draft.evaluator)?;

        let catalog = CriteriaCatalog::load(self.criteria.as_ref());
        let (ratings, total) = ingest(&catalog, draft.ratings);

        let now = Utc::now();
        let record = EvaluationRecord {
            id: next_evaluation_id(),
            subject: subject.id,
            evaluator: evaluator.id,
            period: draft.period,
            start_date: draft.start_date,
            end_date: draft.end_date,
            status: EvaluationStatus::Pending,
            total_score: total,
            notes: draft.notes,
            ratings,
            created_at: now,
            updated_at: now,
        };

        let stored = self.repository.insert(record)?;
        info!(evaluation = %stored.id.0, subject = %stored.subject.0, "evaluation created");
        Ok(self.render(stored, &catalog, Disclosure::Full))
    }

    /// Update scalar fields and/or replace the rating set. Any rating write
    /// recomputes the stored total in full; it is never patched in place.
    pub fn update(
        &self,
        requester: Option<&RequesterIdentity>,
        id: &EvaluationId,
        changes: EvaluationChanges,
    ) -> Result<EvaluationView, EvaluationServiceError> {
        let requester = requester.ok_or(EvaluationServiceError::Unauthenticated)?;
        if !can_write(requester) {
            return Err(EvaluationServiceError::Forbidden);
        }

        let mut record = self
            .repository
            .fetch(id)?
            .ok_or(EvaluationServiceError::NotFound("evaluation"))?;

        if let Some(status) = changes.status {
            if !record.status.can_transition_to(status) {
                return Err(EvaluationServiceError::Validation(format!(
                    "illegal status transition {} -> {}",
                    record.status.label(),
                    status.label()
                )));
            }
        }

        if let Some(period) = changes.period {
            if period.trim().is_empty() {
                return Err(EvaluationServiceError::Validation(
                    "period must not be empty".to_string(),
                ));
            }
            record.period = period;
        }
        if let Some(start_date) = changes.start_date {
            record.start_date = start_date;
        }
        if let Some(end_date) = changes.end_date {
            record.end_date = end_date;
        }
        if record.end_date < record.start_date {
            return Err(EvaluationServiceError::Validation(
                "end_date precedes start_date".to_string(),
            ));
        }
        if let Some(notes) = changes.notes {
            record.notes = Some(notes);
        }

        let catalog = CriteriaCatalog::load(self.criteria.as_ref());
        if let Some(drafts) = changes.ratings {
            let (ratings, total) = ingest(&catalog, drafts);
            record.ratings = ratings;
            record.total_score = total;
        }

        let previous_status = record.status;
        if let Some(status) = changes.status {
            record.status = status;
        }
        record.updated_at = Utc::now();

        self.repository.update(record.clone()).map_err(not_found_as_missing)?;
        info!(evaluation = %record.id.0, status = record.status.label(), "evaluation updated");

        if previous_status != EvaluationStatus::Completed
            && record.status == EvaluationStatus::Completed
        {
            self.notify_completed(&record);
        }

        Ok(self.render(record, &catalog, Disclosure::Full))
    }

    /// Delete an evaluation; the repository cascades to its rating rows.
    pub fn delete(
        &self,
        requester: Option<&RequesterIdentity>,
        id: &EvaluationId,
    ) -> Result<(), EvaluationServiceError> {
        let requester = requester.ok_or(EvaluationServiceError::Unauthenticated)?;
        if !can_write(requester) {
            return Err(EvaluationServiceError::Forbidden);
        }

        self.repository.delete(id).map_err(not_found_as_missing)?;
        info!(evaluation = %id.0, "evaluation deleted");
        Ok(())
    }

    /// Active catalog grouped by category, for the criteria endpoint.
    pub fn criteria_by_category(&self) -> Vec<CriteriaGroup> {
        let catalog = CriteriaCatalog::load(self.criteria.as_ref());
        catalog
            .group_by_category()
            .into_iter()
            .map(|(category, criteria)| CriteriaGroup {
                category,
                criteria: criteria.into_iter().cloned().collect(),
            })
            .collect()
    }

    /// Id-first lookup with a display-name fallback for legacy payloads.
    fn resolve_employee(&self, reference: &str) -> Result<Employee, EvaluationServiceError> {
        let id = EmployeeId(reference.to_string());
        if let Some(employee) = self.directory.fetch(&id)? {
            return Ok(employee);
        }
        if let Some(employee) = self.directory.find_by_name(reference.trim())? {
            return Ok(employee);
        }
        Err(EvaluationServiceError::NotFound("employee"))
    }

    /// Best effort: the evaluation row is already committed, so a dead
    /// notification transport must not fail the request.
    fn notify_completed(&self, record: &EvaluationRecord) {
        let mut details = BTreeMap::new();
        details.insert("period".to_string(), record.period.clone());
        let notice = PortalNotice {
            template: "evaluation_completed".to_string(),
            evaluation: record.id.clone(),
            recipient: record.subject.clone(),
            details,
        };
        if let Err(err) = self.notifications.publish(notice) {
            warn!(evaluation = %record.id.0, error = %err, "completion notice failed");
        }
    }

    fn render(
        &self,
        record: EvaluationRecord,
        catalog: &CriteriaCatalog,
        disclosure: Disclosure,
    ) -> EvaluationView {
        let resolver = CriterionResolver::new(catalog);
        let ratings = record
            .ratings
            .iter()
            .map(|rating| {
                let criterion = resolver.resolve_for_display(&rating.criterion);
                RatingView {
                    criterion_id: criterion.id.clone(),
                    criterion_name: criterion.name.clone(),
                    category: criterion.category.clone(),
                    weight: criterion.weight,
                    max_rating: criterion.max_rating,
                    value: rating.value,
                    weighted: rating.value * criterion.weight,
                    comment: rating.comment.clone(),
                }
            })
            .collect();

        let evaluator = match disclosure {
            Disclosure::Redacted => EvaluatorView {
                id: None,
                name: CONFIDENTIAL_EVALUATOR.to_string(),
            },
            _ => {
                let name = self
                    .directory
                    .fetch(&record.evaluator)
                    .ok()
                    .flatten()
                    .map(|employee| employee.display_name)
                    .unwrap_or_else(|| record.evaluator.0.clone());
                EvaluatorView {
                    id: Some(record.evaluator.clone()),
                    name,
                }
            }
        };

        let (created_at, updated_at) = match disclosure {
            Disclosure::Redacted => (None, None),
            _ => (Some(record.created_at), Some(record.updated_at)),
        };

        EvaluationView {
            id: record.id,
            subject: record.subject,
            evaluator,
            period: record.period,
            start_date: record.start_date,
            end_date: record.end_date,
            status: record.status,
            total_score: record.total_score,
            notes: record.notes,
            ratings,
            created_at,
            updated_at,
        }
    }
}

/// Run the submitted ratings through the resolver chain and score them.
/// Stored rows keep the remapped criterion ids so later reads resolve.
fn ingest(
    catalog: &CriteriaCatalog,
    drafts: Vec<RatingDraft>,
) -> (Vec<Rating>, Option<f64>) {
    let submitted: Vec<Rating> = drafts.into_iter().map(RatingDraft::into_rating).collect();
    let breakdown = score_ratings(catalog, &submitted);
    let stored = breakdown
        .lines
        .iter()
        .map(|line| Rating {
            criterion: line.criterion.id.clone(),
            value: line.value,
            comment: line.comment.clone(),
        })
        .collect();
    (stored, breakdown.total)
}

fn validate_draft(draft: &EvaluationDraft) -> Result<(), EvaluationServiceError> {
    let mut missing = Vec::new();
    if draft.subject.trim().is_empty() {
        missing.push("subject");
    }
    if draft.evaluator.trim().is_empty() {
        missing.push("evaluator");
    }
    if draft.period.trim().is_empty() {
        missing.push("period");
    }
    if !missing.is_empty() {
        return Err(EvaluationServiceError::Validation(format!(
            "missing required fields: {}",
            missing.join(", ")
        )));
    }
    if draft.end_date < draft.start_date {
        return Err(EvaluationServiceError::Validation(
            "end_date precedes start_date".to_string(),
        ));
    }
    Ok(())
}

fn not_found_as_missing(err: RepositoryError) -> EvaluationServiceError {
    match err {
        RepositoryError::NotFound => EvaluationServiceError::NotFound("evaluation"),
        other => EvaluationServiceError::Repository(other),
    }
}
