use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::http::StatusCode;
use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::performance::catalog::Criterion;
use crate::performance::domain::{
    CriterionId, Employee, EmployeeId, EvaluationFilter, EvaluationId, Rating, RequesterIdentity,
    Role,
};
use crate::performance::repository::{
    CriterionStore, EmployeeDirectory, EvaluationRecord, EvaluationRepository, IdentityVerifier,
    NotificationError, NotificationPublisher, PortalNotice, RepositoryError,
};
use crate::performance::evaluation_router;
use crate::performance::service::{EvaluationDraft, EvaluationService, RatingDraft};

pub(super) const ADMIN_TOKEN: &str = "tok-admin";
pub(super) const MANAGER_TOKEN: &str = "tok-manager";
pub(super) const ANA_TOKEN: &str = "tok-ana";
pub(super) const JOAO_TOKEN: &str = "tok-joao";

pub(super) fn employees() -> Vec<Employee> {
    let employee = |id: &str, name: &str, role: Role, position: &str| Employee {
        id: EmployeeId(id.to_string()),
        display_name: name.to_string(),
        role,
        position: position.to_string(),
        department: "Operations".to_string(),
    };

    vec![
        employee("emp-admin", "Rita Duarte", Role::Admin, "People Ops Lead"),
        employee("emp-mgr", "Carlos Braga", Role::Manager, "Engineering Manager"),
        employee("emp-ana", "Ana Souza", Role::Regular, "Analyst"),
        employee("emp-joao", "Joao Lima", Role::Regular, "Technician"),
    ]
}

pub(super) fn identity(employee: &str, role: Role) -> RequesterIdentity {
    RequesterIdentity {
        employee: EmployeeId(employee.to_string()),
        role,
    }
}

pub(super) fn admin() -> RequesterIdentity {
    identity("emp-admin", Role::Admin)
}

pub(super) fn manager() -> RequesterIdentity {
    identity("emp-mgr", Role::Manager)
}

pub(super) fn ana() -> RequesterIdentity {
    identity("emp-ana", Role::Regular)
}

pub(super) fn joao() -> RequesterIdentity {
    identity("emp-joao", Role::Regular)
}

/// Four review criteria with the weight profile used by the scoring tests.
pub(super) fn review_criteria() -> Vec<Criterion> {
    let criterion = |id: &str, name: &str, category: &str, weight: f64| Criterion {
        id: CriterionId(id.to_string()),
        name: name.to_string(),
        description: format!("{name} over the review period"),
        category: category.to_string(),
        weight,
        max_rating: 5.0,
        deleted: false,
    };

    vec![
        criterion("crit-productivity", "Productivity", "Performance", 3.0),
        criterion("crit-teamwork", "Teamwork", "Behavior", 2.0),
        criterion("crit-communication", "Communication", "Behavior", 2.0),
        criterion("crit-quality", "Quality", "Performance", 3.0),
    ]
}

pub(super) fn rating_drafts(values: [f64; 4]) -> Vec<RatingDraft> {
    let ids = [
        "crit-productivity",
        "crit-teamwork",
        "crit-communication",
        "crit-quality",
    ];
    ids.iter()
        .zip(values)
        .map(|(id, value)| RatingDraft {
            criterion: id.to_string(),
            value: Some(value),
            comment: None,
        })
        .collect()
}

pub(super) fn draft() -> EvaluationDraft {
    EvaluationDraft {
        subject: "emp-ana".to_string(),
        evaluator: "emp-mgr".to_string(),
        period: "2025-Q1".to_string(),
        start_date: NaiveDate::from_ymd_opt(2025, 1, 1).expect("valid date"),
        end_date: NaiveDate::from_ymd_opt(2025, 3, 31).expect("valid date"),
        notes: Some("Quarterly review".to_string()),
        ratings: rating_drafts([4.0, 4.0, 5.0, 4.0]),
    }
}

pub(super) type TestService = EvaluationService<MemoryEvaluationRepository, MemoryNotifications>;

pub(super) fn build_service() -> (
    Arc<TestService>,
    Arc<MemoryEvaluationRepository>,
    Arc<MemoryNotifications>,
) {
    build_service_with_criteria(StaticCriteria::new(review_criteria()))
}

pub(super) fn build_service_with_criteria(
    criteria: StaticCriteria,
) -> (
    Arc<TestService>,
    Arc<MemoryEvaluationRepository>,
    Arc<MemoryNotifications>,
) {
    let repository = Arc::new(MemoryEvaluationRepository::default());
    let notifications = Arc::new(MemoryNotifications::default());
    let service = Arc::new(EvaluationService::new(
        repository.clone(),
        notifications.clone(),
        Arc::new(criteria),
        Arc::new(StaticDirectory::new(employees())),
        Arc::new(StaticVerifier::seeded()),
    ));
    (service, repository, notifications)
}

pub(super) fn router_with_service(service: Arc<TestService>) -> axum::Router {
    evaluation_router(service)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn assert_status(response: &Response, expected: StatusCode) {
    assert_eq!(response.status(), expected);
}

#[derive(Default, Clone)]
pub(super) struct MemoryEvaluationRepository {
    records: Arc<Mutex<HashMap<EvaluationId, EvaluationRecord>>>,
}

impl EvaluationRepository for MemoryEvaluationRepository {
    fn insert(&self, record: EvaluationRecord) -> Result<EvaluationRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&record.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn update(&self, record: EvaluationRecord) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&record.id) {
            guard.insert(record.id.clone(), record);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch(&self, id: &EvaluationId) -> Result<Option<EvaluationRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn delete(&self, id: &EvaluationId) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        guard.remove(id).map(|_| ()).ok_or(RepositoryError::NotFound)
    }

    fn list(&self, filter: &EvaluationFilter) -> Result<Vec<EvaluationRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        let mut records: Vec<EvaluationRecord> = guard
            .values()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect();
        records.sort_by(|a, b| a.id.0.cmp(&b.id.0));
        Ok(records)
    }

    fn ratings_for(&self, id: &EvaluationId) -> Result<Vec<Rating>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        guard
            .get(id)
            .map(|record| record.ratings.clone())
            .ok_or(RepositoryError::NotFound)
    }
}

pub(super) struct UnavailableRepository;

impl EvaluationRepository for UnavailableRepository {
    fn insert(&self, _record: EvaluationRecord) -> Result<EvaluationRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _record: EvaluationRecord) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &EvaluationId) -> Result<Option<EvaluationRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn delete(&self, _id: &EvaluationId) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list(&self, _filter: &EvaluationFilter) -> Result<Vec<EvaluationRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn ratings_for(&self, _id: &EvaluationId) -> Result<Vec<Rating>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryNotifications {
    events: Arc<Mutex<Vec<PortalNotice>>>,
}

impl MemoryNotifications {
    pub(super) fn events(&self) -> Vec<PortalNotice> {
        self.events.lock().expect("notice mutex poisoned").clone()
    }
}

impl NotificationPublisher for MemoryNotifications {
    fn publish(&self, notice: PortalNotice) -> Result<(), NotificationError> {
        self.events
            .lock()
            .expect("notice mutex poisoned")
            .push(notice);
        Ok(())
    }
}

pub(super) struct FailingNotifications;

impl NotificationPublisher for FailingNotifications {
    fn publish(&self, _notice: PortalNotice) -> Result<(), NotificationError> {
        Err(NotificationError::Transport("smtp relay down".to_string()))
    }
}

pub(super) struct StaticCriteria {
    criteria: Vec<Criterion>,
}

impl StaticCriteria {
    pub(super) fn new(criteria: Vec<Criterion>) -> Self {
        Self { criteria }
    }

    pub(super) fn empty() -> Self {
        Self::new(Vec::new())
    }
}

impl CriterionStore for StaticCriteria {
    fn list(&self) -> Result<Vec<Criterion>, RepositoryError> {
        Ok(self.criteria.clone())
    }
}

pub(super) struct FailingCriteria;

impl CriterionStore for FailingCriteria {
    fn list(&self) -> Result<Vec<Criterion>, RepositoryError> {
        Err(RepositoryError::Unavailable("criteria table offline".to_string()))
    }
}

pub(super) struct StaticDirectory {
    employees: Vec<Employee>,
}

impl StaticDirectory {
    pub(super) fn new(employees: Vec<Employee>) -> Self {
        Self { employees }
    }
}

impl EmployeeDirectory for StaticDirectory {
    fn fetch(&self, id: &EmployeeId) -> Result<Option<Employee>, RepositoryError> {
        Ok(self
            .employees
            .iter()
            .find(|employee| employee.id == *id)
            .cloned())
    }

    fn find_by_name(&self, name: &str) -> Result<Option<Employee>, RepositoryError> {
        Ok(self
            .employees
            .iter()
            .find(|employee| employee.display_name == name)
            .cloned())
    }
}

pub(super) struct StaticVerifier {
    tokens: HashMap<String, RequesterIdentity>,
}

impl StaticVerifier {
    pub(super) fn seeded() -> Self {
        let mut tokens = HashMap::new();
        tokens.insert(ADMIN_TOKEN.to_string(), admin());
        tokens.insert(MANAGER_TOKEN.to_string(), manager());
        tokens.insert(ANA_TOKEN.to_string(), ana());
        tokens.insert(JOAO_TOKEN.to_string(), joao());
        Self { tokens }
    }
}

impl IdentityVerifier for StaticVerifier {
    fn verify(&self, token: &str) -> Option<RequesterIdentity> {
        self.tokens.get(token).cloned()
    }
}
