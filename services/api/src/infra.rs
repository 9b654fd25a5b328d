use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use abz_portal::performance::{
    default_catalog, Criterion, CriterionId, CriterionStore, Employee, EmployeeDirectory,
    EmployeeId, EvaluationFilter, EvaluationId, EvaluationRecord, EvaluationRepository,
    IdentityVerifier, NotificationError, NotificationPublisher, PortalNotice, Rating,
    RepositoryError, RequesterIdentity, Role,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tracing::info;

/// Local development tokens; the real deployment fronts the service with the
/// corporate identity provider.
pub(crate) const DEV_ADMIN_TOKEN: &str = "dev-admin";
pub(crate) const DEV_MANAGER_TOKEN: &str = "dev-manager";
pub(crate) const DEV_EMPLOYEE_TOKEN: &str = "dev-employee";

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryEvaluationRepository {
    records: Arc<Mutex<HashMap<EvaluationId, EvaluationRecord>>>,
}

impl EvaluationRepository for InMemoryEvaluationRepository {
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

pub(crate) struct SeededCriterionStore {
    criteria: Vec<Criterion>,
}

impl CriterionStore for SeededCriterionStore {
    fn list(&self) -> Result<Vec<Criterion>, RepositoryError> {
        Ok(self.criteria.clone())
    }
}

/// The standard catalog plus one retired criterion, so historical rating
/// rows referencing it still resolve while it stays out of new forms.
pub(crate) fn seeded_criteria() -> SeededCriterionStore {
    let mut criteria = default_catalog();
    criteria.push(Criterion {
        id: CriterionId("crit-attendance".to_string()),
        name: "Attendance".to_string(),
        description: "Presence during agreed working hours".to_string(),
        category: "Behavior".to_string(),
        weight: 1.0,
        max_rating: 5.0,
        deleted: true,
    });
    SeededCriterionStore { criteria }
}

pub(crate) struct SeededEmployeeDirectory {
    employees: Vec<Employee>,
}

impl EmployeeDirectory for SeededEmployeeDirectory {
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

pub(crate) fn seeded_directory() -> SeededEmployeeDirectory {
    let employee = |id: &str, name: &str, role: Role, position: &str, department: &str| Employee {
        id: EmployeeId(id.to_string()),
        display_name: name.to_string(),
        role,
        position: position.to_string(),
        department: department.to_string(),
    };

    SeededEmployeeDirectory {
        employees: vec![
            employee(
                "emp-0001",
                "Rita Duarte",
                Role::Admin,
                "People Ops Lead",
                "People",
            ),
            employee(
                "emp-0002",
                "Carlos Braga",
                Role::Manager,
                "Engineering Manager",
                "Engineering",
            ),
            employee(
                "emp-0003",
                "Ana Souza",
                Role::Regular,
                "Analyst",
                "Engineering",
            ),
            employee(
                "emp-0004",
                "Joao Lima",
                Role::Regular,
                "Field Technician",
                "Offshore",
            ),
        ],
    }
}

pub(crate) struct StaticTokenVerifier {
    tokens: HashMap<String, RequesterIdentity>,
}

impl IdentityVerifier for StaticTokenVerifier {
    fn verify(&self, token: &str) -> Option<RequesterIdentity> {
        self.tokens.get(token).cloned()
    }
}

pub(crate) fn seeded_tokens() -> StaticTokenVerifier {
    let identity = |employee: &str, role: Role| RequesterIdentity {
        employee: EmployeeId(employee.to_string()),
        role,
    };

    let mut tokens = HashMap::new();
    tokens.insert(DEV_ADMIN_TOKEN.to_string(), identity("emp-0001", Role::Admin));
    tokens.insert(
        DEV_MANAGER_TOKEN.to_string(),
        identity("emp-0002", Role::Manager),
    );
    tokens.insert(
        DEV_EMPLOYEE_TOKEN.to_string(),
        identity("emp-0003", Role::Regular),
    );
    StaticTokenVerifier { tokens }
}

/// Stands in for the e-mail adapter: completion notices land in the log.
pub(crate) struct LoggingNotificationPublisher;

impl NotificationPublisher for LoggingNotificationPublisher {
    fn publish(&self, notice: PortalNotice) -> Result<(), NotificationError> {
        info!(
            template = %notice.template,
            evaluation = %notice.evaluation.0,
            recipient = %notice.recipient.0,
            "notification dispatched"
        );
        Ok(())
    }
}
