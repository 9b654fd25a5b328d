use serde::{Deserialize, Serialize};

/// Identifier wrapper for portal employees.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmployeeId(pub String);

/// Identifier wrapper for evaluations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EvaluationId(pub String);

/// Identifier wrapper for evaluation criteria.
///
/// Historical rating rows carry anything from catalog ids to free-form
/// legacy labels in this field; resolution is tolerant by design.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CriterionId(pub String);

/// Portal roles as produced by the identity verifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Regular,
    Manager,
    Admin,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Role::Regular => "regular",
            Role::Manager => "manager",
            Role::Admin => "admin",
        }
    }

    /// Managers and administrators share the oversight surface.
    pub const fn can_manage_evaluations(self) -> bool {
        matches!(self, Role::Manager | Role::Admin)
    }
}

/// Verified requester identity attached to an incoming request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequesterIdentity {
    pub employee: EmployeeId,
    pub role: Role,
}

/// Employee view consumed from the directory; the portal core does not own
/// or mutate employee records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub display_name: String,
    pub role: Role,
    pub position: String,
    pub department: String,
}

/// Lifecycle states of an evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl EvaluationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            EvaluationStatus::Pending => "pending",
            EvaluationStatus::InProgress => "in_progress",
            EvaluationStatus::Completed => "completed",
            EvaluationStatus::Cancelled => "cancelled",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, EvaluationStatus::Completed | EvaluationStatus::Cancelled)
    }

    /// Transition table: pending moves to in-progress, in-progress to
    /// completed, and any non-terminal state can be cancelled. Re-asserting
    /// the current status is a no-op and always accepted.
    pub fn can_transition_to(self, next: EvaluationStatus) -> bool {
        if self == next {
            return true;
        }
        match (self, next) {
            (EvaluationStatus::Pending, EvaluationStatus::InProgress) => true,
            (EvaluationStatus::InProgress, EvaluationStatus::Completed) => true,
            (from, EvaluationStatus::Cancelled) => !from.is_terminal(),
            _ => false,
        }
    }
}

/// One criterion pointscore inside an evaluation, as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub criterion: CriterionId,
    #[serde(default)]
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Equality filters accepted by the evaluation listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EvaluationFilter {
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub period: Option<String>,
}
