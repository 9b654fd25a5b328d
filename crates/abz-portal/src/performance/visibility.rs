use super::domain::{EmployeeId, RequesterIdentity};

/// Placeholder shown to a subject in place of the evaluator's name.
pub const CONFIDENTIAL_EVALUATOR: &str = "Confidencial";

/// How much of an evaluation a requester may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disclosure {
    /// Every field, evaluator identity and audit timestamps included.
    Full,
    /// Scores and criteria only: evaluator anonymized, timestamps withheld.
    Redacted,
    /// The record may not be returned at all.
    Denied,
}

/// Read-side decision table.
///
/// `None` means the identity could not be verified. The single-record read
/// keeps working without identity-based filtering (legacy leniency carried
/// over from the original portal); list and write paths reject unverified
/// callers before reaching this function.
pub fn disclosure_for(requester: Option<&RequesterIdentity>, subject: &EmployeeId) -> Disclosure {
    match requester {
        None => Disclosure::Full,
        Some(identity) if identity.role.can_manage_evaluations() => Disclosure::Full,
        Some(identity) if identity.employee == *subject => Disclosure::Redacted,
        Some(_) => Disclosure::Denied,
    }
}

/// Write-side rule: evaluations are created, edited, and deleted only by
/// managers and administrators.
pub fn can_write(requester: &RequesterIdentity) -> bool {
    requester.role.can_manage_evaluations()
}
