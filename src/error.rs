use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use chrono::NaiveDate;
use serde_json::json;

use crate::model::approval_request::ApprovalStatus;

/// Failures surfaced by the attendance core.
///
/// Everything except `Database` is a deterministic consequence of input or
/// state; none of them is worth retrying.
#[derive(Debug, thiserror::Error)]
pub enum AttendanceError {
    /// Malformed input (clock-out not after clock-in, missing notes, ...).
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A business-rule gate did not hold.
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// A workflow transition attempted from the wrong state.
    #[error("Cannot move approval request from {from} to {to}")]
    InvalidTransition {
        from: ApprovalStatus,
        to: ApprovalStatus,
    },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: u64 },

    #[error("No attendance recorded for employee {employee_id} on {date}")]
    NoRecord { employee_id: u64, date: NaiveDate },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type AttendanceResult<T> = Result<T, AttendanceError>;

impl AttendanceError {
    pub fn not_found(entity: &'static str, id: u64) -> Self {
        AttendanceError::NotFound { entity, id }
    }

    /// True for gate failures, including wrong-state transitions.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            AttendanceError::Precondition(_) | AttendanceError::InvalidTransition { .. }
        )
    }

    fn code(&self) -> &'static str {
        match self {
            AttendanceError::Validation(_) => "VALIDATION_ERROR",
            AttendanceError::Precondition(_) => "PRECONDITION_FAILED",
            AttendanceError::InvalidTransition { .. } => "INVALID_TRANSITION",
            AttendanceError::Unauthorized(_) => "UNAUTHORIZED",
            AttendanceError::NotFound { .. } | AttendanceError::NoRecord { .. } => "NOT_FOUND",
            AttendanceError::Database(_) => "INTERNAL_ERROR",
        }
    }
}

impl ResponseError for AttendanceError {
    fn status_code(&self) -> StatusCode {
        match self {
            AttendanceError::Validation(_) => StatusCode::BAD_REQUEST,
            AttendanceError::Precondition(_) | AttendanceError::InvalidTransition { .. } => {
                StatusCode::CONFLICT
            }
            AttendanceError::Unauthorized(_) => StatusCode::FORBIDDEN,
            AttendanceError::NotFound { .. } | AttendanceError::NoRecord { .. } => {
                StatusCode::NOT_FOUND
            }
            AttendanceError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            AttendanceError::Database(e) => {
                tracing::error!(error = %e, "Database error");
                "Internal Server Error".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code()).json(json!({
            "error": message,
            "code": self.code(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_error_kind() {
        assert_eq!(
            AttendanceError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AttendanceError::Precondition("x".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AttendanceError::Unauthorized("x".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AttendanceError::not_found("attendance", 9).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AttendanceError::Database(sqlx::Error::PoolTimedOut).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn invalid_transition_is_a_precondition_failure() {
        let err = AttendanceError::InvalidTransition {
            from: ApprovalStatus::Rejected,
            to: ApprovalStatus::HrApproved,
        };
        assert!(err.is_precondition());
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            err.to_string(),
            "Cannot move approval request from REJECTED to HR_APPROVED"
        );
        assert!(!AttendanceError::Unauthorized("x".into()).is_precondition());
    }

    #[test]
    fn missing_day_names_employee_and_date() {
        let err = AttendanceError::NoRecord {
            employee_id: 7,
            date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
        };
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.code(), "NOT_FOUND");
        assert_eq!(
            err.to_string(),
            "No attendance recorded for employee 7 on 2026-03-02"
        );
    }
}
