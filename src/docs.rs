use crate::api::approval::{ApprovalFilter, ApprovalListResponse, CreateApprovalReq, ReviewReq};
use crate::api::attendance::{ManualEntryReq, MarkPresentReq, MarkPresentResponse, StatusQuery};
use crate::api::policy::{HolidayView, PolicyResponse};
use crate::engine::workflow::ReviewCapabilities;
use crate::model::approval_request::{ApprovalRequest, ApprovalStatus, ApprovalStatusCounts};
use crate::model::attendance::{AttendanceRecord, AttendanceSummary, DayStatus};
use crate::model::time_policy::{NewTimePolicy, TimePolicy};
use crate::models::{LoginReqDto, TokenPair};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

/// Registers the `bearer_auth` scheme referenced by protected paths.
pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Office-Flow Attendance API",
        version = "1.0.0",
        description = r#"
## Office-Flow attendance core

Daily attendance status and the two-tier absence approval workflow.

### 🔹 Key Features
- **Attendance**
  - Clock-in / clock-out; every write re-derives the day status from the active time policy
  - Manual entries by unit supervisors and HR
  - HR bulk override to PRESENT
- **Approvals**
  - Employees contest an ABSENT day
  - Unit supervisor review, then HR review; HR approval turns the day PRESENT
- **Time policy**
  - One active policy; built-in defaults (09:00 start, 18:01 clock-out deadline) when none is active

### 🔐 Security
All `/api` endpoints require a JWT access token (`Authorization: Bearer ...`).
Obtain one from `/auth/login`; rotate it with `/auth/refresh`.

### 📦 Errors
Failures return `{"error": "...", "code": "..."}` with
`VALIDATION_ERROR` (400), `UNAUTHORIZED` (403), `NOT_FOUND` (404),
`PRECONDITION_FAILED` / `INVALID_TRANSITION` (409).

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::auth::handlers::login,
        crate::auth::handlers::refresh_token,
        crate::auth::handlers::logout,

        crate::api::attendance::clock_in,
        crate::api::attendance::clock_out,
        crate::api::attendance::manual_entry,
        crate::api::attendance::status,
        crate::api::attendance::mark_present,

        crate::api::approval::create_request,
        crate::api::approval::list_requests,
        crate::api::approval::summary,
        crate::api::approval::get_request,
        crate::api::approval::capabilities,
        crate::api::approval::supervisor_approve,
        crate::api::approval::supervisor_reject,
        crate::api::approval::hr_approve,
        crate::api::approval::hr_reject,

        crate::api::policy::current_policy,
        crate::api::policy::create_policy,
        crate::api::policy::activate_policy
    ),
    components(
        schemas(
            LoginReqDto,
            TokenPair,
            AttendanceRecord,
            AttendanceSummary,
            DayStatus,
            ManualEntryReq,
            StatusQuery,
            MarkPresentReq,
            MarkPresentResponse,
            ApprovalRequest,
            ApprovalStatus,
            ApprovalStatusCounts,
            ApprovalFilter,
            ApprovalListResponse,
            CreateApprovalReq,
            ReviewReq,
            ReviewCapabilities,
            TimePolicy,
            NewTimePolicy,
            HolidayView,
            PolicyResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Login and token rotation"),
        (name = "Attendance", description = "Attendance recording and status"),
        (name = "Approvals", description = "Absence approval workflow"),
        (name = "Policy", description = "Working-time policy"),
    )
)]
pub struct ApiDoc;
