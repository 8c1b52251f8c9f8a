use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use super::approval_level::ApprovalLevel;
use super::mysql_string_enum;

#[derive(
    Debug,
    Copy,
    Clone,
    Eq,
    PartialEq,
    Default,
    Serialize,
    Deserialize,
    ToSchema,
    EnumString,
    Display,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum EmployeeStatus {
    #[default]
    Active,
    OnLeave,
    Suspended,
    Terminated,
    Resigned,
}

mysql_string_enum!(EmployeeStatus);

/// The slice of an employee profile the attendance core reads.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "first_name": "Amina",
        "last_name": "Bello",
        "email": "amina.bello@company.com",
        "unit_id": 4,
        "employee_status": "ACTIVE",
        "approval_level": "STAFF"
    })
)]
pub struct Employee {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "Amina")]
    pub first_name: String,

    #[schema(example = "Bello")]
    pub last_name: String,

    #[schema(example = "amina.bello@company.com")]
    pub email: String,

    #[schema(example = 4, nullable = true)]
    pub unit_id: Option<u64>,

    pub employee_status: EmployeeStatus,

    pub approval_level: ApprovalLevel,
}

impl Employee {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Who is calling: the authenticated user resolved against the org chart.
///
/// `supervised_unit_id` is the unit whose `supervisor_id` points at this
/// employee, if any.
#[derive(Debug, Clone, PartialEq, Eq, Default, sqlx::FromRow)]
pub struct Actor {
    pub user_id: u64,
    pub employee_id: Option<u64>,
    pub approval_level: ApprovalLevel,
    pub is_superuser: bool,
    pub unit_id: Option<u64>,
    pub supervised_unit_id: Option<u64>,
}

impl Actor {
    pub fn supervises(&self, unit_id: Option<u64>) -> bool {
        match (self.supervised_unit_id, unit_id) {
            (Some(supervised), Some(unit)) => supervised == unit,
            _ => false,
        }
    }

    pub fn is_self(&self, employee_id: u64) -> bool {
        self.employee_id == Some(employee_id)
    }
}
