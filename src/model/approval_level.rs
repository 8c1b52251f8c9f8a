use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use super::mysql_string_enum;

/// Review authority carried on the employee record.
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
pub enum ApprovalLevel {
    #[default]
    Staff,
    Supervisor,
    DeptHead,
    DeputyDir,
    Director,
    HrAdmin,
    ItAdmin,
}

mysql_string_enum!(ApprovalLevel);

impl ApprovalLevel {
    /// Levels that carry some approval power in the organisation.
    pub fn can_approve(&self) -> bool {
        matches!(
            self,
            ApprovalLevel::Supervisor
                | ApprovalLevel::DeptHead
                | ApprovalLevel::DeputyDir
                | ApprovalLevel::Director
                | ApprovalLevel::HrAdmin
        )
    }

    pub fn is_hr_admin(&self) -> bool {
        *self == ApprovalLevel::HrAdmin
    }
}
