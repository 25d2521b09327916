use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::domain::{
    AssignmentRequest, MemberPreferences, Priority, RequestedSessionType,
};

/// Member id carried by read-only recommendation previews
pub const PREVIEW_MEMBER_ID: &str = "preview";

/// Request to auto-assign a trainer
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AssignTrainerRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "branch_id", rename = "branchId")]
    pub branch_id: String,
    #[validate(length(min = 1))]
    #[serde(alias = "member_id", rename = "memberId")]
    pub member_id: String,
    #[validate(length(min = 1))]
    #[serde(alias = "preferred_specialty", rename = "preferredSpecialty")]
    pub preferred_specialty: String,
    #[serde(alias = "scheduled_date", rename = "scheduledDate")]
    pub scheduled_date: chrono::DateTime<chrono::Utc>,
    #[validate(range(min = 15, max = 480))]
    #[serde(default = "default_duration")]
    #[serde(alias = "duration_minutes", rename = "durationMinutes")]
    pub duration_minutes: u32,
    #[serde(default)]
    #[serde(alias = "max_budget", rename = "maxBudget")]
    pub max_budget: Option<f64>,
    #[serde(default)]
    #[serde(alias = "preferred_trainer_id", rename = "preferredTrainerId")]
    pub preferred_trainer_id: Option<String>,
    #[serde(default)]
    #[serde(alias = "member_preferences", rename = "memberPreferences")]
    pub member_preferences: Option<MemberPreferences>,
    #[serde(default)]
    #[serde(alias = "session_type", rename = "sessionType")]
    pub session_type: Option<RequestedSessionType>,
    #[serde(default)]
    pub priority: Option<Priority>,
}

fn default_duration() -> u32 {
    60
}

impl AssignTrainerRequest {
    /// The engine-facing request shape
    pub fn to_assignment_request(&self) -> AssignmentRequest {
        AssignmentRequest {
            member_id: self.member_id.clone(),
            preferred_specialty: self.preferred_specialty.clone(),
            scheduled_date: self.scheduled_date,
            duration_minutes: self.duration_minutes,
            max_budget: self.max_budget,
            preferred_trainer_id: self.preferred_trainer_id.clone(),
            member_preferences: self.member_preferences.clone(),
            session_type: self.session_type,
            priority: self.priority,
        }
    }
}

/// Request for a read-only trainer recommendations preview
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RecommendationsRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "branch_id", rename = "branchId")]
    pub branch_id: String,
    #[validate(length(min = 1))]
    #[serde(alias = "preferred_specialty", rename = "preferredSpecialty")]
    pub preferred_specialty: String,
    #[serde(alias = "scheduled_date", rename = "scheduledDate")]
    pub scheduled_date: chrono::DateTime<chrono::Utc>,
    #[serde(default = "default_duration")]
    #[serde(alias = "duration_minutes", rename = "durationMinutes")]
    pub duration_minutes: u32,
    #[serde(default)]
    #[serde(alias = "max_budget", rename = "maxBudget")]
    pub max_budget: Option<f64>,
    #[serde(default)]
    #[serde(alias = "member_preferences", rename = "memberPreferences")]
    pub member_preferences: Option<MemberPreferences>,
}

impl RecommendationsRequest {
    /// The engine-facing request shape; no member is involved in a
    /// preview, so the member id is a fixed placeholder
    pub fn to_assignment_request(&self) -> AssignmentRequest {
        AssignmentRequest {
            member_id: PREVIEW_MEMBER_ID.to_string(),
            preferred_specialty: self.preferred_specialty.clone(),
            scheduled_date: self.scheduled_date,
            duration_minutes: self.duration_minutes,
            max_budget: self.max_budget,
            preferred_trainer_id: None,
            member_preferences: self.member_preferences.clone(),
            session_type: None,
            priority: None,
        }
    }
}

/// Request to move an assignment to a new lifecycle status
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateAssignmentStatusRequest {
    #[validate(length(min = 1))]
    pub status: String,
}
