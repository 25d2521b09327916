use serde::{Deserialize, Serialize};

use crate::models::domain::{AssignmentResult, AssignmentStatus, TrainerProfile};

/// Response for the auto-assign endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignTrainerResponse {
    pub result: AssignmentResult,
    pub total_candidates: usize,
}

/// Response for the recommendations preview endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationsResponse {
    pub recommendations: Vec<TrainerProfile>,
    pub total_candidates: usize,
}

/// Response for the status update endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusResponse {
    pub success: bool,
    #[serde(rename = "assignmentId")]
    pub assignment_id: String,
    pub status: AssignmentStatus,
}

/// One row of the branch utilization snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainerUtilizationEntry {
    #[serde(rename = "trainerId")]
    pub trainer_id: String,
    pub name: String,
    /// Busy percentage 0-100.
    #[serde(rename = "utilizationPct")]
    pub utilization_pct: f64,
    /// Free-capacity score 0-100 as fed into scoring.
    #[serde(rename = "capacityScore")]
    pub capacity_score: f64,
    #[serde(rename = "availableForAssignment")]
    pub available_for_assignment: bool,
}

/// Response for the branch utilization endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UtilizationResponse {
    #[serde(rename = "branchId")]
    pub branch_id: String,
    pub trainers: Vec<TrainerUtilizationEntry>,
    #[serde(rename = "windowStart")]
    pub window_start: chrono::DateTime<chrono::Utc>,
    #[serde(rename = "windowEnd")]
    pub window_end: chrono::DateTime<chrono::Utc>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
