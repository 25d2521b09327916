// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    AssignedBy, AssignmentRequest, AssignmentResult, AssignmentStatus, AutoAssignmentConfig,
    AvailabilitySlot, DayOfWeek, ExperienceTier, MemberPreferences, PackageRate, Priority,
    RequestedSessionType, ScoringWeights, SessionType, SkillMatchResult, TrainerAssignment,
    TrainerProfile, TrainerStatus, UtilizationConfig, UtilizationImpact,
};
pub use requests::{
    AssignTrainerRequest, RecommendationsRequest, UpdateAssignmentStatusRequest,
    PREVIEW_MEMBER_ID,
};
pub use responses::{
    AssignTrainerResponse, ErrorResponse, HealthResponse, RecommendationsResponse,
    TrainerUtilizationEntry, UpdateStatusResponse, UtilizationResponse,
};
