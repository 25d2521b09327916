// Core algorithm exports
pub mod availability;
pub mod engine;
pub mod filters;
pub mod scoring;
pub mod specialties;
pub mod utilization;

pub use availability::{covers_requested_slot, parse_time_minutes, weekly_available_hours};
pub use engine::{
    rank_candidates, AssignmentEngine, EngineError, ScoredCandidate, MAX_ALTERNATIVES,
    NEAR_TIE_MARGIN, RECOMMENDATION_LIMIT,
};
pub use filters::passes_basic_eligibility;
pub use scoring::calculate_match_score;
pub use specialties::SpecialtyRelations;
pub use utilization::{DateRange, TrainerLoad, UtilizationTracker};
