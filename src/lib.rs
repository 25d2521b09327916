//! RepSet Algo - Trainer auto-assignment service for the RepSet gym platform
//!
//! This library provides the trainer assignment engine used by RepSet branches.
//! It implements a filter, score and rank pipeline that picks the best
//! available trainer for a member's session request while spreading load
//! across the branch roster.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{AssignmentEngine, SpecialtyRelations, UtilizationTracker};
pub use crate::models::{
    AssignmentRequest, AssignmentResult, AutoAssignmentConfig, ScoringWeights,
    TrainerAssignment, TrainerProfile,
};
