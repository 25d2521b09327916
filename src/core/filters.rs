use crate::core::availability::covers_requested_slot;
use crate::models::{AssignmentRequest, AutoAssignmentConfig, TrainerProfile};

/// Check if a trainer passes the hard eligibility criteria
///
/// This is Stage 1 of the assignment pipeline. Trainers failing any gate
/// are dropped before scoring and can never appear as alternatives.
#[inline]
pub fn passes_basic_eligibility(
    trainer: &TrainerProfile,
    request: &AssignmentRequest,
    config: &AutoAssignmentConfig,
) -> bool {
    // Skip inactive, suspended or on-leave trainers
    if !trainer.is_bookable() {
        return false;
    }

    // Check specialty, exact string match against any listed specialty
    if config.require_specialty_match
        && !trainer
            .specialties
            .iter()
            .any(|specialty| specialty == &request.preferred_specialty)
    {
        return false;
    }

    // Check the weekly schedule covers the whole requested session
    if config.require_availability
        && !covers_requested_slot(
            &trainer.availability,
            request.scheduled_date,
            request.duration_minutes,
        )
    {
        return false;
    }

    // Check rating floor
    if let Some(min_rating) = config.min_rating_threshold {
        if trainer.rating < min_rating {
            return false;
        }
    }

    // Check experience floor
    if let Some(min_experience) = config.min_experience_threshold {
        if trainer.experience_years < min_experience {
            return false;
        }
    }

    // Price gate applies only when both the tenant ceiling and the
    // member budget are present; the stricter of the two wins
    if let (Some(threshold), Some(budget)) = (config.max_price_threshold, request.max_budget) {
        if trainer.hourly_rate > threshold.min(budget) {
            return false;
        }
    }

    // Check the member's avoid list
    if request
        .avoid_list()
        .iter()
        .any(|trainer_id| trainer_id == &trainer.trainer_id)
    {
        return false;
    }

    true
}
