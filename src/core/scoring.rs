use crate::core::availability::covers_requested_slot;
use crate::core::specialties::SpecialtyRelations;
use crate::models::{
    AssignmentRequest, ExperienceTier, ScoringWeights, SkillMatchResult, TrainerProfile,
};

/// Calculate the full score breakdown (each component 0-100) for one trainer
///
/// Scoring formula:
/// total = (
///     specialty_score * 30 +        # primary/secondary/related specialty
///     experience_score * 20 +       # tier match or years ramp
///     rating_score * 20 +           # 0-5 rating projected to 0-100
///     availability_score * 10 +     # covers the requested slot or not
///     price_score * 10 +            # rate vs. member budget
///     utilization_score * 10        # free capacity, higher = more open
/// ) / 100
///
/// Weights are percentage points; with the defaults the total stays in 0-100.
pub fn calculate_match_score(
    trainer: &TrainerProfile,
    request: &AssignmentRequest,
    utilization_score: f64,
    relations: &SpecialtyRelations,
    weights: &ScoringWeights,
) -> SkillMatchResult {
    // Stage 4a: specialty position
    let specialty_score =
        calculate_specialty_score(trainer, &request.preferred_specialty, relations);

    // Stage 4b: experience tier or ramp
    let experience_score =
        calculate_experience_score(trainer.experience_years, request.preferred_experience());

    // Stage 4c: rating projection
    let rating_score = calculate_rating_score(trainer.rating);

    // Stage 4d: schedule fit, scored even when the eligibility gate is off
    let availability_score = if covers_requested_slot(
        &trainer.availability,
        request.scheduled_date,
        request.duration_minutes,
    ) {
        100.0
    } else {
        0.0
    };

    // Stage 4e: price fit against the member budget
    let price_score = calculate_price_score(trainer.hourly_rate, request.max_budget);

    let utilization_score = utilization_score.clamp(0.0, 100.0);

    // Weighted combination
    let total_score = (specialty_score * weights.specialty
        + experience_score * weights.experience
        + rating_score * weights.rating
        + availability_score * weights.availability
        + price_score * weights.price
        + utilization_score * weights.utilization)
        / 100.0;

    SkillMatchResult {
        specialty_score,
        experience_score,
        rating_score,
        availability_score,
        price_score,
        utilization_score,
        total_score: total_score.clamp(0.0, 100.0),
    }
}

/// Calculate specialty score (0-100)
///
/// 100 when the preferred specialty is the trainer's primary (first listed),
/// 80 when listed anywhere else, 40 when only a related specialty is listed,
/// 0 otherwise.
#[inline]
pub fn calculate_specialty_score(
    trainer: &TrainerProfile,
    preferred: &str,
    relations: &SpecialtyRelations,
) -> f64 {
    match trainer
        .specialties
        .iter()
        .position(|specialty| specialty == preferred)
    {
        Some(0) => 100.0,
        Some(_) => 80.0,
        None => {
            if trainer
                .specialties
                .iter()
                .any(|specialty| relations.are_related(preferred, specialty))
            {
                40.0
            } else {
                0.0
            }
        }
    }
}

/// Calculate experience score (0-100)
///
/// With a preferred tier the score is binary: 100 when the trainer clears
/// the tier's year floor, 30 otherwise ("any" is a flat 70). Without a
/// preference, years ramp linearly up to 100 at ten years.
#[inline]
pub fn calculate_experience_score(years: u8, preferred: Option<ExperienceTier>) -> f64 {
    match preferred {
        Some(ExperienceTier::BeginnerFriendly) => {
            if years >= 2 {
                100.0
            } else {
                30.0
            }
        }
        Some(ExperienceTier::Experienced) => {
            if years >= 5 {
                100.0
            } else {
                30.0
            }
        }
        Some(ExperienceTier::Expert) => {
            if years >= 10 {
                100.0
            } else {
                30.0
            }
        }
        Some(ExperienceTier::Any) => 70.0,
        None => ((years as f64 / 10.0) * 100.0).min(100.0),
    }
}

/// Calculate rating score (0-100) from the 0-5 rating scale
#[inline]
pub fn calculate_rating_score(rating: f64) -> f64 {
    ((rating / 5.0) * 100.0).clamp(0.0, 100.0)
}

/// Calculate price score (0-100)
///
/// Without a budget every trainer gets a neutral 50. With one, the
/// rate-to-budget ratio is banded: well under budget scores best and
/// anything over budget drops to 20 rather than zero, so an over-budget
/// trainer can still surface when no gate removed them.
#[inline]
pub fn calculate_price_score(hourly_rate: f64, max_budget: Option<f64>) -> f64 {
    let budget = match max_budget {
        Some(budget) if budget > 0.0 => budget,
        Some(_) => return 20.0,
        None => return 50.0,
    };

    let ratio = hourly_rate / budget;
    if ratio <= 0.70 {
        100.0
    } else if ratio <= 0.85 {
        80.0
    } else if ratio <= 1.0 {
        60.0
    } else {
        20.0
    }
}
