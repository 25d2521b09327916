use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

use crate::core::{
    filters::passes_basic_eligibility, scoring::calculate_match_score,
    specialties::SpecialtyRelations, utilization::UtilizationTracker,
};
use crate::models::{
    AssignedBy, AssignmentRequest, AssignmentResult, AssignmentStatus, AutoAssignmentConfig,
    ScoringWeights, SkillMatchResult, TrainerAssignment, TrainerProfile, UtilizationConfig,
    UtilizationImpact,
};

/// Totals within this many points of each other count as a near-tie
/// and are re-ordered in favour of the freer trainer
pub const NEAR_TIE_MARGIN: f64 = 5.0;

/// Alternates surfaced next to the selected trainer
pub const MAX_ALTERNATIVES: usize = 3;

/// Trainers returned by the read-only recommendations preview
pub const RECOMMENDATION_LIMIT: usize = 5;

/// Rough busy-percentage cost of one additional booking, used for the
/// before/after estimate in the result
const ASSIGNMENT_UTILIZATION_BUMP: f64 = 10.0;

/// Internal failure taxonomy. Callers of `assign_trainer` never see these
/// directly; each maps onto a failed result carrying its message.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("No trainers available matching basic criteria")]
    NoEligibleCandidates,
    #[error("No trainers available due to capacity constraints")]
    CapacityExhausted,
    #[error("Invalid assignment request: {0}")]
    InvalidRequest(String),
}

/// A trainer together with its score breakdown for one request
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub trainer: TrainerProfile,
    pub score: SkillMatchResult,
}

/// Main assignment orchestrator - implements the multi-stage pipeline
///
/// # Pipeline Stages
/// 1. Hard eligibility filtering (status, specialty, schedule, thresholds)
/// 2. Utilization refresh over the booking window
/// 3. Capacity gate (load balancing)
/// 4. Weighted scoring
/// 5. Ranking with near-tie load spreading
/// 6. Selection and alternative extraction
/// 7. Assignment construction
/// 8. Result assembly
///
/// The engine is immutable after construction and holds no I/O handles;
/// callers fetch the trainer pool and booking history and hand them in.
#[derive(Debug, Clone)]
pub struct AssignmentEngine {
    config: AutoAssignmentConfig,
    utilization_config: UtilizationConfig,
    weights: ScoringWeights,
    relations: SpecialtyRelations,
}

impl AssignmentEngine {
    pub fn new(
        config: AutoAssignmentConfig,
        utilization_config: UtilizationConfig,
        weights: ScoringWeights,
        relations: SpecialtyRelations,
    ) -> Self {
        Self {
            config,
            utilization_config,
            weights,
            relations,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(
            AutoAssignmentConfig::default(),
            UtilizationConfig::default(),
            ScoringWeights::default(),
            SpecialtyRelations::builtin(),
        )
    }

    /// Same engine under a different tenant policy
    pub fn with_config(&self, config: AutoAssignmentConfig) -> Self {
        Self {
            config,
            utilization_config: self.utilization_config.clone(),
            weights: self.weights,
            relations: self.relations.clone(),
        }
    }

    pub fn config(&self) -> &AutoAssignmentConfig {
        &self.config
    }

    /// Fresh per-call tracker wired to this engine's window and ceiling
    pub fn tracker(&self) -> UtilizationTracker {
        UtilizationTracker::new(
            self.utilization_config.clone(),
            self.config.max_utilization_threshold,
        )
    }

    /// Assign the best trainer for a request
    ///
    /// Runs the complete pipeline over the supplied pool. All failures
    /// come back as `success: false` results with a message; this method
    /// never panics on malformed pools and never returns `Err`.
    ///
    /// # Arguments
    /// * `request` - The member's assignment request
    /// * `available_trainers` - The branch's trainer pool
    /// * `existing_assignments` - Booking history feeding utilization
    ///
    /// # Returns
    /// AssignmentResult with the selected trainer, a draft assignment,
    /// up to three alternatives and the utilization impact estimate
    pub fn assign_trainer(
        &self,
        request: &AssignmentRequest,
        available_trainers: Vec<TrainerProfile>,
        existing_assignments: &[TrainerAssignment],
    ) -> AssignmentResult {
        match self.run_pipeline(request, available_trainers, existing_assignments) {
            Ok(result) => result,
            Err(error) => AssignmentResult::failure(error.to_string()),
        }
    }

    fn run_pipeline(
        &self,
        request: &AssignmentRequest,
        available_trainers: Vec<TrainerProfile>,
        existing_assignments: &[TrainerAssignment],
    ) -> Result<AssignmentResult, EngineError> {
        if request.duration_minutes == 0 {
            return Err(EngineError::InvalidRequest(
                "session duration must be positive".to_string(),
            ));
        }

        // Stage 1: hard eligibility gates
        let eligible: Vec<TrainerProfile> = available_trainers
            .into_iter()
            .filter(|trainer| passes_basic_eligibility(trainer, request, &self.config))
            .collect();

        if eligible.is_empty() {
            return Err(EngineError::NoEligibleCandidates);
        }

        // Stage 2: refresh utilization for every survivor
        let mut tracker = self.tracker();
        let window = tracker.assignment_window(request.scheduled_date);
        for trainer in &eligible {
            tracker.calculate_utilization(trainer, existing_assignments, &window);
        }

        // Stage 3: capacity gate, skipped when load balancing is off
        let candidates: Vec<TrainerProfile> = if self.config.enable_load_balancing {
            eligible
                .into_iter()
                .filter(|trainer| tracker.is_available_for_assignment(&trainer.trainer_id))
                .collect()
        } else {
            eligible
        };

        if candidates.is_empty() {
            return Err(EngineError::CapacityExhausted);
        }

        // Stages 4 & 5: score and rank
        let mut ranked = self.score_candidates(request, candidates, &tracker);
        rank_candidates(&mut ranked);

        // Stage 6: selection
        let mut remaining = ranked.into_iter();
        let selected = match remaining.next() {
            Some(candidate) => candidate,
            None => return Err(EngineError::NoEligibleCandidates),
        };
        let alternatives: Vec<TrainerProfile> = remaining
            .take(MAX_ALTERNATIVES)
            .map(|candidate| candidate.trainer)
            .collect();

        // Stage 7: draft assignment
        let reason = build_assignment_reason(&selected.score);
        let assignment = build_assignment(request, &selected.trainer, &reason, &alternatives);

        // Stage 8: result assembly
        let before_utilization = tracker.utilization_pct(&selected.trainer.trainer_id);
        let utilization_impact = UtilizationImpact {
            before_utilization,
            after_utilization: (before_utilization + ASSIGNMENT_UTILIZATION_BUMP).min(100.0),
        };

        Ok(AssignmentResult {
            success: true,
            confidence: selected.score.total_score,
            trainer: Some(selected.trainer),
            assignment: Some(assignment),
            alternatives,
            reason: Some(reason),
            error: None,
            utilization_impact: Some(utilization_impact),
        })
    }

    /// Rank the pool for a read-only recommendations preview
    ///
    /// No eligibility gates and no capacity gate apply; every trainer in
    /// the pool is scored with full free capacity and the top five come
    /// back in rank order. The request's member id may be a placeholder,
    /// it is never consulted.
    pub fn get_recommendations(
        &self,
        request: &AssignmentRequest,
        available_trainers: Vec<TrainerProfile>,
    ) -> Vec<TrainerProfile> {
        let tracker = self.tracker();
        let mut ranked = self.score_candidates(request, available_trainers, &tracker);
        rank_candidates(&mut ranked);
        ranked.truncate(RECOMMENDATION_LIMIT);
        ranked
            .into_iter()
            .map(|candidate| candidate.trainer)
            .collect()
    }

    fn score_candidates(
        &self,
        request: &AssignmentRequest,
        trainers: Vec<TrainerProfile>,
        tracker: &UtilizationTracker,
    ) -> Vec<ScoredCandidate> {
        trainers
            .into_iter()
            .map(|trainer| {
                let utilization_score = tracker.utilization_score(&trainer.trainer_id);
                let score = calculate_match_score(
                    &trainer,
                    request,
                    utilization_score,
                    &self.relations,
                    &self.weights,
                );
                ScoredCandidate { trainer, score }
            })
            .collect()
    }
}

impl Default for AssignmentEngine {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Sort candidates by total score, spreading load across near-ties
///
/// The primary order is total score descending with free capacity as the
/// strict tie-break. A second pass then bubbles trainers with more free
/// capacity ahead of busier neighbours whose totals sit within
/// `NEAR_TIE_MARGIN` points. The fuzzy rule is not a total order, so it
/// runs as adjacent swaps over an already sorted slice instead of being
/// handed to the sort comparator.
pub fn rank_candidates(candidates: &mut [ScoredCandidate]) {
    candidates.sort_by(|a, b| {
        b.score
            .total_score
            .partial_cmp(&a.score.total_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| {
                b.score
                    .utilization_score
                    .partial_cmp(&a.score.utilization_score)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
    });

    for i in 1..candidates.len() {
        let mut j = i;
        while j > 0 {
            let near_tie = (candidates[j - 1].score.total_score
                - candidates[j].score.total_score)
                .abs()
                <= NEAR_TIE_MARGIN;
            if near_tie
                && candidates[j].score.utilization_score
                    > candidates[j - 1].score.utilization_score
            {
                candidates.swap(j - 1, j);
                j -= 1;
            } else {
                break;
            }
        }
    }
}

/// Human-readable rationale built from the strong score components
pub fn build_assignment_reason(score: &SkillMatchResult) -> String {
    let mut reasons: Vec<&str> = Vec::new();

    if score.specialty_score >= 80.0 {
        reasons.push("specialty expertise");
    }
    if score.rating_score >= 90.0 {
        reasons.push("excellent rating");
    }
    if score.utilization_score >= 70.0 {
        reasons.push("optimal availability");
    }
    if score.experience_score >= 80.0 {
        reasons.push("relevant experience");
    }

    if reasons.is_empty() {
        "best overall match".to_string()
    } else {
        reasons.join(", ")
    }
}

fn build_assignment(
    request: &AssignmentRequest,
    trainer: &TrainerProfile,
    reason: &str,
    alternatives: &[TrainerProfile],
) -> TrainerAssignment {
    TrainerAssignment {
        assignment_id: Uuid::new_v4().to_string(),
        trainer_id: trainer.trainer_id.clone(),
        member_id: request.member_id.clone(),
        session_type: request.storage_session_type(),
        scheduled_date: request.scheduled_date,
        duration_minutes: request.duration_minutes,
        status: AssignmentStatus::Scheduled,
        is_paid: false,
        // Single-session price; package invoicing happens downstream
        amount: trainer.hourly_rate,
        assigned_by: AssignedBy::Auto,
        assignment_reason: reason.to_string(),
        alternative_trainers: alternatives
            .iter()
            .map(|alt| alt.trainer_id.clone())
            .collect(),
        created_at: Some(Utc::now()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AvailabilitySlot, DayOfWeek, SessionType, TrainerStatus};
    use chrono::{Duration, TimeZone, Utc};

    fn create_candidate(id: &str, specialties: &[&str], rating: f64, years: u8) -> TrainerProfile {
        TrainerProfile {
            trainer_id: id.to_string(),
            name: format!("Trainer {}", id),
            branch_id: "br_1".to_string(),
            specialties: specialties.iter().map(|s| s.to_string()).collect(),
            experience_years: years,
            hourly_rate: 50.0,
            package_rates: vec![],
            availability: vec![
                AvailabilitySlot {
                    day_of_week: DayOfWeek::Monday,
                    start_time: "08:00".to_string(),
                    end_time: "18:00".to_string(),
                    is_available: true,
                },
                AvailabilitySlot {
                    day_of_week: DayOfWeek::Wednesday,
                    start_time: "08:00".to_string(),
                    end_time: "18:00".to_string(),
                    is_available: true,
                },
            ],
            max_clients_per_day: 8,
            max_clients_per_week: 40,
            rating,
            total_sessions: 100,
            total_clients: 25,
            completion_rate: 95.0,
            punctuality_score: 90.0,
            languages: vec![],
            status: TrainerStatus::Active,
            is_active: true,
            hired_at: None,
        }
    }

    fn create_request(specialty: &str) -> AssignmentRequest {
        AssignmentRequest {
            member_id: "mb_1".to_string(),
            preferred_specialty: specialty.to_string(),
            // 2026-03-02 is a Monday
            scheduled_date: Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap(),
            duration_minutes: 60,
            max_budget: None,
            preferred_trainer_id: None,
            member_preferences: None,
            session_type: None,
            priority: None,
        }
    }

    fn scored(id: &str, total: f64, utilization: f64) -> ScoredCandidate {
        ScoredCandidate {
            trainer: create_candidate(id, &["yoga"], 4.0, 5),
            score: SkillMatchResult {
                specialty_score: 0.0,
                experience_score: 0.0,
                rating_score: 0.0,
                availability_score: 0.0,
                price_score: 0.0,
                utilization_score: utilization,
                total_score: total,
            },
        }
    }

    #[test]
    fn test_assign_trainer_basic() {
        let engine = AssignmentEngine::with_defaults();
        let request = create_request("yoga");
        let trainers = vec![
            create_candidate("1", &["yoga"], 4.8, 6),
            create_candidate("2", &["boxing"], 4.9, 8),
        ];

        let result = engine.assign_trainer(&request, trainers, &[]);

        assert!(result.success);
        let trainer = result.trainer.expect("selected trainer");
        assert_eq!(trainer.trainer_id, "1");
        let assignment = result.assignment.expect("draft assignment");
        assert_eq!(assignment.trainer_id, "1");
        assert_eq!(assignment.member_id, "mb_1");
        assert_eq!(assignment.status, AssignmentStatus::Scheduled);
        assert_eq!(assignment.assigned_by, AssignedBy::Auto);
        assert_eq!(assignment.session_type, SessionType::Single);
        assert_eq!(assignment.amount, 50.0);
        assert!(!assignment.is_paid);
        assert!(result.confidence > 0.0);
    }

    #[test]
    fn test_no_eligible_candidates_message() {
        let engine = AssignmentEngine::with_defaults();
        let request = create_request("yoga");
        let trainers = vec![create_candidate("1", &["boxing"], 4.8, 6)];

        let result = engine.assign_trainer(&request, trainers, &[]);

        assert!(!result.success);
        assert_eq!(
            result.error.as_deref(),
            Some("No trainers available matching basic criteria")
        );
        assert_eq!(result.confidence, 0.0);
        assert!(result.trainer.is_none());
        assert!(result.alternatives.is_empty());
    }

    #[test]
    fn test_empty_pool_fails_cleanly() {
        let engine = AssignmentEngine::with_defaults();
        let request = create_request("yoga");

        let result = engine.assign_trainer(&request, vec![], &[]);

        assert!(!result.success);
        assert_eq!(
            result.error.as_deref(),
            Some("No trainers available matching basic criteria")
        );
    }

    #[test]
    fn test_zero_duration_is_invalid() {
        let engine = AssignmentEngine::with_defaults();
        let mut request = create_request("yoga");
        request.duration_minutes = 0;

        let result = engine.assign_trainer(&request, vec![create_candidate("1", &["yoga"], 4.0, 5)], &[]);

        assert!(!result.success);
        assert!(result.error.as_deref().unwrap().starts_with("Invalid assignment request"));
    }

    #[test]
    fn test_capacity_constraints_message() {
        let engine = AssignmentEngine::with_defaults();
        let request = create_request("yoga");
        let trainers = vec![create_candidate("1", &["yoga"], 4.8, 6)];

        // 2x10h weekly windows, 37-day window: ~105.7 available hours.
        // 100 booked hours puts the only candidate well above the 85% gate.
        let existing: Vec<TrainerAssignment> = (0..100)
            .map(|i| TrainerAssignment {
                assignment_id: format!("as_{}", i),
                trainer_id: "1".to_string(),
                member_id: "mb_x".to_string(),
                session_type: SessionType::Single,
                scheduled_date: request.scheduled_date - Duration::days(i % 28),
                duration_minutes: 60,
                status: AssignmentStatus::Scheduled,
                is_paid: false,
                amount: 50.0,
                assigned_by: AssignedBy::Auto,
                assignment_reason: String::new(),
                alternative_trainers: vec![],
                created_at: None,
            })
            .collect();

        let result = engine.assign_trainer(&request, trainers, &existing);

        assert!(!result.success);
        assert_eq!(
            result.error.as_deref(),
            Some("No trainers available due to capacity constraints")
        );
    }

    #[test]
    fn test_disabling_load_balancing_skips_capacity_gate() {
        let config = AutoAssignmentConfig {
            enable_load_balancing: false,
            ..AutoAssignmentConfig::default()
        };
        let engine = AssignmentEngine::with_defaults().with_config(config);
        let request = create_request("yoga");
        let trainers = vec![create_candidate("1", &["yoga"], 4.8, 6)];

        let existing: Vec<TrainerAssignment> = (0..100)
            .map(|i| TrainerAssignment {
                assignment_id: format!("as_{}", i),
                trainer_id: "1".to_string(),
                member_id: "mb_x".to_string(),
                session_type: SessionType::Single,
                scheduled_date: request.scheduled_date - Duration::days(i % 28),
                duration_minutes: 60,
                status: AssignmentStatus::Scheduled,
                is_paid: false,
                amount: 50.0,
                assigned_by: AssignedBy::Auto,
                assignment_reason: String::new(),
                alternative_trainers: vec![],
                created_at: None,
            })
            .collect();

        let result = engine.assign_trainer(&request, trainers, &existing);

        assert!(result.success);
    }

    #[test]
    fn test_disabling_availability_gate_keeps_day_off_trainers() {
        let config = AutoAssignmentConfig {
            require_availability: false,
            ..AutoAssignmentConfig::default()
        };
        let engine = AssignmentEngine::with_defaults().with_config(config);
        let mut request = create_request("yoga");
        // 2026-03-01 is a Sunday, outside every weekly window
        request.scheduled_date = Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap();

        let result =
            engine.assign_trainer(&request, vec![create_candidate("1", &["yoga"], 4.0, 5)], &[]);

        // Still selected; the availability component contributes nothing:
        // specialty 100, experience 50, rating 80, availability 0, price 50,
        // utilization 100 -> weighted total 71
        assert!(result.success);
        assert!((result.confidence - 71.0).abs() < 1e-9);

        // The same trainer on a working day picks up the availability points
        let monday = create_request("yoga");
        let result =
            engine.assign_trainer(&monday, vec![create_candidate("1", &["yoga"], 4.0, 5)], &[]);
        assert!((result.confidence - 81.0).abs() < 1e-9);
    }

    #[test]
    fn test_alternatives_capped_at_three() {
        let engine = AssignmentEngine::with_defaults();
        let request = create_request("yoga");
        let trainers: Vec<TrainerProfile> = (0..6)
            .map(|i| create_candidate(&format!("tr_{}", i), &["yoga"], 4.0 + (i as f64) * 0.1, 5))
            .collect();

        let result = engine.assign_trainer(&request, trainers, &[]);

        assert!(result.success);
        assert_eq!(result.alternatives.len(), 3);
        let assignment = result.assignment.unwrap();
        assert_eq!(assignment.alternative_trainers.len(), 3);
        // Alternatives are the runners-up in rank order
        let selected_id = result.trainer.unwrap().trainer_id;
        assert!(!assignment.alternative_trainers.contains(&selected_id));
    }

    #[test]
    fn test_recommendations_limit_and_order() {
        let engine = AssignmentEngine::with_defaults();
        let request = create_request("yoga");
        let trainers: Vec<TrainerProfile> = (0..10)
            .map(|i| create_candidate(&format!("tr_{}", i), &["yoga"], 3.0 + (i as f64) * 0.2, 5))
            .collect();

        let recommendations = engine.get_recommendations(&request, trainers);

        assert_eq!(recommendations.len(), RECOMMENDATION_LIMIT);
        // Highest rated first; ratings drive the only differing component
        assert_eq!(recommendations[0].trainer_id, "tr_9");
        assert_eq!(recommendations[4].trainer_id, "tr_5");
    }

    #[test]
    fn test_recommendations_skip_eligibility_gates() {
        let engine = AssignmentEngine::with_defaults();
        let request = create_request("yoga");
        // Would fail the specialty gate in assignment, still previews
        let trainers = vec![create_candidate("1", &["boxing"], 4.0, 5)];

        let recommendations = engine.get_recommendations(&request, trainers);

        assert_eq!(recommendations.len(), 1);
    }

    #[test]
    fn test_near_tie_prefers_freer_trainer() {
        let mut candidates = vec![scored("busy", 90.0, 20.0), scored("free", 87.0, 60.0)];

        rank_candidates(&mut candidates);

        assert_eq!(candidates[0].trainer.trainer_id, "free");
        assert_eq!(candidates[1].trainer.trainer_id, "busy");
    }

    #[test]
    fn test_clear_winner_not_reordered() {
        let mut candidates = vec![scored("strong", 92.0, 10.0), scored("weak", 80.0, 95.0)];

        rank_candidates(&mut candidates);

        // 12 points apart is outside the near-tie margin
        assert_eq!(candidates[0].trainer.trainer_id, "strong");
    }

    #[test]
    fn test_exact_tie_breaks_on_capacity() {
        let mut candidates = vec![scored("a", 85.0, 30.0), scored("b", 85.0, 70.0)];

        rank_candidates(&mut candidates);

        assert_eq!(candidates[0].trainer.trainer_id, "b");
    }

    #[test]
    fn test_ranking_is_deterministic() {
        let build = || {
            vec![
                scored("a", 90.0, 10.0),
                scored("b", 88.0, 50.0),
                scored("c", 85.0, 90.0),
                scored("d", 70.0, 100.0),
            ]
        };

        let mut first = build();
        let mut second = build();
        rank_candidates(&mut first);
        rank_candidates(&mut second);

        let order: Vec<&str> = first.iter().map(|c| c.trainer.trainer_id.as_str()).collect();
        let order_again: Vec<&str> = second.iter().map(|c| c.trainer.trainer_id.as_str()).collect();
        assert_eq!(order, order_again);
        // The clear loser stays last regardless of its free capacity
        assert_eq!(order[3], "d");
    }

    #[test]
    fn test_assignment_reason_phrases() {
        let score = SkillMatchResult {
            specialty_score: 100.0,
            experience_score: 50.0,
            rating_score: 96.0,
            availability_score: 100.0,
            price_score: 50.0,
            utilization_score: 40.0,
            total_score: 82.0,
        };
        assert_eq!(
            build_assignment_reason(&score),
            "specialty expertise, excellent rating"
        );

        let weak = SkillMatchResult {
            specialty_score: 40.0,
            experience_score: 50.0,
            rating_score: 60.0,
            availability_score: 0.0,
            price_score: 50.0,
            utilization_score: 50.0,
            total_score: 45.0,
        };
        assert_eq!(build_assignment_reason(&weak), "best overall match");
    }

    #[test]
    fn test_utilization_impact_estimate() {
        let engine = AssignmentEngine::with_defaults();
        let request = create_request("yoga");
        let trainers = vec![create_candidate("1", &["yoga"], 4.8, 6)];

        let result = engine.assign_trainer(&request, trainers, &[]);

        let impact = result.utilization_impact.expect("impact");
        assert_eq!(impact.before_utilization, 0.0);
        assert_eq!(impact.after_utilization, 10.0);
    }

    #[test]
    fn test_membership_session_stored_as_package() {
        let engine = AssignmentEngine::with_defaults();
        let mut request = create_request("yoga");
        request.session_type = Some(crate::models::RequestedSessionType::Membership);
        let trainers = vec![create_candidate("1", &["yoga"], 4.8, 6)];

        let result = engine.assign_trainer(&request, trainers, &[]);

        let assignment = result.assignment.unwrap();
        assert_eq!(assignment.session_type, SessionType::Package);
    }
}
