// Integration tests for RepSet Algo

use repset_algo::core::AssignmentEngine;
use repset_algo::models::{
    AssignTrainerRequest, AssignedBy, AssignmentRequest, AssignmentStatus, AutoAssignmentConfig,
    AvailabilitySlot, DayOfWeek, MemberPreferences, SessionType, TrainerAssignment,
    TrainerProfile, TrainerStatus,
};
use chrono::{Duration, TimeZone, Utc};

fn create_test_trainer(
    id: &str,
    specialties: &[&str],
    rating: f64,
    years: u8,
    hourly_rate: f64,
) -> TrainerProfile {
    TrainerProfile {
        trainer_id: id.to_string(),
        name: format!("Trainer {}", id),
        branch_id: "br_downtown".to_string(),
        specialties: specialties.iter().map(|s| s.to_string()).collect(),
        experience_years: years,
        hourly_rate,
        package_rates: vec![],
        availability: vec![
            AvailabilitySlot {
                day_of_week: DayOfWeek::Monday,
                start_time: "08:00".to_string(),
                end_time: "16:00".to_string(),
                is_available: true,
            },
            AvailabilitySlot {
                day_of_week: DayOfWeek::Thursday,
                start_time: "10:00".to_string(),
                end_time: "20:00".to_string(),
                is_available: true,
            },
        ],
        max_clients_per_day: 8,
        max_clients_per_week: 40,
        rating,
        total_sessions: 200,
        total_clients: 30,
        completion_rate: 95.0,
        punctuality_score: 90.0,
        languages: vec!["en".to_string()],
        status: TrainerStatus::Active,
        is_active: true,
        hired_at: None,
    }
}

fn create_test_request(specialty: &str) -> AssignmentRequest {
    AssignmentRequest {
        member_id: "mb_500".to_string(),
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

fn create_booking(trainer_id: &str, idx: i64, date: chrono::DateTime<Utc>) -> TrainerAssignment {
    TrainerAssignment {
        assignment_id: format!("as_{}_{}", trainer_id, idx),
        trainer_id: trainer_id.to_string(),
        member_id: "mb_other".to_string(),
        session_type: SessionType::Single,
        scheduled_date: date,
        duration_minutes: 60,
        status: AssignmentStatus::Scheduled,
        is_paid: true,
        amount: 60.0,
        assigned_by: AssignedBy::Auto,
        assignment_reason: String::new(),
        alternative_trainers: vec![],
        created_at: None,
    }
}

#[test]
fn test_end_to_end_assignment() {
    let engine = AssignmentEngine::with_defaults();
    let request = create_test_request("yoga");

    let trainers = vec![
        create_test_trainer("best", &["yoga", "pilates"], 4.9, 8, 60.0),
        create_test_trainer("second", &["pilates", "yoga"], 4.7, 6, 60.0),
        create_test_trainer("wrong_specialty", &["boxing"], 5.0, 12, 60.0),
        create_test_trainer("low_rated", &["yoga"], 3.2, 2, 60.0),
    ];

    let result = engine.assign_trainer(&request, trainers, &[]);

    assert!(result.success);
    let trainer = result.trainer.expect("selected trainer");
    assert_eq!(trainer.trainer_id, "best");

    // The boxing trainer never entered the ranking
    assert!(result
        .alternatives
        .iter()
        .all(|alt| alt.trainer_id != "wrong_specialty"));

    let assignment = result.assignment.expect("draft assignment");
    assert_eq!(assignment.member_id, "mb_500");
    assert_eq!(assignment.status, AssignmentStatus::Scheduled);
    assert_eq!(assignment.assigned_by, AssignedBy::Auto);
    assert!(!assignment.assignment_reason.is_empty());
    assert!(result.confidence > 50.0);
}

#[test]
fn test_budget_shifts_the_ranking() {
    let engine = AssignmentEngine::with_defaults();
    let mut request = create_test_request("yoga");
    request.max_budget = Some(80.0);

    // Identical apart from price: 40/h is well under budget, 100/h is over
    let trainers = vec![
        create_test_trainer("pricey", &["yoga"], 4.5, 5, 100.0),
        create_test_trainer("affordable", &["yoga"], 4.5, 5, 40.0),
    ];

    let result = engine.assign_trainer(&request, trainers, &[]);

    assert!(result.success);
    assert_eq!(result.trainer.unwrap().trainer_id, "affordable");
    // Over-budget trainers are down-ranked, not dropped
    assert_eq!(result.alternatives.len(), 1);
    assert_eq!(result.alternatives[0].trainer_id, "pricey");
}

#[test]
fn test_near_tie_spreads_load() {
    let engine = AssignmentEngine::with_defaults();
    let request = create_test_request("yoga");

    // The higher-rated trainer carries ~30 booked hours in the window;
    // the gap in raw totals stays inside the near-tie margin, so the
    // freer trainer wins the slot.
    let trainers = vec![
        create_test_trainer("busy_star", &["yoga"], 5.0, 5, 60.0),
        create_test_trainer("fresh", &["yoga"], 4.0, 5, 60.0),
    ];

    let existing: Vec<TrainerAssignment> = (0..30)
        .map(|i| {
            create_booking(
                "busy_star",
                i,
                request.scheduled_date - Duration::days(i % 25),
            )
        })
        .collect();

    let result = engine.assign_trainer(&request, trainers, &existing);

    assert!(result.success);
    assert_eq!(result.trainer.unwrap().trainer_id, "fresh");
    assert_eq!(result.alternatives[0].trainer_id, "busy_star");
}

#[test]
fn test_fully_booked_branch_reports_capacity() {
    let engine = AssignmentEngine::with_defaults();
    let request = create_test_request("yoga");

    let trainers = vec![create_test_trainer("swamped", &["yoga"], 4.8, 7, 60.0)];

    // ~90 booked hours against ~95 available pushes utilization past 85%
    let existing: Vec<TrainerAssignment> = (0..90)
        .map(|i| {
            create_booking(
                "swamped",
                i,
                request.scheduled_date - Duration::days(i % 28),
            )
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
fn test_overloaded_trainer_loses_to_free_colleague() {
    let engine = AssignmentEngine::with_defaults();
    let request = create_test_request("yoga");

    let trainers = vec![
        create_test_trainer("swamped", &["yoga"], 5.0, 10, 60.0),
        create_test_trainer("open", &["yoga"], 4.0, 4, 60.0),
    ];

    let existing: Vec<TrainerAssignment> = (0..90)
        .map(|i| {
            create_booking(
                "swamped",
                i,
                request.scheduled_date - Duration::days(i % 28),
            )
        })
        .collect();

    let result = engine.assign_trainer(&request, trainers, &existing);

    assert!(result.success);
    assert_eq!(result.trainer.unwrap().trainer_id, "open");
    // The gated trainer is not offered as an alternative either
    assert!(result.alternatives.is_empty());
}

#[test]
fn test_avoid_list_excludes_trainer() {
    let engine = AssignmentEngine::with_defaults();
    let mut request = create_test_request("yoga");
    request.member_preferences = Some(MemberPreferences {
        preferred_experience: None,
        languages: vec![],
        avoid_trainer_ids: vec!["unwanted".to_string()],
    });

    let trainers = vec![
        create_test_trainer("unwanted", &["yoga"], 5.0, 10, 60.0),
        create_test_trainer("acceptable", &["yoga"], 4.0, 4, 60.0),
    ];

    let result = engine.assign_trainer(&request, trainers, &[]);

    assert!(result.success);
    assert_eq!(result.trainer.unwrap().trainer_id, "acceptable");
}

#[test]
fn test_related_specialty_fallback_when_gate_is_off() {
    let request = create_test_request("yoga");
    let trainers = vec![create_test_trainer("adjacent", &["pilates"], 4.6, 6, 60.0)];

    // Default policy requires an exact specialty listing
    let strict = AssignmentEngine::with_defaults();
    let result = strict.assign_trainer(&request, trainers.clone(), &[]);
    assert!(!result.success);
    assert_eq!(
        result.error.as_deref(),
        Some("No trainers available matching basic criteria")
    );

    // Relaxing the gate lets the related specialty through at a discount
    let relaxed = strict.with_config(AutoAssignmentConfig {
        require_specialty_match: false,
        ..AutoAssignmentConfig::default()
    });
    let result = relaxed.assign_trainer(&request, trainers, &[]);
    assert!(result.success);
    assert_eq!(result.trainer.unwrap().trainer_id, "adjacent");
}

#[test]
fn test_recommendations_preview_is_read_only_ranking() {
    let engine = AssignmentEngine::with_defaults();
    let request = create_test_request("yoga");

    let trainers: Vec<TrainerProfile> = (0..8)
        .map(|i| {
            create_test_trainer(
                &format!("tr_{}", i),
                &["yoga"],
                3.0 + (i as f64) * 0.25,
                5,
                60.0,
            )
        })
        .collect();

    let recommendations = engine.get_recommendations(&request, trainers);

    assert_eq!(recommendations.len(), 5);
    assert_eq!(recommendations[0].trainer_id, "tr_7");
    // Strictly descending by rating, the only differing component
    for pair in recommendations.windows(2) {
        assert!(pair[0].rating > pair[1].rating);
    }
}

#[test]
fn test_assign_request_json_contract() {
    // Clients send camelCase; older internal callers still send snake_case
    let camel = serde_json::json!({
        "branchId": "br_downtown",
        "memberId": "mb_500",
        "preferredSpecialty": "yoga",
        "scheduledDate": "2026-03-02T10:00:00Z",
        "durationMinutes": 90,
        "maxBudget": 75.0
    });
    let parsed: AssignTrainerRequest = serde_json::from_value(camel).unwrap();
    assert_eq!(parsed.branch_id, "br_downtown");
    assert_eq!(parsed.duration_minutes, 90);

    let snake = serde_json::json!({
        "branch_id": "br_downtown",
        "member_id": "mb_500",
        "preferred_specialty": "yoga",
        "scheduled_date": "2026-03-02T10:00:00Z"
    });
    let parsed: AssignTrainerRequest = serde_json::from_value(snake).unwrap();
    // Duration falls back to the default session length
    assert_eq!(parsed.duration_minutes, 60);

    let request = parsed.to_assignment_request();
    assert_eq!(request.member_id, "mb_500");
    assert_eq!(request.preferred_specialty, "yoga");
}
