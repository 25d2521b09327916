use actix_web::{web, HttpResponse, Responder};
use validator::Validate;
use crate::models::{
    AssignTrainerRequest, AssignTrainerResponse, AssignmentStatus, AutoAssignmentConfig,
    ErrorResponse, HealthResponse, RecommendationsRequest, RecommendationsResponse,
    TrainerAssignment, TrainerProfile, TrainerUtilizationEntry, UpdateAssignmentStatusRequest,
    UpdateStatusResponse, UtilizationResponse,
};
use crate::services::{AppwriteClient, AppwriteError, CacheManager, CacheKey, PostgresClient};
use crate::core::AssignmentEngine;
use std::sync::Arc;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub appwrite: Arc<AppwriteClient>,
    pub cache: Arc<CacheManager>,
    pub postgres: Arc<PostgresClient>,
    pub engine: AssignmentEngine,
}

/// Configure all assignment-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/assignments/auto", web::post().to(auto_assign))
        .route("/assignments/recommendations", web::post().to(get_recommendations))
        .route("/assignments/{assignment_id}/status", web::post().to(update_assignment_status))
        .route("/trainers/utilization", web::get().to(get_branch_utilization))
        .route("/trainers/stats", web::get().to(get_trainer_stats));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    // Check PostgreSQL health
    let pg_healthy = state.postgres.health_check().await.unwrap_or(false);

    let status = if pg_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Resolve the engine to use for one branch
///
/// Branch owners override the deployment defaults through an Appwrite config
/// document; a missing document or an unreachable Appwrite falls back to the
/// baseline engine so assignment keeps working.
async fn engine_for_branch(state: &AppState, branch_id: &str) -> AssignmentEngine {
    let cache_key = CacheKey::assignment_config(branch_id);
    if let Ok(config) = state.cache.get::<AutoAssignmentConfig>(&cache_key).await {
        return state.engine.with_config(config);
    }

    match state.appwrite.get_assignment_config(branch_id).await {
        Ok(Some(config)) => {
            if let Err(e) = state.cache.set(&cache_key, &config).await {
                tracing::warn!("Failed to cache assignment config for {}: {}", branch_id, e);
            }
            state.engine.with_config(config)
        }
        Ok(None) => state.engine.clone(),
        Err(e) => {
            tracing::warn!(
                "Failed to fetch assignment config for {}, using defaults: {}",
                branch_id,
                e
            );
            state.engine.clone()
        }
    }
}

/// Fetch a branch's bookable trainer pool, cache-first
async fn load_trainer_pool(
    state: &AppState,
    branch_id: &str,
) -> Result<Vec<TrainerProfile>, AppwriteError> {
    let cache_key = CacheKey::trainer_pool(branch_id);
    if let Ok(pool) = state.cache.get::<Vec<TrainerProfile>>(&cache_key).await {
        tracing::debug!("Trainer pool cache hit for branch {}", branch_id);
        return Ok(pool);
    }

    let pool = state.appwrite.get_trainer_pool(branch_id).await?;
    if let Err(e) = state.cache.set(&cache_key, &pool).await {
        tracing::warn!("Failed to cache trainer pool for {}: {}", branch_id, e);
    }
    Ok(pool)
}

/// Fetch booking history for the pool over the engine's utilization window
///
/// The PostgreSQL ledger is authoritative; the Appwrite mirror is the
/// fallback when the ledger is unreachable. With neither source the engine
/// sees an empty history, which treats every trainer as fully free.
async fn load_assignment_history(
    state: &AppState,
    engine: &AssignmentEngine,
    trainers: &[TrainerProfile],
    anchor: chrono::DateTime<chrono::Utc>,
) -> Vec<TrainerAssignment> {
    let trainer_ids: Vec<String> = trainers.iter().map(|t| t.trainer_id.clone()).collect();
    let window = engine.tracker().assignment_window(anchor);

    match state.postgres.get_assignments_for_trainers(&trainer_ids, &window).await {
        Ok(rows) => rows,
        Err(e) => {
            tracing::warn!("Ledger unavailable, falling back to Appwrite history: {}", e);
            match state.appwrite.get_assignment_history(&trainer_ids, &window).await {
                Ok(docs) => docs,
                Err(e) => {
                    tracing::warn!("Appwrite history unavailable, assuming empty load: {}", e);
                    vec![]
                }
            }
        }
    }
}

/// Auto-assign endpoint
///
/// POST /api/v1/assignments/auto
///
/// Request body:
/// ```json
/// {
///   "branchId": "string",
///   "memberId": "string",
///   "preferredSpecialty": "yoga",
///   "scheduledDate": "2026-03-02T10:00:00Z",
///   "durationMinutes": 60,
///   "maxBudget": 80.0
/// }
/// ```
async fn auto_assign(
    state: web::Data<AppState>,
    req: web::Json<AssignTrainerRequest>,
    http_req: actix_web::HttpRequest,
) -> impl Responder {
    // Validate request
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for auto_assign request: field_errors={:?}", errors);
        tracing::info!("Request data: branchId={:?}, memberId={:?}, preferredSpecialty={:?}",
            req.branch_id, req.member_id, req.preferred_specialty);
        tracing::info!("Request path: {}, method: {}", http_req.path(), http_req.method());
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    tracing::info!(
        "Auto-assigning trainer for member {} at branch {}, specialty {}",
        req.member_id,
        req.branch_id,
        req.preferred_specialty
    );

    let request = req.to_assignment_request();
    let engine = engine_for_branch(&state, &req.branch_id).await;

    // Fetch the branch trainer pool
    let trainers = match load_trainer_pool(&state, &req.branch_id).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Failed to fetch trainer pool for {}: {}", req.branch_id, e);
            return HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Failed to fetch trainer pool".to_string(),
                message: e.to_string(),
                status_code: 500,
            });
        }
    };
    let total_candidates = trainers.len();

    tracing::debug!("Found {} trainers at branch {}", total_candidates, req.branch_id);

    // Booking history drives the utilization stage
    let assignments =
        load_assignment_history(&state, &engine, &trainers, request.scheduled_date).await;

    // Run the assignment pipeline
    let result = engine.assign_trainer(&request, trainers, &assignments);

    // Persist a successful assignment before answering
    if let Some(assignment) = &result.assignment {
        // The ledger write is the critical one
        if let Err(e) = state.postgres.record_assignment(assignment).await {
            tracing::error!("Failed to record assignment in ledger: {}", e);
            return HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Failed to record assignment".to_string(),
                message: e.to_string(),
                status_code: 500,
            });
        }

        // Mirror to Appwrite (best-effort, for dashboards/backup)
        if let Err(e) = state.appwrite.create_assignment(assignment).await {
            tracing::warn!("Assignment recorded in ledger but Appwrite mirror failed: {}", e);
        }

        // The branch's utilization snapshot is now stale
        let cache_key = CacheKey::utilization(&req.branch_id);
        if let Err(e) = state.cache.delete(&cache_key).await {
            tracing::warn!("Failed to invalidate utilization cache: {}", e);
        }

        tracing::info!(
            "Assigned trainer {} to member {} (confidence {:.1})",
            assignment.trainer_id,
            req.member_id,
            result.confidence
        );
    } else {
        tracing::info!(
            "No assignment for member {}: {}",
            req.member_id,
            result.error.as_deref().unwrap_or("unknown")
        );
    }

    HttpResponse::Ok().json(AssignTrainerResponse {
        result,
        total_candidates,
    })
}

/// Trainer recommendations endpoint
///
/// POST /api/v1/assignments/recommendations
///
/// Read-only preview: ranks the branch pool for a hypothetical session
/// without gating on capacity and without writing anything.
async fn get_recommendations(
    state: web::Data<AppState>,
    req: web::Json<RecommendationsRequest>,
) -> impl Responder {
    // Validate request
    if let Err(errors) = req.validate() {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    let request = req.to_assignment_request();
    let engine = engine_for_branch(&state, &req.branch_id).await;

    let trainers = match load_trainer_pool(&state, &req.branch_id).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Failed to fetch trainer pool for {}: {}", req.branch_id, e);
            return HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Failed to fetch trainer pool".to_string(),
                message: e.to_string(),
                status_code: 500,
            });
        }
    };
    let total_candidates = trainers.len();

    let recommendations = engine.get_recommendations(&request, trainers);

    tracing::info!(
        "Returning {} recommendations for branch {} (from {} trainers)",
        recommendations.len(),
        req.branch_id,
        total_candidates
    );

    HttpResponse::Ok().json(RecommendationsResponse {
        recommendations,
        total_candidates,
    })
}

/// Assignment status update endpoint
///
/// POST /api/v1/assignments/{assignment_id}/status
///
/// Moves an assignment through its lifecycle; cancelled and no-show
/// bookings stop counting against the trainer's capacity.
async fn update_assignment_status(
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: web::Json<UpdateAssignmentStatusRequest>,
) -> impl Responder {
    let assignment_id = path.into_inner();

    // Validate request
    if let Err(errors) = req.validate() {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    // Parse lifecycle status
    let status = match AssignmentStatus::parse(&req.status.to_lowercase()) {
        Some(status) => status,
        None => {
            return HttpResponse::BadRequest().json(ErrorResponse {
                error: "Invalid status".to_string(),
                message: "Status must be one of: scheduled, completed, cancelled, no_show"
                    .to_string(),
                status_code: 400,
            });
        }
    };

    match state.postgres.update_assignment_status(&assignment_id, status).await {
        Ok(true) => {
            tracing::info!("Assignment {} moved to {:?}", assignment_id, status);

            // A lifecycle change shifts booked hours somewhere; the handler
            // only knows the assignment id, so every branch snapshot goes
            if let Err(e) = state
                .cache
                .invalidate_pattern(&CacheKey::utilization_pattern())
                .await
            {
                tracing::warn!("Failed to invalidate utilization snapshots: {}", e);
            }

            HttpResponse::Ok().json(UpdateStatusResponse {
                success: true,
                assignment_id,
                status,
            })
        }
        Ok(false) => HttpResponse::NotFound().json(ErrorResponse {
            error: "Assignment not found".to_string(),
            message: format!("No assignment with id {}", assignment_id),
            status_code: 404,
        }),
        Err(e) => {
            tracing::error!("Failed to update assignment {}: {}", assignment_id, e);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Failed to update assignment".to_string(),
                message: e.to_string(),
                status_code: 500,
            })
        }
    }
}

/// Branch utilization endpoint
///
/// GET /api/v1/trainers/utilization?branchId={branchId}
///
/// Returns the current booking load per trainer, for staffing dashboards
/// and for debugging capacity-gate outcomes.
async fn get_branch_utilization(
    state: web::Data<AppState>,
    query: web::Query<std::collections::HashMap<String, String>>,
) -> impl Responder {
    let branch_id = match query.get("branchId") {
        Some(id) => id,
        None => {
            return HttpResponse::BadRequest().json(ErrorResponse {
                error: "Missing branchId parameter".to_string(),
                message: "branchId query parameter is required".to_string(),
                status_code: 400,
            });
        }
    };

    // Snapshots are cached briefly; assignment writes invalidate them
    let cache_key = CacheKey::utilization(branch_id);
    if let Ok(cached) = state.cache.get::<UtilizationResponse>(&cache_key).await {
        return HttpResponse::Ok().json(cached);
    }

    let engine = engine_for_branch(&state, branch_id).await;

    let trainers = match load_trainer_pool(&state, branch_id).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Failed to fetch trainer pool for {}: {}", branch_id, e);
            return HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Failed to fetch trainer pool".to_string(),
                message: e.to_string(),
                status_code: 500,
            });
        }
    };

    let now = chrono::Utc::now();
    let assignments = load_assignment_history(&state, &engine, &trainers, now).await;

    let mut tracker = engine.tracker();
    let window = tracker.assignment_window(now);

    let entries: Vec<TrainerUtilizationEntry> = trainers
        .iter()
        .map(|trainer| {
            let pct = tracker.calculate_utilization(trainer, &assignments, &window);
            TrainerUtilizationEntry {
                trainer_id: trainer.trainer_id.clone(),
                name: trainer.name.clone(),
                utilization_pct: pct,
                capacity_score: tracker.utilization_score(&trainer.trainer_id),
                available_for_assignment: tracker
                    .is_available_for_assignment(&trainer.trainer_id),
            }
        })
        .collect();

    let response = UtilizationResponse {
        branch_id: branch_id.clone(),
        trainers: entries,
        window_start: window.start,
        window_end: window.end,
    };

    if let Err(e) = state.cache.set(&cache_key, &response).await {
        tracing::warn!("Failed to cache utilization snapshot for {}: {}", branch_id, e);
    }

    HttpResponse::Ok().json(response)
}

/// Trainer booking stats endpoint
///
/// GET /api/v1/trainers/stats?trainerId={trainerId}
///
/// Lifetime ledger aggregates for one trainer, for profile pages and
/// payout reviews.
async fn get_trainer_stats(
    state: web::Data<AppState>,
    query: web::Query<std::collections::HashMap<String, String>>,
) -> impl Responder {
    let trainer_id = match query.get("trainerId") {
        Some(id) => id,
        None => {
            return HttpResponse::BadRequest().json(ErrorResponse {
                error: "Missing trainerId parameter".to_string(),
                message: "trainerId query parameter is required".to_string(),
                status_code: 400,
            });
        }
    };

    match state.postgres.get_trainer_booking_stats(trainer_id).await {
        Ok(stats) => {
            HttpResponse::Ok().json(serde_json::json!({
                "trainerId": stats.trainer_id,
                "totalAssignments": stats.total,
                "scheduled": stats.scheduled,
                "completed": stats.completed,
                "cancelled": stats.cancelled,
                "noShow": stats.no_show,
                "bookedMinutes": stats.booked_minutes,
                "lastScheduledAt": stats.last_scheduled_at,
            }))
        }
        Err(e) => {
            tracing::error!("Failed to fetch booking stats for {}: {}", trainer_id, e);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Failed to fetch booking stats".to_string(),
                message: e.to_string(),
                status_code: 500,
            })
        }
    }
}
