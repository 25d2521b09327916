use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use crate::core::utilization::DateRange;
use crate::models::{AutoAssignmentConfig, TrainerAssignment, TrainerProfile};

/// Errors that can occur when interacting with Appwrite
#[derive(Debug, Error)]
pub enum AppwriteError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: invalid API key or token")]
    Unauthorized,

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Appwrite API client
///
/// Handles all communication with the hosted backend including:
/// - Fetching a branch's trainer pool
/// - Fetching assignment history and tenant assignment policies
/// - Mirroring newly created assignments
pub struct AppwriteClient {
    base_url: String,
    api_key: String,
    project_id: String,
    database_id: String,
    client: Client,
    collections: AppwriteCollections,
}

/// Collection IDs in Appwrite
#[derive(Debug, Clone)]
pub struct AppwriteCollections {
    pub trainer_profiles: String,
    pub trainer_assignments: String,
    pub assignment_configs: String,
}

impl AppwriteClient {
    /// Create a new Appwrite client
    pub fn new(
        base_url: String,
        api_key: String,
        project_id: String,
        database_id: String,
        collections: AppwriteCollections,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url,
            api_key,
            project_id,
            database_id,
            client,
            collections,
        }
    }

    fn collection_url(&self, collection: &str) -> String {
        format!(
            "{}/databases/{}/collections/{}/documents",
            self.base_url.trim_end_matches('/'),
            self.database_id,
            collection
        )
    }

    fn check_status(response: &reqwest::Response, context: &str) -> Result<(), AppwriteError> {
        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(AppwriteError::Unauthorized);
        }
        if !status.is_success() {
            return Err(AppwriteError::ApiError(format!("{}: {}", context, status)));
        }
        Ok(())
    }

    /// Fetch the bookable trainer pool for one branch
    pub async fn get_trainer_pool(
        &self,
        branch_id: &str,
    ) -> Result<Vec<TrainerProfile>, AppwriteError> {
        // Build Appwrite queries
        let queries = vec![
            format!("equal(\"branchId\", \"{}\")", branch_id),
            "equal(\"isActive\", true)".to_string(),
            "equal(\"status\", \"active\")".to_string(),
        ];

        let queries_json = serde_json::to_string(&queries).unwrap();
        let encoded_queries = urlencoding::encode(&queries_json);
        let full_url = format!(
            "{}?query={}",
            self.collection_url(&self.collections.trainer_profiles),
            encoded_queries
        );

        tracing::debug!("Fetching trainer pool from: {}", full_url);

        let response = self
            .client
            .get(&full_url)
            .header("X-Appwrite-Key", &self.api_key)
            .header("X-Appwrite-Project", &self.project_id)
            .send()
            .await?;

        Self::check_status(&response, "Failed to fetch trainer pool")?;

        let json: Value = response.json().await?;

        let total = json.get("total").and_then(|t| t.as_u64()).unwrap_or(0);

        let documents = json
            .get("documents")
            .and_then(|d| d.as_array())
            .ok_or_else(|| AppwriteError::InvalidResponse("Missing documents array".into()))?;

        // Malformed documents are skipped rather than failing the pool
        let trainers: Vec<TrainerProfile> = documents
            .iter()
            .filter_map(|doc| {
                let data = doc.get("data").unwrap_or(doc);
                serde_json::from_value(data.clone()).ok()
            })
            .filter(|t: &TrainerProfile| t.branch_id == branch_id)
            .collect();

        tracing::debug!(
            "Fetched {} trainers for branch {} (total: {})",
            trainers.len(),
            branch_id,
            total
        );

        Ok(trainers)
    }

    /// Fetch mirrored assignment history for a set of trainers within a window
    pub async fn get_assignment_history(
        &self,
        trainer_ids: &[String],
        range: &DateRange,
    ) -> Result<Vec<TrainerAssignment>, AppwriteError> {
        if trainer_ids.is_empty() {
            return Ok(Vec::new());
        }

        let trainer_filter = trainer_ids
            .iter()
            .map(|id| format!("\"{}\"", id))
            .collect::<Vec<_>>()
            .join(",");
        let queries = vec![
            format!("in(\"trainerId\", [{}])", trainer_filter),
            format!(
                "greaterThanEqual(\"scheduledDate\", \"{}\")",
                range.start.to_rfc3339()
            ),
            format!("lessThan(\"scheduledDate\", \"{}\")", range.end.to_rfc3339()),
        ];

        let queries_json = serde_json::to_string(&queries).unwrap();
        let encoded_queries = urlencoding::encode(&queries_json);
        let full_url = format!(
            "{}?query={}",
            self.collection_url(&self.collections.trainer_assignments),
            encoded_queries
        );

        let response = self
            .client
            .get(&full_url)
            .header("X-Appwrite-Key", &self.api_key)
            .header("X-Appwrite-Project", &self.project_id)
            .send()
            .await?;

        Self::check_status(&response, "Failed to fetch assignment history")?;

        let json: Value = response.json().await?;

        let documents = json
            .get("documents")
            .and_then(|d| d.as_array())
            .ok_or_else(|| AppwriteError::InvalidResponse("Missing documents array".into()))?;

        let assignments: Vec<TrainerAssignment> = documents
            .iter()
            .filter_map(|doc| {
                let data = doc.get("data").unwrap_or(doc);
                serde_json::from_value(data.clone()).ok()
            })
            .collect();

        tracing::debug!(
            "Fetched {} mirrored assignments for {} trainers",
            assignments.len(),
            trainer_ids.len()
        );

        Ok(assignments)
    }

    /// Fetch the tenant assignment policy for a branch, None when the
    /// branch has not configured one
    pub async fn get_assignment_config(
        &self,
        branch_id: &str,
    ) -> Result<Option<AutoAssignmentConfig>, AppwriteError> {
        let queries = vec![format!("equal(\"branchId\", \"{}\")", branch_id)];
        let queries_json = serde_json::to_string(&queries).unwrap();
        let encoded_queries = urlencoding::encode(&queries_json);
        let full_url = format!(
            "{}?query={}",
            self.collection_url(&self.collections.assignment_configs),
            encoded_queries
        );

        tracing::debug!("Fetching assignment config for branch: {}", branch_id);

        let response = self
            .client
            .get(&full_url)
            .header("X-Appwrite-Key", &self.api_key)
            .header("X-Appwrite-Project", &self.project_id)
            .send()
            .await?;

        Self::check_status(&response, "Failed to fetch assignment config")?;

        let json: Value = response.json().await?;

        let documents = json
            .get("documents")
            .and_then(|d| d.as_array())
            .ok_or_else(|| AppwriteError::InvalidResponse("Missing documents array".into()))?;

        let doc = match documents.first() {
            Some(doc) => doc,
            None => return Ok(None),
        };

        let data = doc.get("data").unwrap_or(doc);

        serde_json::from_value(data.clone())
            .map(Some)
            .map_err(|e| {
                AppwriteError::InvalidResponse(format!("Failed to parse assignment config: {}", e))
            })
    }

    /// Mirror a newly created assignment
    ///
    /// The document id reuses the assignment id, so replays of the same
    /// assignment conflict instead of duplicating.
    pub async fn create_assignment(
        &self,
        assignment: &TrainerAssignment,
    ) -> Result<(), AppwriteError> {
        let url = self.collection_url(&self.collections.trainer_assignments);

        let mut payload = serde_json::to_value(assignment).unwrap();
        // Add Appwrite-specific fields
        if let Some(obj) = payload.as_object_mut() {
            obj.insert(
                "$id".to_string(),
                Value::String(assignment.assignment_id.clone()),
            );
        }

        let response = self
            .client
            .post(&url)
            .header("X-Appwrite-Key", &self.api_key)
            .header("X-Appwrite-Project", &self.project_id)
            .json(&payload)
            .send()
            .await?;

        Self::check_status(&response, "Failed to mirror assignment")?;

        tracing::debug!(
            "Mirrored assignment {} for trainer {}",
            assignment.assignment_id,
            assignment.trainer_id
        );

        Ok(())
    }
}
