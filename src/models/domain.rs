use serde::{Deserialize, Serialize};

/// Lifecycle state of a trainer profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainerStatus {
    Active,
    Inactive,
    OnLeave,
    Suspended,
}

/// Day tag for weekly availability windows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl From<chrono::Weekday> for DayOfWeek {
    fn from(weekday: chrono::Weekday) -> Self {
        match weekday {
            chrono::Weekday::Mon => DayOfWeek::Monday,
            chrono::Weekday::Tue => DayOfWeek::Tuesday,
            chrono::Weekday::Wed => DayOfWeek::Wednesday,
            chrono::Weekday::Thu => DayOfWeek::Thursday,
            chrono::Weekday::Fri => DayOfWeek::Friday,
            chrono::Weekday::Sat => DayOfWeek::Saturday,
            chrono::Weekday::Sun => DayOfWeek::Sunday,
        }
    }
}

/// One weekly bookable window, times in "HH:MM"
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilitySlot {
    #[serde(rename = "dayOfWeek")]
    pub day_of_week: DayOfWeek,
    #[serde(rename = "startTime")]
    pub start_time: String,
    #[serde(rename = "endTime")]
    pub end_time: String,
    #[serde(rename = "isAvailable", default = "default_true")]
    pub is_available: bool,
}

/// Discounted multi-session rate tier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageRate {
    pub sessions: u32,
    /// Total package price, not per session.
    pub rate: f64,
}

/// Trainer profile as stored in the hosted backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainerProfile {
    #[serde(rename = "trainerId")]
    pub trainer_id: String,
    pub name: String,
    #[serde(rename = "branchId")]
    pub branch_id: String,
    /// Ordered; index 0 is the primary specialty.
    #[serde(default)]
    pub specialties: Vec<String>,
    #[serde(rename = "experienceYears", default)]
    pub experience_years: u8,
    /// Currency per hour.
    #[serde(rename = "hourlyRate")]
    pub hourly_rate: f64,
    #[serde(rename = "packageRates", default)]
    pub package_rates: Vec<PackageRate>,
    #[serde(default)]
    pub availability: Vec<AvailabilitySlot>,
    #[serde(rename = "maxClientsPerDay", default)]
    pub max_clients_per_day: u8,
    #[serde(rename = "maxClientsPerWeek", default)]
    pub max_clients_per_week: u8,
    /// 0-5 scale.
    #[serde(default)]
    pub rating: f64,
    #[serde(rename = "totalSessions", default)]
    pub total_sessions: u32,
    #[serde(rename = "totalClients", default)]
    pub total_clients: u32,
    /// Percentage 0-100.
    #[serde(rename = "completionRate", default)]
    pub completion_rate: f64,
    /// Percentage 0-100.
    #[serde(rename = "punctualityScore", default)]
    pub punctuality_score: f64,
    #[serde(default)]
    pub languages: Vec<String>,
    pub status: TrainerStatus,
    #[serde(rename = "isActive", default = "default_true")]
    pub is_active: bool,
    #[serde(rename = "hiredAt", default)]
    pub hired_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl TrainerProfile {
    /// First listed specialty, when any are listed.
    pub fn primary_specialty(&self) -> Option<&str> {
        self.specialties.first().map(String::as_str)
    }

    /// Both the status enum and the lifecycle flag must agree.
    pub fn is_bookable(&self) -> bool {
        self.is_active && self.status == TrainerStatus::Active
    }
}

fn default_true() -> bool { true }

/// Session kind as stored; membership bookings collapse to `Package`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionType {
    Single,
    Package,
}

impl SessionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionType::Single => "single",
            SessionType::Package => "package",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "single" => Some(SessionType::Single),
            "package" => Some(SessionType::Package),
            _ => None,
        }
    }
}

/// Session kind as requested by the member-facing surfaces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestedSessionType {
    Single,
    Package,
    Membership,
}

impl RequestedSessionType {
    /// Storage mapping: membership collapses to package, the rest pass through.
    pub fn storage_type(self) -> SessionType {
        match self {
            RequestedSessionType::Single => SessionType::Single,
            RequestedSessionType::Package | RequestedSessionType::Membership => SessionType::Package,
        }
    }
}

/// Booking outcome state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    Scheduled,
    Completed,
    Cancelled,
    NoShow,
}

impl AssignmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentStatus::Scheduled => "scheduled",
            AssignmentStatus::Completed => "completed",
            AssignmentStatus::Cancelled => "cancelled",
            AssignmentStatus::NoShow => "no_show",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "scheduled" => Some(AssignmentStatus::Scheduled),
            "completed" => Some(AssignmentStatus::Completed),
            "cancelled" => Some(AssignmentStatus::Cancelled),
            "no_show" => Some(AssignmentStatus::NoShow),
            _ => None,
        }
    }

    /// Whether booked hours in this state count against capacity.
    pub fn consumes_capacity(&self) -> bool {
        matches!(self, AssignmentStatus::Scheduled | AssignmentStatus::Completed)
    }
}

/// How an assignment came to exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignedBy {
    Auto,
    Manual,
    MemberRequest,
}

impl AssignedBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignedBy::Auto => "auto",
            AssignedBy::Manual => "manual",
            AssignedBy::MemberRequest => "member_request",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "auto" => Some(AssignedBy::Auto),
            "manual" => Some(AssignedBy::Manual),
            "member_request" => Some(AssignedBy::MemberRequest),
            _ => None,
        }
    }
}

/// A scheduled or completed booking between a trainer and a member
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainerAssignment {
    #[serde(rename = "assignmentId")]
    pub assignment_id: String,
    #[serde(rename = "trainerId")]
    pub trainer_id: String,
    #[serde(rename = "memberId")]
    pub member_id: String,
    #[serde(rename = "sessionType")]
    pub session_type: SessionType,
    #[serde(rename = "scheduledDate")]
    pub scheduled_date: chrono::DateTime<chrono::Utc>,
    #[serde(rename = "durationMinutes")]
    pub duration_minutes: u32,
    pub status: AssignmentStatus,
    #[serde(rename = "isPaid", default)]
    pub is_paid: bool,
    pub amount: f64,
    #[serde(rename = "assignedBy")]
    pub assigned_by: AssignedBy,
    #[serde(rename = "assignmentReason", default)]
    pub assignment_reason: String,
    #[serde(rename = "alternativeTrainers", default)]
    pub alternative_trainers: Vec<String>,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Member's experience preference for their trainer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceTier {
    BeginnerFriendly,
    Experienced,
    Expert,
    Any,
}

/// Request priority, carried for audit but never scored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Normal,
    High,
    Urgent,
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Normal
    }
}

/// Soft preferences attached to an assignment request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemberPreferences {
    #[serde(rename = "preferredExperience", default)]
    pub preferred_experience: Option<ExperienceTier>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(rename = "avoidTrainerIds", default)]
    pub avoid_trainer_ids: Vec<String>,
}

/// Input to one assignment call; constructed per request, never persisted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentRequest {
    #[serde(rename = "memberId")]
    pub member_id: String,
    #[serde(rename = "preferredSpecialty")]
    pub preferred_specialty: String,
    #[serde(rename = "scheduledDate")]
    pub scheduled_date: chrono::DateTime<chrono::Utc>,
    #[serde(rename = "durationMinutes")]
    pub duration_minutes: u32,
    /// Currency per hour, compared against hourly rates.
    #[serde(rename = "maxBudget", default)]
    pub max_budget: Option<f64>,
    #[serde(rename = "preferredTrainerId", default)]
    pub preferred_trainer_id: Option<String>,
    #[serde(rename = "memberPreferences", default)]
    pub member_preferences: Option<MemberPreferences>,
    #[serde(rename = "sessionType", default)]
    pub session_type: Option<RequestedSessionType>,
    #[serde(default)]
    pub priority: Option<Priority>,
}

impl AssignmentRequest {
    /// Trainer ids the member refuses; empty when no preferences are attached.
    pub fn avoid_list(&self) -> &[String] {
        self.member_preferences
            .as_ref()
            .map(|prefs| prefs.avoid_trainer_ids.as_slice())
            .unwrap_or(&[])
    }

    pub fn preferred_experience(&self) -> Option<ExperienceTier> {
        self.member_preferences
            .as_ref()
            .and_then(|prefs| prefs.preferred_experience)
    }

    /// Session type as it will be stored; defaults to `single`.
    pub fn storage_session_type(&self) -> SessionType {
        self.session_type
            .map(RequestedSessionType::storage_type)
            .unwrap_or(SessionType::Single)
    }
}

/// Tenant policy controlling eligibility gates and thresholds.
/// Immutable for the duration of a call once handed to the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoAssignmentConfig {
    #[serde(rename = "requireSpecialtyMatch", default = "default_true")]
    pub require_specialty_match: bool,
    #[serde(rename = "requireAvailability", default = "default_true")]
    pub require_availability: bool,
    /// 0-5 scale.
    #[serde(rename = "minRatingThreshold", default)]
    pub min_rating_threshold: Option<f64>,
    /// Whole years.
    #[serde(rename = "minExperienceThreshold", default)]
    pub min_experience_threshold: Option<u8>,
    /// Currency per hour.
    #[serde(rename = "maxPriceThreshold", default)]
    pub max_price_threshold: Option<f64>,
    #[serde(rename = "enableLoadBalancing", default = "default_true")]
    pub enable_load_balancing: bool,
    /// Busy percentage 0-100; trainers at or above it are not assignable.
    #[serde(rename = "maxUtilizationThreshold", default = "default_max_utilization")]
    pub max_utilization_threshold: f64,
}

impl Default for AutoAssignmentConfig {
    fn default() -> Self {
        Self {
            require_specialty_match: true,
            require_availability: true,
            min_rating_threshold: None,
            min_experience_threshold: None,
            max_price_threshold: None,
            enable_load_balancing: true,
            max_utilization_threshold: default_max_utilization(),
        }
    }
}

fn default_max_utilization() -> f64 { 85.0 }

/// Policy for the utilization window computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UtilizationConfig {
    /// Days of history included in the window.
    #[serde(rename = "lookbackDays", default = "default_lookback_days")]
    pub lookback_days: i64,
    /// Days of future bookings included.
    #[serde(rename = "lookaheadDays", default = "default_lookahead_days")]
    pub lookahead_days: i64,
    /// Weekly hours assumed for profiles with no usable availability windows.
    #[serde(rename = "defaultWeeklyCapacityHours", default = "default_weekly_capacity")]
    pub default_weekly_capacity_hours: f64,
}

impl Default for UtilizationConfig {
    fn default() -> Self {
        Self {
            lookback_days: default_lookback_days(),
            lookahead_days: default_lookahead_days(),
            default_weekly_capacity_hours: default_weekly_capacity(),
        }
    }
}

fn default_lookback_days() -> i64 { 30 }
fn default_lookahead_days() -> i64 { 7 }
fn default_weekly_capacity() -> f64 { 40.0 }

/// Scoring weights in percentage points; they should sum to 100
#[derive(Debug, Clone, Copy)]
pub struct ScoringWeights {
    pub specialty: f64,
    pub experience: f64,
    pub rating: f64,
    pub availability: f64,
    pub price: f64,
    pub utilization: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            specialty: 30.0,
            experience: 20.0,
            rating: 20.0,
            availability: 10.0,
            price: 10.0,
            utilization: 10.0,
        }
    }
}

/// Per-trainer score breakdown, each component 0-100.
/// Lives only for the duration of one assignment call.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SkillMatchResult {
    #[serde(rename = "specialtyScore")]
    pub specialty_score: f64,
    #[serde(rename = "experienceScore")]
    pub experience_score: f64,
    #[serde(rename = "ratingScore")]
    pub rating_score: f64,
    #[serde(rename = "availabilityScore")]
    pub availability_score: f64,
    #[serde(rename = "priceScore")]
    pub price_score: f64,
    /// Free-capacity score: higher means more open slots.
    #[serde(rename = "utilizationScore")]
    pub utilization_score: f64,
    #[serde(rename = "totalScore")]
    pub total_score: f64,
}

/// Busy-percentage estimate around one new booking
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct UtilizationImpact {
    #[serde(rename = "beforeUtilization")]
    pub before_utilization: f64,
    #[serde(rename = "afterUtilization")]
    pub after_utilization: f64,
}

/// Tagged outcome of one assignment call. The engine never returns an error
/// to its caller; every failure path resolves to `success: false` here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trainer: Option<TrainerProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignment: Option<TrainerAssignment>,
    #[serde(default)]
    pub alternatives: Vec<TrainerProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Total score of the selected trainer; 0 on failure.
    pub confidence: f64,
    #[serde(rename = "utilizationImpact", default, skip_serializing_if = "Option::is_none")]
    pub utilization_impact: Option<UtilizationImpact>,
}

impl AssignmentResult {
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            trainer: None,
            assignment: None,
            alternatives: Vec::new(),
            reason: None,
            error: Some(error.into()),
            confidence: 0.0,
            utilization_impact: None,
        }
    }
}
