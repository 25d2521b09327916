use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use crate::models::{TrainerAssignment, TrainerProfile, UtilizationConfig};

/// Half-open time window [start, end) the tracker aggregates over
#[derive(Debug, Clone, Copy)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    /// Window spanning `lookback_days` before and `lookahead_days` after
    /// the anchor instant
    pub fn around(anchor: DateTime<Utc>, lookback_days: i64, lookahead_days: i64) -> Self {
        Self {
            start: anchor - Duration::days(lookback_days),
            end: anchor + Duration::days(lookahead_days),
        }
    }

    #[inline]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant < self.end
    }

    /// Window length in fractional days
    pub fn days(&self) -> f64 {
        (self.end - self.start).num_minutes() as f64 / (60.0 * 24.0)
    }
}

/// Cached load numbers for one trainer within one window
#[derive(Debug, Clone, Copy)]
pub struct TrainerLoad {
    pub booked_hours: f64,
    pub available_hours: f64,
    /// Busy percentage 0-100.
    pub utilization_pct: f64,
}

/// Per-call utilization cache keyed by trainer id.
///
/// Rebuilt for every assignment call; the engine refreshes each candidate
/// with `calculate_utilization` before consulting the gate or the score.
/// Two score directions live here: `utilization_pct` is how busy a trainer
/// is, `utilization_score` is the free capacity fed into scoring, so a
/// nearly idle trainer scores close to 100.
#[derive(Debug, Clone)]
pub struct UtilizationTracker {
    config: UtilizationConfig,
    /// Busy ceiling in percent; trainers at or above it are not assignable.
    max_utilization_threshold: f64,
    loads: HashMap<String, TrainerLoad>,
}

impl UtilizationTracker {
    pub fn new(config: UtilizationConfig, max_utilization_threshold: f64) -> Self {
        Self {
            config,
            max_utilization_threshold,
            loads: HashMap::new(),
        }
    }

    /// The booking window for a request anchored at `anchor`
    pub fn assignment_window(&self, anchor: DateTime<Utc>) -> DateRange {
        DateRange::around(
            anchor,
            self.config.lookback_days,
            self.config.lookahead_days,
        )
    }

    /// Recompute and cache one trainer's load; returns the busy percentage.
    ///
    /// Booked hours count only sessions that consume capacity (scheduled or
    /// completed) and fall inside the window. Available hours come from the
    /// weekly schedule prorated to the window length; profiles without any
    /// parseable window fall back to the configured weekly capacity.
    pub fn calculate_utilization(
        &mut self,
        trainer: &TrainerProfile,
        assignments: &[TrainerAssignment],
        range: &DateRange,
    ) -> f64 {
        let booked_minutes: u64 = assignments
            .iter()
            .filter(|a| a.trainer_id == trainer.trainer_id)
            .filter(|a| a.status.consumes_capacity())
            .filter(|a| range.contains(a.scheduled_date))
            .map(|a| a.duration_minutes as u64)
            .sum();
        let booked_hours = booked_minutes as f64 / 60.0;

        let mut weekly_hours = super::availability::weekly_available_hours(&trainer.availability);
        if weekly_hours <= 0.0 {
            weekly_hours = self.config.default_weekly_capacity_hours;
        }
        let available_hours = weekly_hours * (range.days() / 7.0);

        // Overbooked trainers cap at 100 instead of exceeding the scale
        let utilization_pct = if available_hours > 0.0 {
            ((booked_hours / available_hours) * 100.0).clamp(0.0, 100.0)
        } else {
            100.0
        };

        self.loads.insert(
            trainer.trainer_id.clone(),
            TrainerLoad {
                booked_hours,
                available_hours,
                utilization_pct,
            },
        );

        utilization_pct
    }

    /// Busy percentage 0-100; a trainer never calculated counts as idle
    #[inline]
    pub fn utilization_pct(&self, trainer_id: &str) -> f64 {
        self.loads
            .get(trainer_id)
            .map(|load| load.utilization_pct)
            .unwrap_or(0.0)
    }

    /// Free-capacity score 0-100 fed into the scoring weights; higher
    /// means more open slots
    #[inline]
    pub fn utilization_score(&self, trainer_id: &str) -> f64 {
        100.0 - self.utilization_pct(trainer_id)
    }

    /// Capacity gate: true while the trainer sits below the busy ceiling
    #[inline]
    pub fn is_available_for_assignment(&self, trainer_id: &str) -> bool {
        self.utilization_pct(trainer_id) < self.max_utilization_threshold
    }

    /// Raw load numbers, when the trainer has been calculated
    pub fn load(&self, trainer_id: &str) -> Option<&TrainerLoad> {
        self.loads.get(trainer_id)
    }
}
