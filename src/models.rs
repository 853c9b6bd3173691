use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    pub id: Uuid,
    pub club_id: Uuid,
    pub name: String,
    pub event_type: String,
    pub recurring_event_id: Option<Uuid>,
    pub start_at: DateTime<Utc>,
}

impl EventRecord {
    /// Total order of events within a club: start time, then id.
    pub fn sort_key(&self) -> (DateTime<Utc>, Uuid) {
        (self.start_at, self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollRecord {
    pub id: Uuid,
    pub club_id: Uuid,
    pub event_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionRecord {
    pub id: Uuid,
    pub poll_id: Uuid,
    pub user_id: Uuid,
}

/// Everything stored for one club, read at a single point in time.
#[derive(Debug, Clone, Default)]
pub struct ClubSnapshot {
    pub club_id: Uuid,
    pub events: Vec<EventRecord>,
    pub polls: Vec<PollRecord>,
    pub submissions: Vec<SubmissionRecord>,
    pub members: HashSet<Uuid>,
}

impl ClubSnapshot {
    pub fn event(&self, event_id: Uuid) -> Option<&EventRecord> {
        self.events
            .iter()
            .find(|event| event.id == event_id && event.club_id == self.club_id)
    }

    pub fn poll_for_event(&self, event_id: Uuid) -> Option<&PollRecord> {
        self.polls
            .iter()
            .find(|poll| poll.event_id == event_id && poll.club_id == self.club_id)
    }

    /// Distinct users that submitted to `poll_id`.
    pub fn attendees(&self, poll_id: Uuid) -> HashSet<Uuid> {
        self.submissions
            .iter()
            .filter(|submission| submission.poll_id == poll_id)
            .map(|submission| submission.user_id)
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EngagementTotals {
    pub users_total: u64,
    pub members_total: u64,
    pub returning_total: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TotalsDiff {
    pub users_total: f64,
    pub members_total: f64,
    pub returning_total: f64,
}

impl TotalsDiff {
    pub fn between(current: &EngagementTotals, previous: &EngagementTotals) -> Self {
        Self {
            users_total: current.users_total as f64 - previous.users_total as f64,
            members_total: current.members_total as f64 - previous.members_total as f64,
            returning_total: current.returning_total as f64 - previous.returning_total as f64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviousOccurrence {
    pub event_id: Uuid,
    pub start_at: DateTime<Utc>,
    #[serde(flatten)]
    pub totals: EngagementTotals,
    pub diffs: TotalsDiff,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PeerAverages {
    pub peer_count: usize,
    pub users_avg: Option<f64>,
    pub members_avg: Option<f64>,
    pub returning_avg: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct BaselineDiff {
    pub users_total: Option<f64>,
    pub members_total: Option<f64>,
    pub returning_total: Option<f64>,
}

impl BaselineDiff {
    pub fn between(current: &EngagementTotals, averages: &PeerAverages) -> Self {
        let diff = |value: u64, avg: Option<f64>| avg.map(|avg| value as f64 - avg);
        Self {
            users_total: diff(current.users_total, averages.users_avg),
            members_total: diff(current.members_total, averages.members_avg),
            returning_total: diff(current.returning_total, averages.returning_avg),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Baseline {
    #[serde(flatten)]
    pub averages: PeerAverages,
    pub diffs: BaselineDiff,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsReport {
    pub event_id: Uuid,
    pub event_name: String,
    pub event_type: String,
    pub start_at: DateTime<Utc>,
    pub current: EngagementTotals,
    pub previous: Option<PreviousOccurrence>,
    pub category_baseline: Baseline,
    pub series_baseline: Option<Baseline>,
}
