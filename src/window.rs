use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{ClubSnapshot, EventRecord};

/// One submission to an event that started before the window cutoff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowEntry {
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub start_at: DateTime<Utc>,
}

/// Prior engagement in a club, frozen at a single cutoff.
///
/// Built once per report and shared by every baseline, so previous and
/// peer events are all judged against the target event's start time.
#[derive(Debug, Clone)]
pub struct HistoricalWindow {
    cutoff: DateTime<Utc>,
    entries: Vec<WindowEntry>,
}

impl HistoricalWindow {
    /// Collects every submission in `club` whose event started strictly
    /// before `cutoff`, skipping submissions to `exclude_poll`.
    ///
    /// Entries are unique per (user, poll); a user who attended several
    /// events keeps one entry for each of them.
    pub fn build(
        club: &ClubSnapshot,
        cutoff: DateTime<Utc>,
        exclude_poll: Option<Uuid>,
    ) -> Self {
        let events: HashMap<Uuid, &EventRecord> = club
            .events
            .iter()
            .filter(|event| event.club_id == club.club_id && event.start_at < cutoff)
            .map(|event| (event.id, event))
            .collect();

        let polls: HashMap<Uuid, &EventRecord> = club
            .polls
            .iter()
            .filter(|poll| poll.club_id == club.club_id && Some(poll.id) != exclude_poll)
            .filter_map(|poll| events.get(&poll.event_id).map(|event| (poll.id, *event)))
            .collect();

        let mut seen = HashSet::new();
        let mut entries = Vec::new();

        for submission in &club.submissions {
            let Some(event) = polls.get(&submission.poll_id) else {
                continue;
            };

            if !seen.insert((submission.user_id, submission.poll_id)) {
                continue;
            }

            entries.push(WindowEntry {
                user_id: submission.user_id,
                event_id: event.id,
                start_at: event.start_at,
            });
        }

        Self { cutoff, entries }
    }

    pub fn cutoff(&self) -> DateTime<Utc> {
        self.cutoff
    }

    pub fn entries(&self) -> &[WindowEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn contains_user(&self, user_id: Uuid) -> bool {
        self.entries.iter().any(|entry| entry.user_id == user_id)
    }

    /// Distinct users with an entry for `event_id`.
    pub fn event_attendees(&self, event_id: Uuid) -> HashSet<Uuid> {
        self.entries
            .iter()
            .filter(|entry| entry.event_id == event_id)
            .map(|entry| entry.user_id)
            .collect()
    }
}
