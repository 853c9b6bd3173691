//! Attendance counts for a single poll and averages across peer events.
//!
//! Every function here is pure. Counts always look at distinct users, so
//! repeated submissions by one user to the same poll count once.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{EngagementTotals, PeerAverages};
use crate::window::HistoricalWindow;

/// An earlier event used as a baseline for the target event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeerEvent {
    pub event_id: Uuid,
    pub start_at: DateTime<Utc>,
}

pub fn users_total(attendees: &HashSet<Uuid>) -> u64 {
    attendees.len() as u64
}

pub fn members_total(attendees: &HashSet<Uuid>, members: &HashSet<Uuid>) -> u64 {
    attendees.intersection(members).count() as u64
}

/// Attendees that show up anywhere in `window`, i.e. engaged with the club
/// before the window's cutoff.
pub fn returning_total(attendees: &HashSet<Uuid>, window: &HistoricalWindow) -> u64 {
    attendees
        .iter()
        .filter(|user_id| window.contains_user(**user_id))
        .count() as u64
}

/// True when `user_id` has a window entry for an event that started strictly
/// before `reference_time`.
pub fn has_earlier_submission(
    user_id: Uuid,
    reference_time: DateTime<Utc>,
    window: &HistoricalWindow,
) -> bool {
    window
        .entries()
        .iter()
        .any(|entry| entry.user_id == user_id && entry.start_at < reference_time)
}

/// Totals for the target poll, judged against the full window.
pub fn current_totals(
    attendees: &HashSet<Uuid>,
    members: &HashSet<Uuid>,
    window: &HistoricalWindow,
) -> EngagementTotals {
    EngagementTotals {
        users_total: users_total(attendees),
        members_total: members_total(attendees, members),
        returning_total: returning_total(attendees, window),
    }
}

/// Totals for an earlier event, read from its entries in the window.
///
/// Returning users are those with an entry for some event older than the
/// peer itself, not merely older than the window cutoff.
pub fn peer_metrics(
    peer: &PeerEvent,
    window: &HistoricalWindow,
    members: &HashSet<Uuid>,
) -> EngagementTotals {
    let attendees = window.event_attendees(peer.event_id);
    let returning = attendees
        .iter()
        .filter(|user_id| has_earlier_submission(**user_id, peer.start_at, window))
        .count();

    EngagementTotals {
        users_total: users_total(&attendees),
        members_total: members_total(&attendees, members),
        returning_total: returning as u64,
    }
}

/// Mean of each peer's totals. With no peers every average is `None`.
pub fn peer_average_metrics(
    peers: &[PeerEvent],
    window: &HistoricalWindow,
    members: &HashSet<Uuid>,
) -> PeerAverages {
    if peers.is_empty() {
        return PeerAverages::default();
    }

    let (users, members_sum, returning) = peers
        .iter()
        .map(|peer| peer_metrics(peer, window, members))
        .fold((0u64, 0u64, 0u64), |acc, totals| {
            (
                acc.0 + totals.users_total,
                acc.1 + totals.members_total,
                acc.2 + totals.returning_total,
            )
        });

    let count = peers.len() as f64;
    PeerAverages {
        peer_count: peers.len(),
        users_avg: Some(users as f64 / count),
        members_avg: Some(members_sum as f64 / count),
        returning_avg: Some(returning as f64 / count),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClubSnapshot, EventRecord, PollRecord, SubmissionRecord};
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;

    fn id(n: u128) -> Uuid {
        Uuid::from_u128(n)
    }

    fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap() + Duration::days(n)
    }

    /// Three weekly events: users 1,2 then 1,3 then 2,3,4.
    fn club() -> ClubSnapshot {
        let club_id = id(1);
        let mut snapshot = ClubSnapshot {
            club_id,
            ..ClubSnapshot::default()
        };
        let attendance: [&[u128]; 3] = [&[1, 2], &[1, 3], &[2, 3, 4]];

        for (index, users) in attendance.iter().enumerate() {
            let n = index as u128;
            snapshot.events.push(EventRecord {
                id: id(100 + n),
                club_id,
                name: format!("Week {n}"),
                event_type: "gbm".to_string(),
                recurring_event_id: Some(id(50)),
                start_at: day(7 * index as i64),
            });
            snapshot.polls.push(PollRecord {
                id: id(200 + n),
                club_id,
                event_id: id(100 + n),
            });
            for user in users.iter() {
                snapshot.submissions.push(SubmissionRecord {
                    id: Uuid::new_v4(),
                    poll_id: id(200 + n),
                    user_id: id(*user),
                });
            }
        }

        snapshot.members = [id(1), id(3)].into_iter().collect();
        snapshot
    }

    fn peer(n: u128) -> PeerEvent {
        PeerEvent {
            event_id: id(100 + n),
            start_at: day(7 * n as i64),
        }
    }

    #[test]
    fn counts_distinct_users_and_members() {
        let snapshot = club();
        let attendees = snapshot.attendees(id(202));
        assert_eq!(users_total(&attendees), 3);
        assert_eq!(members_total(&attendees, &snapshot.members), 1);
    }

    #[test]
    fn returning_uses_the_window_cutoff() {
        let snapshot = club();
        let window = HistoricalWindow::build(&snapshot, day(14), Some(id(202)));
        let attendees = snapshot.attendees(id(202));

        // 2 and 3 attended earlier weeks, 4 is new
        assert_eq!(returning_total(&attendees, &window), 2);
    }

    #[test]
    fn earlier_submission_respects_reference_time() {
        let snapshot = club();
        let window = HistoricalWindow::build(&snapshot, day(14), None);

        assert!(has_earlier_submission(id(1), day(7), &window));
        assert!(!has_earlier_submission(id(3), day(7), &window));
        assert!(has_earlier_submission(id(3), day(14), &window));
        assert!(!has_earlier_submission(id(1), day(0), &window));
        assert!(!has_earlier_submission(id(99), day(14), &window));
    }

    #[test]
    fn peer_returning_is_relative_to_the_peer() {
        let snapshot = club();
        let window = HistoricalWindow::build(&snapshot, day(14), Some(id(202)));

        let first = peer_metrics(&peer(0), &window, &snapshot.members);
        assert_eq!(first.users_total, 2);
        assert_eq!(first.returning_total, 0);

        let second = peer_metrics(&peer(1), &window, &snapshot.members);
        assert_eq!(second.users_total, 2);
        assert_eq!(second.members_total, 2);
        assert_eq!(second.returning_total, 1);
    }

    #[test]
    fn peer_without_submissions_counts_as_zero() {
        let snapshot = club();
        let window = HistoricalWindow::build(&snapshot, day(14), None);
        let orphan = PeerEvent {
            event_id: id(999),
            start_at: day(3),
        };

        assert_eq!(
            peer_metrics(&orphan, &window, &snapshot.members),
            EngagementTotals::default()
        );
    }

    #[test]
    fn averages_are_fractional() {
        let snapshot = club();
        let window = HistoricalWindow::build(&snapshot, day(14), Some(id(202)));
        let averages = peer_average_metrics(&[peer(0), peer(1)], &window, &snapshot.members);

        assert_eq!(averages.peer_count, 2);
        assert_eq!(averages.users_avg, Some(2.0));
        assert_eq!(averages.members_avg, Some(1.5));
        assert_eq!(averages.returning_avg, Some(0.5));
    }

    #[test]
    fn no_peers_means_no_averages() {
        let snapshot = club();
        let window = HistoricalWindow::build(&snapshot, day(14), None);
        let averages = peer_average_metrics(&[], &window, &snapshot.members);

        assert_eq!(averages.peer_count, 0);
        assert_eq!(averages.users_avg, None);
        assert_eq!(averages.members_avg, None);
        assert_eq!(averages.returning_avg, None);
    }

    proptest! {
        #[test]
        fn totals_never_exceed_users(
            current in proptest::collection::vec(0u128..20, 0..30),
            earlier in proptest::collection::vec(0u128..20, 0..30),
            members in proptest::collection::hash_set(0u128..20, 0..20),
        ) {
            let club_id = id(1);
            let mut snapshot = ClubSnapshot { club_id, ..ClubSnapshot::default() };
            for (n, users) in [&earlier, &current].into_iter().enumerate() {
                let n = n as u128;
                snapshot.events.push(EventRecord {
                    id: id(100 + n),
                    club_id,
                    name: String::new(),
                    event_type: "other".to_string(),
                    recurring_event_id: None,
                    start_at: day(n as i64),
                });
                snapshot.polls.push(PollRecord { id: id(200 + n), club_id, event_id: id(100 + n) });
                for user in users {
                    snapshot.submissions.push(SubmissionRecord {
                        id: Uuid::new_v4(),
                        poll_id: id(200 + n),
                        user_id: id(*user),
                    });
                }
            }
            let members: HashSet<Uuid> = members.into_iter().map(id).collect();
            let window = HistoricalWindow::build(&snapshot, day(1), Some(id(201)));
            let totals = current_totals(&snapshot.attendees(id(201)), &members, &window);

            prop_assert!(totals.members_total <= totals.users_total);
            prop_assert!(totals.returning_total <= totals.users_total);
        }
    }
}
