use std::collections::HashSet;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::AnalyticsError;
use crate::metrics::{self, PeerEvent};
use crate::models::{
    AnalyticsReport, Baseline, BaselineDiff, ClubSnapshot, EngagementTotals, EventRecord,
    PreviousOccurrence, TotalsDiff,
};
use crate::store::EngagementStore;
use crate::window::HistoricalWindow;

pub struct AnalyticsEngine<S> {
    store: S,
}

impl<S: EngagementStore> AnalyticsEngine<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn compute_event_analytics(
        &self,
        event_id: Uuid,
    ) -> Result<AnalyticsReport, AnalyticsError> {
        let club_id = self
            .store
            .event_club(event_id)
            .await?
            .ok_or(AnalyticsError::EventNotFound(event_id))?;
        let club = self.load_club(club_id).await?;

        analyze_snapshot(&club, event_id)
    }

    /// Reports for every event of a club that has a poll, oldest first.
    pub async fn compute_club_analytics(
        &self,
        club_id: Uuid,
    ) -> Result<Vec<AnalyticsReport>, AnalyticsError> {
        let club = self.load_club(club_id).await?;

        let mut events: Vec<&EventRecord> = club.events.iter().collect();
        events.sort_by_key(|event| event.sort_key());

        let mut reports = Vec::with_capacity(events.len());
        for event in events {
            match analyze_snapshot(&club, event.id) {
                Ok(report) => reports.push(report),
                Err(AnalyticsError::EventNotFound(id)) => {
                    warn!(event_id = %id, "skipping event without a poll");
                }
                Err(err) => return Err(err),
            }
        }

        Ok(reports)
    }

    async fn load_club(&self, club_id: Uuid) -> Result<ClubSnapshot, AnalyticsError> {
        self.store
            .load_club(club_id)
            .await?
            .ok_or(AnalyticsError::ScopeNotFound(club_id))
    }
}

/// Builds the report for `event_id` from an already loaded club.
pub fn analyze_snapshot(
    club: &ClubSnapshot,
    event_id: Uuid,
) -> Result<AnalyticsReport, AnalyticsError> {
    let event = club
        .event(event_id)
        .ok_or(AnalyticsError::EventNotFound(event_id))?;
    let poll = club
        .poll_for_event(event_id)
        .ok_or(AnalyticsError::EventNotFound(event_id))?;
    let members = &club.members;

    let window = HistoricalWindow::build(club, event.start_at, Some(poll.id));
    debug!(%event_id, entries = window.len(), cutoff = %window.cutoff(), "built historical window");

    let current = metrics::current_totals(&club.attendees(poll.id), members, &window);

    let earlier: Vec<&EventRecord> = club
        .events
        .iter()
        .filter(|other| {
            other.club_id == club.club_id && other.id != event.id && other.start_at < event.start_at
        })
        .collect();

    let category_peers: Vec<PeerEvent> = earlier
        .iter()
        .filter(|other| other.event_type == event.event_type)
        .map(|other| peer_event(club, other))
        .collect();

    let series_peers: Option<Vec<PeerEvent>> = event.recurring_event_id.map(|series_id| {
        earlier
            .iter()
            .filter(|other| other.recurring_event_id == Some(series_id))
            .map(|other| peer_event(club, other))
            .collect()
    });

    let previous = series_peers
        .as_deref()
        .and_then(|peers| peers.iter().max_by_key(|peer| (peer.start_at, peer.event_id)))
        .map(|peer| previous_occurrence(peer, &current, &window, members));

    let category_baseline = baseline(&category_peers, &current, &window, members);
    let series_baseline = series_peers
        .as_deref()
        .map(|peers| baseline(peers, &current, &window, members));

    info!(
        %event_id,
        users = current.users_total,
        category_peers = category_baseline.averages.peer_count,
        series_peers = series_baseline.as_ref().map(|b| b.averages.peer_count),
        has_previous = previous.is_some(),
        "computed event analytics"
    );

    Ok(AnalyticsReport {
        event_id,
        event_name: event.name.clone(),
        event_type: event.event_type.clone(),
        start_at: event.start_at,
        current,
        previous,
        category_baseline,
        series_baseline,
    })
}

fn peer_event(club: &ClubSnapshot, event: &EventRecord) -> PeerEvent {
    if club.poll_for_event(event.id).is_none() {
        warn!(event_id = %event.id, "peer event has no poll, counting it as empty");
    }

    PeerEvent {
        event_id: event.id,
        start_at: event.start_at,
    }
}

fn previous_occurrence(
    peer: &PeerEvent,
    current: &EngagementTotals,
    window: &HistoricalWindow,
    members: &HashSet<Uuid>,
) -> PreviousOccurrence {
    let totals = metrics::peer_metrics(peer, window, members);
    PreviousOccurrence {
        event_id: peer.event_id,
        start_at: peer.start_at,
        totals,
        diffs: TotalsDiff::between(current, &totals),
    }
}

fn baseline(
    peers: &[PeerEvent],
    current: &EngagementTotals,
    window: &HistoricalWindow,
    members: &HashSet<Uuid>,
) -> Baseline {
    let averages = metrics::peer_average_metrics(peers, window, members);
    Baseline {
        averages,
        diffs: BaselineDiff::between(current, &averages),
    }
}
