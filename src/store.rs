use std::collections::HashMap;

use uuid::Uuid;

use crate::models::ClubSnapshot;

/// Read access to stored clubs, events, polls, submissions and memberships.
pub trait EngagementStore {
    /// Club that hosts `event_id`, if the event exists.
    async fn event_club(&self, event_id: Uuid) -> anyhow::Result<Option<Uuid>>;

    /// Every record belonging to `club_id`, read from one consistent view.
    async fn load_club(&self, club_id: Uuid) -> anyhow::Result<Option<ClubSnapshot>>;
}

/// Clubs held in process, used for the bundled sample data and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    clubs: HashMap<Uuid, ClubSnapshot>,
}

impl From<ClubSnapshot> for MemoryStore {
    fn from(snapshot: ClubSnapshot) -> Self {
        let mut clubs = HashMap::new();
        clubs.insert(snapshot.club_id, snapshot);
        Self { clubs }
    }
}

impl EngagementStore for MemoryStore {
    async fn event_club(&self, event_id: Uuid) -> anyhow::Result<Option<Uuid>> {
        Ok(self
            .clubs
            .values()
            .flat_map(|club| club.events.iter())
            .find(|event| event.id == event_id)
            .map(|event| event.club_id))
    }

    async fn load_club(&self, club_id: Uuid) -> anyhow::Result<Option<ClubSnapshot>> {
        Ok(self.clubs.get(&club_id).cloned())
    }
}
