use std::collections::HashSet;

use anyhow::Context;
use sqlx::{PgPool, Row};
use tracing::debug;
use uuid::Uuid;

use crate::fixtures;
use crate::models::{ClubSnapshot, EventRecord, PollRecord, SubmissionRecord};
use crate::store::EngagementStore;

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let club = fixtures::launch_club();
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO event_analytics.clubs (id, name)
        VALUES ($1, $2)
        ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name
        "#,
    )
    .bind(club.club_id)
    .bind(fixtures::CLUB_NAME)
    .execute(&mut *tx)
    .await?;

    for event in &club.events {
        sqlx::query(
            r#"
            INSERT INTO event_analytics.events
            (id, club_id, name, event_type, recurring_event_id, start_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(event.id)
        .bind(event.club_id)
        .bind(&event.name)
        .bind(&event.event_type)
        .bind(event.recurring_event_id)
        .bind(event.start_at)
        .execute(&mut *tx)
        .await?;
    }

    for poll in &club.polls {
        sqlx::query(
            r#"
            INSERT INTO event_analytics.polls (id, club_id, event_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(poll.id)
        .bind(poll.club_id)
        .bind(poll.event_id)
        .execute(&mut *tx)
        .await?;
    }

    for submission in &club.submissions {
        sqlx::query(
            r#"
            INSERT INTO event_analytics.poll_submissions (id, poll_id, user_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(submission.id)
        .bind(submission.poll_id)
        .bind(submission.user_id)
        .execute(&mut *tx)
        .await?;
    }

    for user_id in &club.members {
        sqlx::query(
            r#"
            INSERT INTO event_analytics.club_memberships (club_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(club.club_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl EngagementStore for PgStore {
    async fn event_club(&self, event_id: Uuid) -> anyhow::Result<Option<Uuid>> {
        let row = sqlx::query("SELECT club_id FROM event_analytics.events WHERE id = $1")
            .bind(event_id)
            .fetch_optional(&self.pool)
            .await
            .context("failed to look up event")?;

        Ok(row.map(|row| row.get("club_id")))
    }

    async fn load_club(&self, club_id: Uuid) -> anyhow::Result<Option<ClubSnapshot>> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;

        let exists = sqlx::query("SELECT 1 FROM event_analytics.clubs WHERE id = $1")
            .bind(club_id)
            .fetch_optional(&mut *tx)
            .await?
            .is_some();
        if !exists {
            return Ok(None);
        }

        let events = sqlx::query(
            "SELECT id, club_id, name, event_type, recurring_event_id, start_at \
             FROM event_analytics.events WHERE club_id = $1",
        )
        .bind(club_id)
        .fetch_all(&mut *tx)
        .await
        .context("failed to load events")?
        .into_iter()
        .map(|row| EventRecord {
            id: row.get("id"),
            club_id: row.get("club_id"),
            name: row.get("name"),
            event_type: row.get("event_type"),
            recurring_event_id: row.get("recurring_event_id"),
            start_at: row.get("start_at"),
        })
        .collect();

        let polls = sqlx::query(
            "SELECT id, club_id, event_id FROM event_analytics.polls WHERE club_id = $1",
        )
        .bind(club_id)
        .fetch_all(&mut *tx)
        .await
        .context("failed to load polls")?
        .into_iter()
        .map(|row| PollRecord {
            id: row.get("id"),
            club_id: row.get("club_id"),
            event_id: row.get("event_id"),
        })
        .collect();

        let submissions: Vec<SubmissionRecord> = sqlx::query(
            "SELECT s.id, s.poll_id, s.user_id \
             FROM event_analytics.poll_submissions s \
             JOIN event_analytics.polls p ON p.id = s.poll_id \
             WHERE p.club_id = $1",
        )
        .bind(club_id)
        .fetch_all(&mut *tx)
        .await
        .context("failed to load submissions")?
        .into_iter()
        .map(|row| SubmissionRecord {
            id: row.get("id"),
            poll_id: row.get("poll_id"),
            user_id: row.get("user_id"),
        })
        .collect();

        let members: HashSet<Uuid> = sqlx::query(
            "SELECT user_id FROM event_analytics.club_memberships WHERE club_id = $1",
        )
        .bind(club_id)
        .fetch_all(&mut *tx)
        .await
        .context("failed to load memberships")?
        .into_iter()
        .map(|row| row.get("user_id"))
        .collect();

        tx.commit().await?;
        debug!(%club_id, submissions = submissions.len(), members = members.len(), "loaded club");

        Ok(Some(ClubSnapshot {
            club_id,
            events,
            polls,
            submissions,
            members,
        }))
    }
}
