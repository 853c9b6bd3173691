//! A small club used for seeding a fresh database and in tests.
//!
//! Club "Launch Club" runs a recurring social. The first night drew users A
//! and B, the second drew A, C and D. A, B and C are members.

use std::collections::HashSet;

use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use crate::models::{ClubSnapshot, EventRecord, PollRecord, SubmissionRecord};

pub const CLUB_ID: Uuid = Uuid::from_u128(0x6a0c_1b2e_9f4d_4c3a_8e11_0000_0000_0c01);
pub const SERIES_ID: Uuid = Uuid::from_u128(0x6a0c_1b2e_9f4d_4c3a_8e11_0000_0000_05e1);
pub const FIRST_EVENT_ID: Uuid = Uuid::from_u128(0x6a0c_1b2e_9f4d_4c3a_8e11_0000_0000_0e01);
pub const SECOND_EVENT_ID: Uuid = Uuid::from_u128(0x6a0c_1b2e_9f4d_4c3a_8e11_0000_0000_0e02);
pub const FIRST_POLL_ID: Uuid = Uuid::from_u128(0x6a0c_1b2e_9f4d_4c3a_8e11_0000_0000_0f01);
pub const SECOND_POLL_ID: Uuid = Uuid::from_u128(0x6a0c_1b2e_9f4d_4c3a_8e11_0000_0000_0f02);

pub const USER_A: Uuid = Uuid::from_u128(0x6a0c_1b2e_9f4d_4c3a_8e11_0000_0000_a000);
pub const USER_B: Uuid = Uuid::from_u128(0x6a0c_1b2e_9f4d_4c3a_8e11_0000_0000_b000);
pub const USER_C: Uuid = Uuid::from_u128(0x6a0c_1b2e_9f4d_4c3a_8e11_0000_0000_c000);
pub const USER_D: Uuid = Uuid::from_u128(0x6a0c_1b2e_9f4d_4c3a_8e11_0000_0000_d000);

pub const CLUB_NAME: &str = "Launch Club";

fn evening(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, day, 23, 0, 0)
        .single()
        .unwrap_or_default()
}

pub fn launch_club() -> ClubSnapshot {
    let event = |id, name: &str, start_at| EventRecord {
        id,
        club_id: CLUB_ID,
        name: name.to_string(),
        event_type: "social".to_string(),
        recurring_event_id: Some(SERIES_ID),
        start_at,
    };
    let attendance = [
        (FIRST_POLL_ID, vec![USER_A, USER_B]),
        (SECOND_POLL_ID, vec![USER_A, USER_C, USER_D]),
    ];

    let mut submissions = Vec::new();
    for (poll_id, users) in attendance {
        for user_id in users {
            submissions.push(SubmissionRecord {
                id: Uuid::from_u128(poll_id.as_u128() ^ user_id.as_u128()),
                poll_id,
                user_id,
            });
        }
    }

    ClubSnapshot {
        club_id: CLUB_ID,
        events: vec![
            event(FIRST_EVENT_ID, "Launch Social", evening(2)),
            event(SECOND_EVENT_ID, "Launch Social", evening(9)),
        ],
        polls: vec![
            PollRecord {
                id: FIRST_POLL_ID,
                club_id: CLUB_ID,
                event_id: FIRST_EVENT_ID,
            },
            PollRecord {
                id: SECOND_POLL_ID,
                club_id: CLUB_ID,
                event_id: SECOND_EVENT_ID,
            },
        ],
        submissions,
        members: HashSet::from([USER_A, USER_B, USER_C]),
    }
}
