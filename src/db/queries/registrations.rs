//! The participant <-> event join table.

use std::collections::HashMap;

use itertools::Itertools;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};

use super::events::Event;
use super::participants::Participant;

#[derive(FromRow)]
struct LinkedParticipant {
    event_id: i64,
    #[sqlx(flatten)]
    participant: Participant,
}

/// Links a participant to an event. Linking twice is a no-op.
pub async fn add_participant_to_event(
    pool: &SqlitePool,
    event_id: i64,
    participant_id: i64,
) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        INSERT OR IGNORE INTO event_participants (participant_id, event_id) VALUES (?1, ?2)
        "#,
    )
    .bind(participant_id)
    .bind(event_id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn add_participant_to_events(
    pool: &SqlitePool,
    participant_id: i64,
    event_ids: &[i64],
) -> sqlx::Result<()> {
    if event_ids.is_empty() {
        return Ok(());
    }
    let mut query: QueryBuilder<Sqlite> =
        QueryBuilder::new("INSERT OR IGNORE INTO event_participants (participant_id, event_id) ");
    query.push_values(event_ids, |mut row, event_id| {
        row.push_bind(participant_id).push_bind(*event_id);
    });
    query.build().execute(pool).await?;
    Ok(())
}

/// Returns whether a link was removed.
pub async fn remove_participant_from_event(
    pool: &SqlitePool,
    event_id: i64,
    participant_id: i64,
) -> sqlx::Result<bool> {
    let removed = sqlx::query(
        r#"
        DELETE FROM event_participants WHERE participant_id = ?1 AND event_id = ?2
        "#,
    )
    .bind(participant_id)
    .bind(event_id)
    .execute(pool)
    .await?
    .rows_affected();
    Ok(removed > 0)
}

pub async fn participants_for_event(
    pool: &SqlitePool,
    event_id: i64,
) -> sqlx::Result<Vec<Participant>> {
    sqlx::query_as::<_, Participant>(
        r#"
        SELECT participants.id, participants.name, participants.email
        FROM participants
        JOIN event_participants ON event_participants.participant_id = participants.id
        WHERE event_participants.event_id = ?1
        ORDER BY participants.name, participants.id
        "#,
    )
    .bind(event_id)
    .fetch_all(pool)
    .await
}

/// Participants of each of `event_ids`, keyed by event id. Events without participants are absent.
pub async fn participants_for_events(
    pool: &SqlitePool,
    event_ids: &[i64],
) -> sqlx::Result<HashMap<i64, Vec<Participant>>> {
    if event_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(
        r#"
        SELECT event_participants.event_id, participants.id, participants.name, participants.email
        FROM participants
        JOIN event_participants ON event_participants.participant_id = participants.id
        WHERE event_participants.event_id IN ("#,
    );
    let mut ids = query.separated(", ");
    for id in event_ids {
        ids.push_bind(*id);
    }
    query.push(") ORDER BY participants.name, participants.id");

    let rows = query
        .build_query_as::<LinkedParticipant>()
        .fetch_all(pool)
        .await?;
    Ok(rows
        .into_iter()
        .map(|row| (row.event_id, row.participant))
        .into_group_map())
}

pub async fn events_for_participant(
    pool: &SqlitePool,
    participant_id: i64,
) -> sqlx::Result<Vec<Event>> {
    sqlx::query_as::<_, Event>(
        r#"
        SELECT events.id, events.name, events.description, events.start_date, events.end_date,
               events.time, events.location, events.category_id
        FROM events
        JOIN event_participants ON event_participants.event_id = events.id
        WHERE event_participants.participant_id = ?1
        ORDER BY events.start_date, events.id
        "#,
    )
    .bind(participant_id)
    .fetch_all(pool)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing;

    #[tokio::test]
    async fn links_are_listed_from_both_sides() {
        let pool = testing::pool().await;
        let music = testing::category(&pool, "Music").await;
        let jazz = testing::event(&pool, "Jazz Night", "Paris", "2025-01-10", None, music.id).await;
        let rock = testing::event(&pool, "Rock Night", "Lyon", "2025-01-11", None, music.id).await;
        let ana = testing::participant(&pool, "Ana", "ana@example.com").await;
        let bob = testing::participant(&pool, "Bob", "bob@example.com").await;

        add_participant_to_events(&pool, ana.id, &[jazz.id, rock.id])
            .await
            .unwrap();
        add_participant_to_event(&pool, jazz.id, bob.id).await.unwrap();
        // linking again changes nothing
        add_participant_to_event(&pool, jazz.id, bob.id).await.unwrap();

        let jazz_people = participants_for_event(&pool, jazz.id).await.unwrap();
        assert_eq!(jazz_people, vec![ana.clone(), bob.clone()]);

        let by_event = participants_for_events(&pool, &[jazz.id, rock.id])
            .await
            .unwrap();
        assert_eq!(by_event[&jazz.id].len(), 2);
        assert_eq!(by_event[&rock.id], vec![ana.clone()]);

        let ana_events = events_for_participant(&pool, ana.id).await.unwrap();
        assert_eq!(
            ana_events.iter().map(|e| e.id).collect::<Vec<_>>(),
            vec![jazz.id, rock.id]
        );
    }

    #[tokio::test]
    async fn remove_drops_only_one_link() {
        let pool = testing::pool().await;
        let music = testing::category(&pool, "Music").await;
        let jazz = testing::event(&pool, "Jazz Night", "Paris", "2025-01-10", None, music.id).await;
        let rock = testing::event(&pool, "Rock Night", "Lyon", "2025-01-11", None, music.id).await;
        let ana = testing::participant(&pool, "Ana", "ana@example.com").await;
        add_participant_to_events(&pool, ana.id, &[jazz.id, rock.id])
            .await
            .unwrap();

        assert!(remove_participant_from_event(&pool, jazz.id, ana.id)
            .await
            .unwrap());
        assert!(!remove_participant_from_event(&pool, jazz.id, ana.id)
            .await
            .unwrap());

        assert!(participants_for_event(&pool, jazz.id).await.unwrap().is_empty());
        assert_eq!(participants_for_event(&pool, rock.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn empty_id_list_short_circuits() {
        let pool = testing::pool().await;
        assert!(participants_for_events(&pool, &[]).await.unwrap().is_empty());
        add_participant_to_events(&pool, 1, &[]).await.unwrap();
    }
}
