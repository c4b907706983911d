use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};

use super::categories::Category;
use super::participants::Participant;
use super::registrations;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub time: NaiveTime,
    pub location: String,
    pub category_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEvent {
    pub name: String,
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub time: NaiveTime,
    pub location: String,
    pub category_id: i64,
}

/// An event with its category and participants loaded.
#[derive(Debug, Clone)]
pub struct EventDetails {
    pub event: Event,
    pub category: Category,
    pub participants: Vec<Participant>,
}

#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Case-insensitive substring of the name or the location.
    pub query: Option<String>,
    /// Case-insensitive substring of the category name.
    pub category: Option<String>,
    /// Inclusive bounds on the start date.
    pub date_range: Option<(NaiveDate, NaiveDate)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeWindow {
    #[default]
    All,
    /// Starting today or later.
    Upcoming,
    /// Ended before today. Events without an end date are never past.
    Past,
}

impl TimeWindow {
    /// Unknown values fall back to `All`.
    pub fn from_query(value: &str) -> Self {
        match value {
            "upcoming" => TimeWindow::Upcoming,
            "past" => TimeWindow::Past,
            _ => TimeWindow::All,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeWindow::All => "all",
            TimeWindow::Upcoming => "upcoming",
            TimeWindow::Past => "past",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, FromRow)]
pub struct EventCounts {
    pub total: i64,
    pub upcoming: i64,
    pub past: i64,
}

#[derive(FromRow)]
struct EventRow {
    #[sqlx(flatten)]
    event: Event,
    category_name: String,
    category_description: String,
}

const EVENT_WITH_CATEGORY: &str = r#"
SELECT events.id, events.name, events.description, events.start_date, events.end_date,
       events.time, events.location, events.category_id,
       categories.name AS category_name, categories.description AS category_description
FROM events
JOIN categories ON categories.id = events.category_id
WHERE 1 = 1"#;

const ORDERING: &str = " ORDER BY events.start_date, events.time, events.id";

async fn with_participants(
    pool: &SqlitePool,
    rows: Vec<EventRow>,
) -> sqlx::Result<Vec<EventDetails>> {
    let ids: Vec<i64> = rows.iter().map(|row| row.event.id).collect();
    let mut participants = registrations::participants_for_events(pool, &ids).await?;
    Ok(rows
        .into_iter()
        .map(|row| EventDetails {
            category: Category {
                id: row.event.category_id,
                name: row.category_name,
                description: row.category_description,
            },
            participants: participants.remove(&row.event.id).unwrap_or_default(),
            event: row.event,
        })
        .collect())
}

pub async fn get_event(pool: &SqlitePool, id: i64) -> sqlx::Result<Event> {
    sqlx::query_as::<_, Event>(
        r#"
        SELECT id, name, description, start_date, end_date, time, location, category_id
        FROM events WHERE events.id = ?1
        "#,
    )
    .bind(id)
    .fetch_one(pool)
    .await
}

pub async fn get_event_details(pool: &SqlitePool, id: i64) -> sqlx::Result<EventDetails> {
    let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(EVENT_WITH_CATEGORY);
    query.push(" AND events.id = ").push_bind(id);
    let row = query.build_query_as::<EventRow>().fetch_one(pool).await?;
    with_participants(pool, vec![row])
        .await?
        .pop()
        .ok_or(sqlx::Error::RowNotFound)
}

pub async fn list_events(pool: &SqlitePool, filter: &EventFilter) -> sqlx::Result<Vec<EventDetails>> {
    let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(EVENT_WITH_CATEGORY);
    if let Some(q) = filter.query.as_deref().filter(|q| !q.is_empty()) {
        query
            .push(" AND (instr(lower(events.name), lower(")
            .push_bind(q.to_owned())
            .push(")) > 0 OR instr(lower(events.location), lower(")
            .push_bind(q.to_owned())
            .push(")) > 0)");
    }
    if let Some(category) = filter.category.as_deref().filter(|c| !c.is_empty()) {
        query
            .push(" AND instr(lower(categories.name), lower(")
            .push_bind(category.to_owned())
            .push(")) > 0");
    }
    if let Some((from, to)) = filter.date_range {
        query
            .push(" AND events.start_date >= ")
            .push_bind(from)
            .push(" AND events.start_date <= ")
            .push_bind(to);
    }
    query.push(ORDERING);

    let rows = query.build_query_as::<EventRow>().fetch_all(pool).await?;
    with_participants(pool, rows).await
}

pub async fn list_events_in_window(
    pool: &SqlitePool,
    window: TimeWindow,
    today: NaiveDate,
) -> sqlx::Result<Vec<EventDetails>> {
    let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(EVENT_WITH_CATEGORY);
    match window {
        TimeWindow::All => {}
        TimeWindow::Upcoming => {
            query.push(" AND events.start_date >= ").push_bind(today);
        }
        TimeWindow::Past => {
            query.push(" AND events.end_date < ").push_bind(today);
        }
    }
    query.push(ORDERING);

    let rows = query.build_query_as::<EventRow>().fetch_all(pool).await?;
    with_participants(pool, rows).await
}

pub async fn events_starting_on(pool: &SqlitePool, date: NaiveDate) -> sqlx::Result<Vec<Event>> {
    sqlx::query_as::<_, Event>(
        r#"
        SELECT id, name, description, start_date, end_date, time, location, category_id
        FROM events WHERE events.start_date = ?1
        ORDER BY events.time, events.id
        "#,
    )
    .bind(date)
    .fetch_all(pool)
    .await
}

/// Counts over every event, independent of any listing filter.
pub async fn event_counts(pool: &SqlitePool, today: NaiveDate) -> sqlx::Result<EventCounts> {
    sqlx::query_as::<_, EventCounts>(
        r#"
        SELECT COUNT(*) AS total,
               COUNT(CASE WHEN start_date >= ?1 THEN 1 END) AS upcoming,
               COUNT(CASE WHEN end_date < ?1 THEN 1 END) AS past
        FROM events
        "#,
    )
    .bind(today)
    .fetch_one(pool)
    .await
}

pub async fn count_events(pool: &SqlitePool) -> sqlx::Result<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM events")
        .fetch_one(pool)
        .await
}

pub async fn create_event(pool: &SqlitePool, event: &NewEvent) -> sqlx::Result<i64> {
    let id = sqlx::query(
        r#"
        INSERT INTO events (name, description, start_date, end_date, time, location, category_id)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(&event.name)
    .bind(&event.description)
    .bind(event.start_date)
    .bind(event.end_date)
    .bind(event.time)
    .bind(&event.location)
    .bind(event.category_id)
    .execute(pool)
    .await?
    .last_insert_rowid();

    Ok(id)
}

pub async fn update_event(pool: &SqlitePool, id: i64, event: &NewEvent) -> sqlx::Result<()> {
    let updated = sqlx::query(
        r#"
        UPDATE events
        SET name=?1, description=?2, start_date=?3, end_date=?4, time=?5, location=?6, category_id=?7
        WHERE events.id = ?8
        "#,
    )
    .bind(&event.name)
    .bind(&event.description)
    .bind(event.start_date)
    .bind(event.end_date)
    .bind(event.time)
    .bind(&event.location)
    .bind(event.category_id)
    .bind(id)
    .execute(pool)
    .await?
    .rows_affected();

    if updated == 0 {
        return Err(sqlx::Error::RowNotFound);
    }
    Ok(())
}

/// Deletes one event. Its participant links go with it; its category stays.
pub async fn delete_event(pool: &SqlitePool, id: i64) -> sqlx::Result<()> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM event_participants WHERE event_id = ?1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    let deleted = sqlx::query("DELETE FROM events WHERE events.id = ?1")
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    if deleted == 0 {
        return Err(sqlx::Error::RowNotFound);
    }
    tx.commit().await?;
    Ok(())
}

pub async fn delete_all_events(pool: &SqlitePool) -> sqlx::Result<u64> {
    let deleted = sqlx::query("DELETE FROM events")
        .execute(pool)
        .await?
        .rows_affected();
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::queries::categories;
    use crate::db::testing::{self, date};

    async fn names(pool: &SqlitePool, filter: &EventFilter) -> Vec<String> {
        list_events(pool, filter)
            .await
            .unwrap()
            .into_iter()
            .map(|details| details.event.name)
            .collect()
    }

    #[tokio::test]
    async fn created_event_round_trips_fields() {
        let pool = testing::pool().await;
        let music = testing::category(&pool, "Music").await;
        let new_event = NewEvent {
            name: "Jazz Night".to_owned(),
            description: "Smooth".to_owned(),
            start_date: date("2025-01-10"),
            end_date: Some(date("2025-01-12")),
            time: NaiveTime::from_hms_opt(20, 15, 0).unwrap(),
            location: "Paris".to_owned(),
            category_id: music.id,
        };

        let id = create_event(&pool, &new_event).await.unwrap();
        let stored = get_event(&pool, id).await.unwrap();

        assert_eq!(stored.name, new_event.name);
        assert_eq!(stored.description, new_event.description);
        assert_eq!(stored.start_date, new_event.start_date);
        assert_eq!(stored.end_date, new_event.end_date);
        assert_eq!(stored.time, new_event.time);
        assert_eq!(stored.location, new_event.location);
        assert_eq!(stored.category_id, music.id);
    }

    #[tokio::test]
    async fn event_requires_live_category() {
        let pool = testing::pool().await;
        let result = create_event(
            &pool,
            &NewEvent {
                name: "Orphan".to_owned(),
                description: "No category".to_owned(),
                start_date: date("2025-01-10"),
                end_date: None,
                time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                location: "Nowhere".to_owned(),
                category_id: 999,
            },
        )
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn query_matches_name_or_location_case_insensitively() {
        let pool = testing::pool().await;
        let music = testing::category(&pool, "Music").await;
        let tech = testing::category(&pool, "Technology").await;
        testing::event(&pool, "Jazz Night", "Paris", "2025-01-10", None, music.id).await;
        testing::event(&pool, "Tech Meetup", "Berlin", "2025-02-01", None, tech.id).await;

        let by_name = EventFilter {
            query: Some("jazz".to_owned()),
            ..Default::default()
        };
        assert_eq!(names(&pool, &by_name).await, vec!["Jazz Night"]);

        let by_location = EventFilter {
            query: Some("BERL".to_owned()),
            ..Default::default()
        };
        assert_eq!(names(&pool, &by_location).await, vec!["Tech Meetup"]);

        let by_category = EventFilter {
            category: Some("tech".to_owned()),
            ..Default::default()
        };
        assert_eq!(names(&pool, &by_category).await, vec!["Tech Meetup"]);

        assert_eq!(names(&pool, &EventFilter::default()).await.len(), 2);
    }

    #[tokio::test]
    async fn date_range_is_inclusive() {
        let pool = testing::pool().await;
        let music = testing::category(&pool, "Music").await;
        testing::event(&pool, "New Year", "Paris", "2025-01-01", None, music.id).await;
        testing::event(&pool, "Month End", "Paris", "2025-01-31", None, music.id).await;
        testing::event(&pool, "February", "Paris", "2025-02-01", None, music.id).await;
        testing::event(&pool, "December", "Paris", "2024-12-31", None, music.id).await;

        let january = EventFilter {
            date_range: Some((date("2025-01-01"), date("2025-01-31"))),
            ..Default::default()
        };
        assert_eq!(names(&pool, &january).await, vec!["New Year", "Month End"]);
    }

    #[tokio::test]
    async fn details_preload_category_and_participants() {
        let pool = testing::pool().await;
        let music = testing::category(&pool, "Music").await;
        let jazz = testing::event(&pool, "Jazz Night", "Paris", "2025-01-10", None, music.id).await;
        let ana = testing::participant(&pool, "Ana", "ana@example.com").await;
        registrations::add_participant_to_event(&pool, jazz.id, ana.id)
            .await
            .unwrap();

        let details = get_event_details(&pool, jazz.id).await.unwrap();

        assert_eq!(details.event, jazz);
        assert_eq!(details.category, music);
        assert_eq!(details.participants, vec![ana]);
        assert!(matches!(
            get_event_details(&pool, jazz.id + 1).await,
            Err(sqlx::Error::RowNotFound)
        ));
    }

    #[tokio::test]
    async fn counts_ignore_window() {
        let pool = testing::pool().await;
        let music = testing::category(&pool, "Music").await;
        let today = date("2025-06-15");
        testing::event(&pool, "Today", "Paris", "2025-06-15", None, music.id).await;
        testing::event(&pool, "Later", "Paris", "2025-07-01", Some("2025-07-02"), music.id).await;
        testing::event(&pool, "Done", "Paris", "2025-05-01", Some("2025-05-02"), music.id).await;
        // started in the past with no end date: neither upcoming nor past
        testing::event(&pool, "Open", "Paris", "2025-05-01", None, music.id).await;

        let counts = event_counts(&pool, today).await.unwrap();
        assert_eq!(
            counts,
            EventCounts {
                total: 4,
                upcoming: 2,
                past: 1
            }
        );

        let upcoming = list_events_in_window(&pool, TimeWindow::Upcoming, today)
            .await
            .unwrap();
        assert_eq!(upcoming.len(), 2);
        let past = list_events_in_window(&pool, TimeWindow::Past, today)
            .await
            .unwrap();
        assert_eq!(past.len(), 1);
        assert_eq!(past[0].event.name, "Done");
        let all = list_events_in_window(&pool, TimeWindow::All, today)
            .await
            .unwrap();
        assert_eq!(all.len(), 4);

        let starting_today = events_starting_on(&pool, today).await.unwrap();
        assert_eq!(starting_today.len(), 1);
        assert_eq!(starting_today[0].name, "Today");
    }

    #[tokio::test]
    async fn delete_keeps_category() {
        let pool = testing::pool().await;
        let music = testing::category(&pool, "Music").await;
        let jazz = testing::event(&pool, "Jazz Night", "Paris", "2025-01-10", None, music.id).await;
        let ana = testing::participant(&pool, "Ana", "ana@example.com").await;
        registrations::add_participant_to_event(&pool, jazz.id, ana.id)
            .await
            .unwrap();

        delete_event(&pool, jazz.id).await.unwrap();

        assert!(matches!(
            get_event(&pool, jazz.id).await,
            Err(sqlx::Error::RowNotFound)
        ));
        assert_eq!(categories::get_category(&pool, music.id).await.unwrap(), music);
        assert!(registrations::events_for_participant(&pool, ana.id)
            .await
            .unwrap()
            .is_empty());
        assert!(matches!(
            delete_event(&pool, jazz.id).await,
            Err(sqlx::Error::RowNotFound)
        ));
    }

    #[test]
    fn unknown_window_means_all() {
        assert_eq!(TimeWindow::from_query("upcoming"), TimeWindow::Upcoming);
        assert_eq!(TimeWindow::from_query("past"), TimeWindow::Past);
        assert_eq!(TimeWindow::from_query("someday"), TimeWindow::All);
    }
}
