//! Demo data: wipes every table and fills it again with random, relationally consistent rows.

use chrono::{Local, NaiveDate, NaiveTime, TimeDelta};
use rand::seq::IndexedRandom;
use rand::Rng;
use sqlx::SqlitePool;

use crate::db::queries::{categories, events, participants, registrations};
use crate::db::{Category, NewCategory, NewEvent, NewParticipant};

pub const CATEGORY_NAMES: [&str; 12] = [
    "Music",
    "Technology",
    "Business",
    "Sports",
    "Education",
    "Health",
    "Social",
    "Art",
    "Food",
    "Travel",
    "Science",
    "Community",
];

pub const EVENT_PREFIXES: [&str; 7] = [
    "International",
    "Annual",
    "Local",
    "Global",
    "Summer",
    "Winter",
    "Monthly",
];

pub const EVENT_TYPES: [&str; 7] = [
    "Conference",
    "Festival",
    "Meetup",
    "Workshop",
    "Hackathon",
    "Concert",
    "Seminar",
];

const FIRST_NAMES: [&str; 16] = [
    "Ana", "Ben", "Chloe", "David", "Elena", "Farid", "Grace", "Hiro", "Ines", "Jonas", "Kemi",
    "Liam", "Maya", "Noah", "Olga", "Pablo",
];

const LAST_NAMES: [&str; 12] = [
    "Smith", "Garcia", "Nguyen", "Okafor", "Kowalski", "Rossi", "Tanaka", "Silva", "Novak",
    "Haddad", "Larsen", "Moreau",
];

const CITIES: [&str; 12] = [
    "Lisbon", "Berlin", "Nairobi", "Osaka", "Toronto", "Lyon", "Krakow", "Austin", "Melbourne",
    "Bogota", "Dublin", "Seoul",
];

const WORDS: [&str; 24] = [
    "community", "ideas", "hands-on", "talks", "people", "music", "future", "local", "open",
    "learning", "friendly", "stage", "network", "craft", "science", "evening", "weekend",
    "outdoor", "practical", "share", "team", "welcome", "discover", "together",
];

const MAX_EVENTS_PER_PARTICIPANT: usize = 4;
const NO_END_DATE_CHANCE: f64 = 0.30;
const SAMPLE_PAIRS: usize = 10;

#[derive(Debug, Clone, Copy)]
pub struct SeedOptions {
    pub categories: usize,
    pub events: usize,
    pub participants: usize,
}

impl Default for SeedOptions {
    fn default() -> Self {
        Self {
            categories: 6,
            events: 30,
            participants: 100,
        }
    }
}

#[derive(Debug, Default)]
pub struct SeedSummary {
    pub categories: usize,
    pub events: usize,
    pub participants: usize,
    pub links: usize,
    /// `(event name, category name)` for the first events created.
    pub sample: Vec<(String, String)>,
}

/// Names for `count` categories: distinct when the pool allows, otherwise the whole pool plus
/// random repeats.
fn category_names<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Vec<&'static str> {
    if count <= CATEGORY_NAMES.len() {
        return CATEGORY_NAMES.choose_multiple(rng, count).copied().collect();
    }
    let mut names = CATEGORY_NAMES.to_vec();
    for _ in CATEGORY_NAMES.len()..count {
        names.extend(CATEGORY_NAMES.choose(rng).copied());
    }
    names
}

fn pick<R: Rng + ?Sized>(pool: &[&'static str], rng: &mut R) -> &'static str {
    pool.choose(rng).copied().unwrap_or_default()
}

fn sentence<R: Rng + ?Sized>(words: usize, rng: &mut R) -> String {
    let mut text = (0..words)
        .map(|_| pick(&WORDS, rng))
        .collect::<Vec<_>>()
        .join(" ");
    if let Some(first) = text.get(..1) {
        text = first.to_uppercase() + &text[1..];
    }
    text + "."
}

fn random_event<R: Rng + ?Sized>(today: NaiveDate, category: &Category, rng: &mut R) -> NewEvent {
    let start_date = today + TimeDelta::days(rng.random_range(1..=90));
    let end_date = if rng.random_bool(NO_END_DATE_CHANCE) {
        None
    } else {
        Some(start_date + TimeDelta::days(rng.random_range(0..=90)))
    };
    let time = NaiveTime::from_num_seconds_from_midnight_opt(rng.random_range(0..86_400), 0)
        .unwrap_or_default();
    let description = (0..rng.random_range(2..=3))
        .map(|_| sentence(rng.random_range(5..=9), rng))
        .collect::<Vec<_>>()
        .join(" ");

    NewEvent {
        name: format!("{} {}", pick(&EVENT_PREFIXES, rng), pick(&EVENT_TYPES, rng)),
        description,
        start_date,
        end_date,
        time,
        location: pick(&CITIES, rng).to_owned(),
        category_id: category.id,
    }
}

fn random_participant<R: Rng + ?Sized>(serial: usize, rng: &mut R) -> NewParticipant {
    let first = pick(&FIRST_NAMES, rng);
    let last = pick(&LAST_NAMES, rng);
    NewParticipant {
        name: format!("{first} {last}"),
        // the serial keeps addresses unique within a run
        email: format!(
            "{}.{}{serial}@example.com",
            first.to_lowercase(),
            last.to_lowercase()
        ),
    }
}

/// Deletes participants, then events, then categories, and inserts fresh rows.
/// Running it twice with the same options leaves the same row counts behind.
pub async fn populate<R: Rng + ?Sized>(
    pool: &SqlitePool,
    options: &SeedOptions,
    rng: &mut R,
) -> sqlx::Result<SeedSummary> {
    participants::delete_all_participants(pool).await?;
    events::delete_all_events(pool).await?;
    categories::delete_all_categories(pool).await?;

    let mut summary = SeedSummary::default();

    let mut created_categories = Vec::with_capacity(options.categories);
    for name in category_names(options.categories, rng) {
        let category = NewCategory {
            name: name.to_owned(),
            description: sentence(8, rng),
        };
        let id = categories::create_category(pool, &category).await?;
        created_categories.push(Category {
            id,
            name: category.name,
            description: category.description,
        });
    }
    summary.categories = created_categories.len();
    tracing::info!(
        names = ?created_categories.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
        "Created categories"
    );

    let today = Local::now().date_naive();
    let mut event_ids = Vec::with_capacity(options.events);
    if created_categories.is_empty() && options.events > 0 {
        tracing::warn!("No categories to attach events to, skipping events");
    } else {
        for _ in 0..options.events {
            let Some(category) = created_categories.choose(rng) else {
                break;
            };
            let event = random_event(today, category, rng);
            event_ids.push(events::create_event(pool, &event).await?);
            if summary.sample.len() < SAMPLE_PAIRS {
                summary.sample.push((event.name, category.name.clone()));
            }
        }
    }
    summary.events = event_ids.len();

    for serial in 1..=options.participants {
        let participant = random_participant(serial, rng);
        let participant_id = participants::create_participant(pool, &participant).await?;
        summary.participants += 1;

        if event_ids.is_empty() {
            continue;
        }
        let count = rng.random_range(1..=MAX_EVENTS_PER_PARTICIPANT.min(event_ids.len()));
        let chosen: Vec<i64> = event_ids.choose_multiple(rng, count).copied().collect();
        registrations::add_participant_to_events(pool, participant_id, &chosen).await?;
        summary.links += chosen.len();
    }

    tracing::info!(
        categories = summary.categories,
        events = summary.events,
        participants = summary.participants,
        links = summary.links,
        "Populated database"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::db::testing;
    use crate::db::EventFilter;

    async fn link_count(pool: &SqlitePool) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM event_participants")
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn running_twice_leaves_the_same_counts() {
        let pool = testing::pool().await;
        let options = SeedOptions::default();

        for seed in [1, 2] {
            let mut rng = StdRng::seed_from_u64(seed);
            let summary = populate(&pool, &options, &mut rng).await.unwrap();
            assert_eq!(summary.categories, 6);
            assert_eq!(summary.events, 30);
            assert_eq!(summary.participants, 100);

            assert_eq!(categories::get_all_categories(&pool).await.unwrap().len(), 6);
            assert_eq!(events::count_events(&pool).await.unwrap(), 30);
            assert_eq!(participants::count_participants(&pool).await.unwrap(), 100);
            assert_eq!(link_count(&pool).await, summary.links as i64);
        }
    }

    #[tokio::test]
    async fn every_participant_joins_one_to_four_events() {
        let pool = testing::pool().await;
        let mut rng = StdRng::seed_from_u64(7);
        populate(&pool, &SeedOptions::default(), &mut rng)
            .await
            .unwrap();

        for participant in participants::get_all_participants(&pool).await.unwrap() {
            let joined = registrations::events_for_participant(&pool, participant.id)
                .await
                .unwrap();
            assert!((1..=4).contains(&joined.len()), "{}", participant.email);
        }
    }

    #[tokio::test]
    async fn dates_stay_in_range() {
        let pool = testing::pool().await;
        let mut rng = StdRng::seed_from_u64(42);
        populate(&pool, &SeedOptions::default(), &mut rng)
            .await
            .unwrap();

        let today = Local::now().date_naive();
        for details in events::list_events(&pool, &EventFilter::default()).await.unwrap() {
            let event = details.event;
            assert!(event.start_date > today);
            assert!(event.start_date <= today + TimeDelta::days(90));
            if let Some(end_date) = event.end_date {
                assert!(end_date >= event.start_date);
                assert!(end_date <= event.start_date + TimeDelta::days(90));
            }
        }
    }

    #[tokio::test]
    async fn more_categories_than_names_repeats_names() {
        let pool = testing::pool().await;
        let mut rng = StdRng::seed_from_u64(3);
        let options = SeedOptions {
            categories: 15,
            events: 5,
            participants: 3,
        };
        let summary = populate(&pool, &options, &mut rng).await.unwrap();
        assert_eq!(summary.categories, 15);
        assert_eq!(summary.sample.len(), 5);

        let names: Vec<String> = categories::get_all_categories(&pool)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        for name in CATEGORY_NAMES {
            assert!(names.iter().any(|n| n == name), "{name}");
        }
    }

    #[tokio::test]
    async fn no_events_means_no_links() {
        let pool = testing::pool().await;
        let mut rng = StdRng::seed_from_u64(5);
        let options = SeedOptions {
            categories: 0,
            events: 10,
            participants: 4,
        };
        let summary = populate(&pool, &options, &mut rng).await.unwrap();
        assert_eq!(summary.events, 0);
        assert_eq!(summary.participants, 4);
        assert_eq!(link_count(&pool).await, 0);
    }
}
