use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    routing::get,
    Router,
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::{
    db::{
        queries::{events, participants},
        Event, EventCounts, EventDetails, Participant, TimeWindow,
    },
    server::{app::AppState, deserializers::empty_string_as_none},
};

use super::ApiResponse;

#[derive(Deserialize)]
struct DashboardQuery {
    // legacy name, still accepted from old links
    #[serde(default, alias = "type", deserialize_with = "empty_string_as_none")]
    window: Option<String>,
}

#[derive(Template, WebTemplate)]
#[template(path = "organizer_dashboard.html")]
struct OrganizerDashboardPage {
    window: &'static str,
    today: NaiveDate,
    events: Vec<EventDetails>,
    counts: EventCounts,
    todays_events: Vec<Event>,
    participants: Vec<Participant>,
    participant_count: i64,
}

async fn organizer_dashboard(
    State(pool): State<SqlitePool>,
    Query(query): Query<DashboardQuery>,
) -> ApiResponse<OrganizerDashboardPage> {
    let today = Local::now().date_naive();
    let window = query
        .window
        .as_deref()
        .map(TimeWindow::from_query)
        .unwrap_or_default();

    Ok(OrganizerDashboardPage {
        window: window.as_str(),
        today,
        events: events::list_events_in_window(&pool, window, today).await?,
        counts: events::event_counts(&pool, today).await?,
        todays_events: events::events_starting_on(&pool, today).await?,
        participants: participants::get_all_participants(&pool).await?,
        participant_count: participants::count_participants(&pool).await?,
    })
}

pub fn dashboard_router(state: AppState) -> Router {
    Router::new()
        .route("/organizer-dashboard/", get(organizer_dashboard))
        .with_state(state)
}
