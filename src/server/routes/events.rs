use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Form, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::{
    db::{
        queries::{categories, events, registrations},
        Category, Event, EventDetails, EventFilter,
    },
    forms::{EventForm, FormData, ParticipantForm, RenderedField},
    server::{
        app::AppState,
        deserializers::{deserialize_notice, deserialize_optional_date, empty_string_as_none},
        notice::{Notice, NoticeQuery},
    },
    telemetry::record_action,
};

use super::{category_choices, details_url, found, ApiResponse};

const PARTICIPANT_PREFIX: &str = "participant";

#[derive(Deserialize)]
struct EventsQuery {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    q: Option<String>,
    // legacy name, still accepted from old links
    #[serde(default, alias = "type", deserialize_with = "empty_string_as_none")]
    category: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    end_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "deserialize_notice")]
    notice: Option<Notice>,
}

impl EventsQuery {
    fn filter(&self) -> EventFilter {
        EventFilter {
            query: self.q.clone(),
            category: self.category.clone(),
            // only applied when both bounds are given
            date_range: self.start_date.zip(self.end_date),
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "event_home.html")]
struct EventHomePage {
    notice: Option<&'static str>,
    action: &'static str,
    events: Vec<EventDetails>,
    categories: Vec<Category>,
    q: String,
    category: String,
    start_date: String,
    end_date: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "event_details.html")]
struct EventDetailsPage {
    notice: Option<&'static str>,
    details: EventDetails,
}

#[derive(Template, WebTemplate)]
#[template(path = "event_form.html")]
struct EventFormPage {
    heading: &'static str,
    action: String,
    event_fields: Vec<RenderedField>,
    participant_fields: Vec<RenderedField>,
}

#[derive(Template, WebTemplate)]
#[template(path = "delete_event.html")]
struct DeleteEventPage {
    event: Event,
}

async fn render_event_list(
    pool: &SqlitePool,
    query: EventsQuery,
    action: &'static str,
) -> ApiResponse<EventHomePage> {
    let events = events::list_events(pool, &query.filter()).await?;
    Ok(EventHomePage {
        notice: query.notice.map(Notice::message),
        action,
        events,
        categories: categories::get_all_categories(pool).await?,
        q: query.q.unwrap_or_default(),
        category: query.category.unwrap_or_default(),
        start_date: query.start_date.map(|d| d.to_string()).unwrap_or_default(),
        end_date: query.end_date.map(|d| d.to_string()).unwrap_or_default(),
    })
}

async fn view_events(
    State(pool): State<SqlitePool>,
    Query(query): Query<EventsQuery>,
) -> ApiResponse<EventHomePage> {
    render_event_list(&pool, query, "/").await
}

async fn search_events(
    State(pool): State<SqlitePool>,
    Query(query): Query<EventsQuery>,
) -> ApiResponse<EventHomePage> {
    render_event_list(&pool, query, "/search-events/").await
}

async fn event_details(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    Query(query): Query<NoticeQuery>,
) -> ApiResponse<EventDetailsPage> {
    let details = found(events::get_event_details(&pool, id).await, "Event")?;
    Ok(EventDetailsPage {
        notice: query.message(),
        details,
    })
}

async fn event_form_page(
    pool: &SqlitePool,
    heading: &'static str,
    action: String,
    event_form: EventForm,
    participant_form: Option<ParticipantForm>,
) -> ApiResponse<EventFormPage> {
    let choices = category_choices(&categories::get_all_categories(pool).await?);
    Ok(EventFormPage {
        heading,
        action,
        event_fields: event_form.with_choices("category", choices).fields(),
        participant_fields: participant_form.map(|f| f.fields()).unwrap_or_default(),
    })
}

async fn create_event_page(State(pool): State<SqlitePool>) -> ApiResponse<EventFormPage> {
    event_form_page(
        &pool,
        "Create Event",
        "/create-event/".to_owned(),
        EventForm::unbound(None),
        Some(ParticipantForm::unbound(None).with_prefix(PARTICIPANT_PREFIX)),
    )
    .await
}

/// Saves the event, then the participant section if it validates. The two writes are not
/// atomic: an event is kept even when its participant cannot be saved.
async fn create_event(
    State(pool): State<SqlitePool>,
    Form(data): Form<FormData>,
) -> ApiResponse<Response> {
    let mut event_form = EventForm::bound(data.clone(), None);
    let mut participant_form =
        ParticipantForm::bound(data, None).with_prefix(PARTICIPANT_PREFIX);

    if event_form.is_valid(&pool).await? {
        let event = event_form.save(&pool).await?;
        record_action("event_created");
        // a blank, invalid or conflicting participant section is skipped
        if let Some(participant) = participant_form.submit(&pool).await? {
            registrations::add_participant_to_event(&pool, event.id, participant.id).await?;
            record_action("participant_registered");
            tracing::info!(event_id = event.id, participant_id = participant.id, "Participant registered");
        }
        tracing::info!(event_id = event.id, "Event created successfully");
        return Ok(Notice::EventCreated.redirect("/").into_response());
    }

    // run it for its error messages only
    participant_form.is_valid(&pool).await?;
    Ok(event_form_page(
        &pool,
        "Create Event",
        "/create-event/".to_owned(),
        event_form,
        Some(participant_form),
    )
    .await?
    .into_response())
}

async fn update_event_page(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> ApiResponse<EventFormPage> {
    let event = found(events::get_event(&pool, id).await, "Event")?;
    event_form_page(
        &pool,
        "Update Event",
        format!("/update-event/{id}/"),
        EventForm::unbound(Some(event)),
        None,
    )
    .await
}

async fn update_event(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    Form(data): Form<FormData>,
) -> ApiResponse<Response> {
    let event = found(events::get_event(&pool, id).await, "Event")?;
    let mut form = EventForm::bound(data, Some(event));

    if form.is_valid(&pool).await? {
        let event = form.save(&pool).await?;
        record_action("event_updated");
        tracing::info!(event_id = event.id, "Event updated successfully");
        return Ok(Notice::EventUpdated
            .redirect(&details_url(event.id))
            .into_response());
    }

    Ok(event_form_page(&pool, "Update Event", format!("/update-event/{id}/"), form, None)
        .await?
        .into_response())
}

async fn delete_event_page(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> ApiResponse<DeleteEventPage> {
    let event = found(events::get_event(&pool, id).await, "Event")?;
    Ok(DeleteEventPage { event })
}

async fn delete_event(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> ApiResponse<Redirect> {
    found(events::delete_event(&pool, id).await, "Event")?;
    record_action("event_deleted");
    tracing::info!(event_id = id, "Event deleted");
    Ok(Redirect::to("/organizer-dashboard/"))
}

pub fn events_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(view_events))
        .route("/search-events/", get(search_events))
        .route("/event-details/{id}/", get(event_details))
        .route("/create-event/", get(create_event_page).post(create_event))
        .route("/update-event/{id}/", get(update_event_page).post(update_event))
        .route("/delete-event/{id}/", get(delete_event_page).post(delete_event))
        .with_state(state)
}
