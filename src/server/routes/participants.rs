use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::get,
    Form, Router,
};
use sqlx::SqlitePool;

use crate::{
    db::{
        queries::{events, registrations},
        Event,
    },
    forms::{FormData, ParticipantForm, RenderedField},
    server::{app::AppState, notice::Notice},
    telemetry::record_action,
};

use super::{details_url, found, ApiResponse};

#[derive(Template, WebTemplate)]
#[template(path = "update_participant.html")]
struct UpdateParticipantPage {
    event: Event,
    fields: Vec<RenderedField>,
}

async fn update_participant_page(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> ApiResponse<UpdateParticipantPage> {
    let event = found(events::get_event(&pool, id).await, "Event")?;
    Ok(UpdateParticipantPage {
        event,
        fields: ParticipantForm::unbound(None).fields(),
    })
}

/// Registers a brand-new participant for the event; existing participants are never edited here.
async fn update_participant(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    Form(data): Form<FormData>,
) -> ApiResponse<Response> {
    let event = found(events::get_event(&pool, id).await, "Event")?;
    let mut form = ParticipantForm::bound(data, None);

    if let Some(participant) = form.submit(&pool).await? {
        registrations::add_participant_to_event(&pool, event.id, participant.id).await?;
        record_action("participant_registered");
        tracing::info!(
            event_id = event.id,
            participant_id = participant.id,
            "Participant updated successfully"
        );
        return Ok(Notice::ParticipantUpdated
            .redirect(&details_url(event.id))
            .into_response());
    }

    Ok(UpdateParticipantPage {
        fields: form.fields(),
        event,
    }
    .into_response())
}

pub fn participants_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/update-participant/{id}/",
            get(update_participant_page).post(update_participant),
        )
        .with_state(state)
}
