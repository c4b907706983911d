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
        queries::{categories, events},
        Event,
    },
    forms::{CategoryForm, FormData, RenderedField},
    server::{app::AppState, notice::Notice},
    telemetry::record_action,
};

use super::{details_url, found, ApiResponse};

#[derive(Template, WebTemplate)]
#[template(path = "update_category.html")]
struct UpdateCategoryPage {
    event: Event,
    fields: Vec<RenderedField>,
}

async fn update_category_page(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> ApiResponse<UpdateCategoryPage> {
    let event = found(events::get_event(&pool, id).await, "Event")?;
    let category = categories::get_category(&pool, event.category_id).await?;
    Ok(UpdateCategoryPage {
        event,
        fields: CategoryForm::unbound(Some(category)).fields(),
    })
}

/// Edits the category of the event in place, which every event in that category sees.
async fn update_category(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    Form(data): Form<FormData>,
) -> ApiResponse<Response> {
    let event = found(events::get_event(&pool, id).await, "Event")?;
    let category = categories::get_category(&pool, event.category_id).await?;
    let mut form = CategoryForm::bound(data, Some(category));

    if let Some(category) = form.submit(&pool).await? {
        record_action("category_updated");
        tracing::info!(
            event_id = event.id,
            category_id = category.id,
            "Category updated successfully"
        );
        return Ok(Notice::CategoryUpdated
            .redirect(&details_url(event.id))
            .into_response());
    }

    Ok(UpdateCategoryPage {
        fields: form.fields(),
        event,
    }
    .into_response())
}

pub fn category_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/update-category/{id}/",
            get(update_category_page).post(update_category),
        )
        .with_state(state)
}
