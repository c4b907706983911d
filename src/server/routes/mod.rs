mod categories;
mod dashboard;
mod events;
mod participants;

pub use categories::category_router;
pub use dashboard::dashboard_router;
pub use events::events_router;
pub use participants::participants_router;

use crate::db::Category;
use crate::forms::Choice;
use crate::server::error::AppError;

pub type ApiResponse<T> = Result<T, AppError>;

/// Turns a missing row into a not-found page for `what`.
pub(crate) fn found<T>(result: sqlx::Result<T>, what: &str) -> ApiResponse<T> {
    result.map_err(|err| match err {
        sqlx::Error::RowNotFound => AppError::NotFound(what.to_owned()),
        err => AppError::Database(err),
    })
}

pub(crate) fn category_choices(categories: &[Category]) -> Vec<Choice> {
    categories
        .iter()
        .map(|c| Choice {
            value: c.id.to_string(),
            label: c.name.clone(),
        })
        .collect()
}

pub(crate) fn details_url(event_id: i64) -> String {
    format!("/event-details/{event_id}/")
}
