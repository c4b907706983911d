use askama::Template;
use askama_web::WebTemplate;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::db::DbError;
use crate::forms::FormError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("database error")]
    Database(#[from] sqlx::Error),
    #[error("cannot save a form that did not validate")]
    InvalidForm,
}

impl From<FormError> for AppError {
    fn from(error: FormError) -> Self {
        match error {
            FormError::Invalid | FormError::Conflict => AppError::InvalidForm,
            FormError::Database(err) => err.into(),
        }
    }
}

impl From<DbError> for AppError {
    fn from(error: DbError) -> Self {
        match error {
            DbError::Sqlx(err) => err.into(),
            DbError::HasDependents { .. } => AppError::BadRequest(error.to_string()),
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "404.html")]
pub struct NotFoundPage {
    pub what: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound(what) => (StatusCode::NOT_FOUND, NotFoundPage { what }).into_response(),
            AppError::Database(sqlx::Error::RowNotFound) => (
                StatusCode::NOT_FOUND,
                NotFoundPage {
                    what: "Page".to_owned(),
                },
            )
                .into_response(),
            AppError::BadRequest(message) => {
                tracing::info!(%message, "Bad request");
                (StatusCode::BAD_REQUEST, message).into_response()
            }
            AppError::Database(err) => {
                tracing::error!(error = ?err, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "A database error occurred").into_response()
            }
            AppError::InvalidForm => {
                tracing::error!("Attempted to save an invalid form");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}
