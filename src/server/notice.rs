//! One-shot confirmation shown on the page a successful write redirects to.

use axum::response::Redirect;
use serde::Deserialize;

use super::deserializers::deserialize_notice;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    EventCreated,
    EventUpdated,
    ParticipantUpdated,
    CategoryUpdated,
}

impl Notice {
    pub fn code(self) -> &'static str {
        match self {
            Notice::EventCreated => "event-created",
            Notice::EventUpdated => "event-updated",
            Notice::ParticipantUpdated => "participant-updated",
            Notice::CategoryUpdated => "category-updated",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        [
            Notice::EventCreated,
            Notice::EventUpdated,
            Notice::ParticipantUpdated,
            Notice::CategoryUpdated,
        ]
        .into_iter()
        .find(|notice| notice.code() == code)
    }

    pub fn message(self) -> &'static str {
        match self {
            Notice::EventCreated => "Event created successfully",
            Notice::EventUpdated => "Event updated successfully",
            Notice::ParticipantUpdated => "Participant updated successfully.",
            Notice::CategoryUpdated => "Category updated successfully.",
        }
    }

    /// `path` must not carry a query string.
    pub fn redirect(self, path: &str) -> Redirect {
        Redirect::to(&format!("{path}?notice={}", self.code()))
    }
}

/// Query of a page that can show a notice. Unknown codes are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct NoticeQuery {
    #[serde(default, deserialize_with = "deserialize_notice")]
    pub notice: Option<Notice>,
}

impl NoticeQuery {
    pub fn message(&self) -> Option<&'static str> {
        self.notice.map(Notice::message)
    }
}
