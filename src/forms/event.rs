use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use sqlx::SqlitePool;
use validator::Validate;

use super::{add_error, merge_validation, required, value, FieldErrors, FieldSpec, FormData, ModelForm};
use crate::db::queries::{categories, events};
use crate::db::{Event, NewEvent};

pub const INVALID_DATE: &str = "Enter a valid date.";
pub const INVALID_TIME: &str = "Enter a valid time.";
pub const INVALID_CHOICE: &str =
    "Select a valid choice. That choice is not one of the available choices.";
pub const END_BEFORE_START: &str = "The end date cannot be before the start date.";

pub fn default_event_time() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN)
}

pub struct EventFields;

#[derive(Validate)]
struct EventText {
    #[validate(length(max = 100, message = "Ensure this value has at most 100 characters."))]
    name: String,
    #[validate(length(max = 250, message = "Ensure this value has at most 250 characters."))]
    description: String,
    #[validate(length(max = 255, message = "Ensure this value has at most 255 characters."))]
    location: String,
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

fn parse_time(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
}

#[async_trait]
impl ModelForm for EventFields {
    type Instance = Event;
    type Cleaned = NewEvent;

    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::text("name", "Event Title"),
        FieldSpec::textarea("description", "Event Description"),
        FieldSpec::date("start_date", "Event Start Date"),
        FieldSpec::date("end_date", "Event End Date").optional(),
        FieldSpec::time("time", "Event Start Time"),
        FieldSpec::text("location", "Event Location"),
        FieldSpec::select("category", "Event Category"),
    ];

    fn initial(instance: Option<&Event>) -> FormData {
        let mut data = FormData::new();
        match instance {
            Some(event) => {
                data.insert("name".into(), event.name.clone());
                data.insert("description".into(), event.description.clone());
                data.insert("start_date".into(), event.start_date.to_string());
                if let Some(end_date) = event.end_date {
                    data.insert("end_date".into(), end_date.to_string());
                }
                data.insert("time".into(), event.time.format("%H:%M").to_string());
                data.insert("location".into(), event.location.clone());
                data.insert("category".into(), event.category_id.to_string());
            }
            None => {
                data.insert(
                    "time".into(),
                    default_event_time().format("%H:%M").to_string(),
                );
            }
        }
        data
    }

    fn clean(data: &FormData) -> Result<NewEvent, FieldErrors> {
        let mut errors = FieldErrors::new();

        let name = required(data, "name", &mut errors);
        let description = required(data, "description", &mut errors);
        let location = required(data, "location", &mut errors);
        merge_validation(
            &mut errors,
            EventText {
                name: name.unwrap_or_default().to_owned(),
                description: description.unwrap_or_default().to_owned(),
                location: location.unwrap_or_default().to_owned(),
            }
            .validate(),
        );

        let start_date = required(data, "start_date", &mut errors).and_then(|raw| {
            let parsed = parse_date(raw);
            if parsed.is_none() {
                add_error(&mut errors, "start_date", INVALID_DATE);
            }
            parsed
        });
        let end_date = match value(data, "end_date") {
            Some(raw) => match parse_date(raw) {
                Some(end) => Some(end),
                None => {
                    add_error(&mut errors, "end_date", INVALID_DATE);
                    None
                }
            },
            None => None,
        };
        if let (Some(start), Some(end)) = (start_date, end_date) {
            if end < start {
                add_error(&mut errors, "end_date", END_BEFORE_START);
            }
        }

        let time = required(data, "time", &mut errors).and_then(|raw| {
            let parsed = parse_time(raw);
            if parsed.is_none() {
                add_error(&mut errors, "time", INVALID_TIME);
            }
            parsed
        });

        let category_id = required(data, "category", &mut errors).and_then(|raw| {
            let parsed = raw.parse::<i64>().ok();
            if parsed.is_none() {
                add_error(&mut errors, "category", INVALID_CHOICE);
            }
            parsed
        });

        match (name, description, start_date, time, location, category_id) {
            (Some(name), Some(description), Some(start_date), Some(time), Some(location), Some(category_id))
                if errors.is_empty() =>
            {
                Ok(NewEvent {
                    name: name.to_owned(),
                    description: description.to_owned(),
                    start_date,
                    end_date,
                    time,
                    location: location.to_owned(),
                    category_id,
                })
            }
            _ => Err(errors),
        }
    }

    async fn validate_stored(
        pool: &SqlitePool,
        cleaned: &NewEvent,
        _instance: Option<&Event>,
    ) -> sqlx::Result<FieldErrors> {
        let mut errors = FieldErrors::new();
        match categories::get_category(pool, cleaned.category_id).await {
            Ok(_) => {}
            Err(sqlx::Error::RowNotFound) => add_error(&mut errors, "category", INVALID_CHOICE),
            Err(err) => return Err(err),
        }
        Ok(errors)
    }

    async fn save(
        pool: &SqlitePool,
        cleaned: &NewEvent,
        instance: Option<&Event>,
    ) -> sqlx::Result<Event> {
        let id = match instance {
            Some(event) => {
                events::update_event(pool, event.id, cleaned).await?;
                event.id
            }
            None => events::create_event(pool, cleaned).await?,
        };
        events::get_event(pool, id).await
    }
}
