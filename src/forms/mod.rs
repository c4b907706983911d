//! Forms bound to entities: parse submitted fields, validate them (including checks that need
//! the database), save the result and describe every field for rendering.

mod category;
mod event;
pub mod fields;
mod participant;

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use sqlx::SqlitePool;
use validator::ValidationErrors;

pub use category::CategoryFields;
pub use event::EventFields;
pub use fields::{FieldSpec, Widget};
pub use participant::ParticipantFields;

/// Raw submitted values keyed by field name.
pub type FormData = HashMap<String, String>;
/// Error messages keyed by field name.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

pub type EventForm = EntityForm<EventFields>;
pub type ParticipantForm = EntityForm<ParticipantFields>;
pub type CategoryForm = EntityForm<CategoryFields>;

pub const REQUIRED: &str = "This field is required.";

#[derive(Debug, thiserror::Error)]
pub enum FormError {
    #[error("form is not valid")]
    Invalid,
    /// The write collided with a stored row; the form now carries the field errors.
    #[error("form conflicts with a stored row")]
    Conflict,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Binds one entity type to its field table.
#[async_trait]
pub trait ModelForm: Send + Sync {
    type Instance: Send + Sync;
    type Cleaned: Send + Sync;

    const FIELDS: &'static [FieldSpec];

    /// Values shown for a fresh form, or for a form editing `instance`.
    fn initial(instance: Option<&Self::Instance>) -> FormData;

    /// Field-level parsing and validation that needs nothing but the submitted values.
    fn clean(data: &FormData) -> Result<Self::Cleaned, FieldErrors>;

    /// Validation against stored rows (references, uniqueness).
    async fn validate_stored(
        _pool: &SqlitePool,
        _cleaned: &Self::Cleaned,
        _instance: Option<&Self::Instance>,
    ) -> sqlx::Result<FieldErrors> {
        Ok(FieldErrors::new())
    }

    /// Field errors for a write the database refused, when the refusal is the user's to fix.
    fn conflict(_err: &sqlx::Error) -> Option<FieldErrors> {
        None
    }

    /// Creates a row, or updates `instance` in place.
    async fn save(
        pool: &SqlitePool,
        cleaned: &Self::Cleaned,
        instance: Option<&Self::Instance>,
    ) -> sqlx::Result<Self::Instance>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub value: String,
    pub label: String,
}

/// One field ready for a template.
#[derive(Debug, Clone)]
pub struct RenderedField {
    pub name: String,
    pub label: &'static str,
    pub input_type: &'static str,
    pub class: &'static str,
    pub placeholder: Option<String>,
    pub required: bool,
    pub value: String,
    pub errors: Vec<String>,
    pub choices: Vec<RenderedChoice>,
}

#[derive(Debug, Clone)]
pub struct RenderedChoice {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

pub struct EntityForm<M: ModelForm> {
    prefix: Option<&'static str>,
    data: Option<FormData>,
    instance: Option<M::Instance>,
    choices: HashMap<&'static str, Vec<Choice>>,
    errors: FieldErrors,
    cleaned: Option<M::Cleaned>,
}

impl<M: ModelForm> EntityForm<M> {
    /// A form with no submitted data, showing defaults or the values of `instance`.
    pub fn unbound(instance: Option<M::Instance>) -> Self {
        Self {
            prefix: None,
            data: None,
            instance,
            choices: HashMap::new(),
            errors: FieldErrors::new(),
            cleaned: None,
        }
    }

    /// A form carrying submitted data, optionally editing `instance`.
    pub fn bound(data: FormData, instance: Option<M::Instance>) -> Self {
        Self {
            data: Some(data),
            ..Self::unbound(instance)
        }
    }

    /// Reads and renders fields as `<prefix>-<name>` so several forms can share one submission.
    pub fn with_prefix(mut self, prefix: &'static str) -> Self {
        self.prefix = Some(prefix);
        self
    }

    pub fn with_choices(mut self, field: &'static str, choices: Vec<Choice>) -> Self {
        self.choices.insert(field, choices);
        self
    }

    pub fn is_bound(&self) -> bool {
        self.data.is_some()
    }

    pub fn instance(&self) -> Option<&M::Instance> {
        self.instance.as_ref()
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    fn html_name(&self, field: &str) -> String {
        match self.prefix {
            Some(prefix) => format!("{prefix}-{field}"),
            None => field.to_owned(),
        }
    }

    /// Submitted values for this form's fields, with the prefix stripped.
    fn submitted(&self) -> Option<FormData> {
        let data = self.data.as_ref()?;
        Some(
            M::FIELDS
                .iter()
                .filter_map(|spec| {
                    data.get(&self.html_name(spec.name))
                        .map(|value| (spec.name.to_owned(), value.clone()))
                })
                .collect(),
        )
    }

    /// Runs every validation step. An unbound form is never valid.
    pub async fn is_valid(&mut self, pool: &SqlitePool) -> Result<bool, FormError> {
        self.errors.clear();
        self.cleaned = None;
        let Some(data) = self.submitted() else {
            return Ok(false);
        };

        match M::clean(&data) {
            Ok(cleaned) => {
                let errors = M::validate_stored(pool, &cleaned, self.instance.as_ref()).await?;
                if errors.is_empty() {
                    self.cleaned = Some(cleaned);
                } else {
                    self.errors = errors;
                }
            }
            Err(errors) => self.errors = errors,
        }
        Ok(self.errors.is_empty())
    }

    /// Persists a validated form. Call `is_valid` first.
    pub async fn save(&mut self, pool: &SqlitePool) -> Result<M::Instance, FormError> {
        let cleaned = self.cleaned.as_ref().ok_or(FormError::Invalid)?;
        match M::save(pool, cleaned, self.instance.as_ref()).await {
            Ok(instance) => Ok(instance),
            Err(err) => match M::conflict(&err) {
                Some(errors) => {
                    self.errors = errors;
                    self.cleaned = None;
                    Err(FormError::Conflict)
                }
                None => Err(err.into()),
            },
        }
    }

    /// Validates and saves. `None` means the form has errors to show.
    pub async fn submit(&mut self, pool: &SqlitePool) -> Result<Option<M::Instance>, FormError> {
        if !self.is_valid(pool).await? {
            return Ok(None);
        }
        match self.save(pool).await {
            Ok(instance) => Ok(Some(instance)),
            Err(FormError::Conflict) => Ok(None),
            Err(err) => Err(err),
        }
    }

    pub fn fields(&self) -> Vec<RenderedField> {
        let values = match self.submitted() {
            Some(data) => data,
            None => M::initial(self.instance.as_ref()),
        };
        M::FIELDS
            .iter()
            .map(|spec| {
                let value = values.get(spec.name).cloned().unwrap_or_default();
                let choices = self
                    .choices
                    .get(spec.name)
                    .map(|choices| {
                        choices
                            .iter()
                            .map(|choice| RenderedChoice {
                                selected: choice.value == value,
                                value: choice.value.clone(),
                                label: choice.label.clone(),
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                RenderedField {
                    name: self.html_name(spec.name),
                    label: spec.label,
                    input_type: spec.widget.input_type(),
                    class: spec.class(),
                    placeholder: spec.placeholder(),
                    // a prefixed section rides along with another form and may be left blank
                    required: spec.required && self.prefix.is_none(),
                    errors: self.errors.get(spec.name).cloned().unwrap_or_default(),
                    choices,
                    value,
                }
            })
            .collect()
    }
}

/// Trimmed value of a field; `None` when missing or blank.
pub(crate) fn value<'a>(data: &'a FormData, field: &str) -> Option<&'a str> {
    data.get(field).map(|v| v.trim()).filter(|v| !v.is_empty())
}

pub(crate) fn add_error(errors: &mut FieldErrors, field: &str, message: impl Into<String>) {
    errors
        .entry(field.to_owned())
        .or_default()
        .push(message.into());
}

/// Value of a required field, recording an error when it is blank.
pub(crate) fn required<'a>(
    data: &'a FormData,
    field: &str,
    errors: &mut FieldErrors,
) -> Option<&'a str> {
    let found = value(data, field);
    if found.is_none() {
        add_error(errors, field, REQUIRED);
    }
    found
}

/// Copies validator messages onto fields that have no error yet.
pub(crate) fn merge_validation(errors: &mut FieldErrors, result: Result<(), ValidationErrors>) {
    let Err(validation) = result else {
        return;
    };
    for (field, failures) in validation.field_errors() {
        let field = field.to_string();
        if errors.contains_key(&field) {
            continue;
        }
        for failure in failures.iter() {
            let message = failure
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("Invalid value ({}).", failure.code));
            add_error(errors, &field, message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing;

    fn data(pairs: &[(&str, &str)]) -> FormData {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn unbound_form_is_never_valid() {
        let pool = testing::pool().await;
        let mut form = CategoryForm::unbound(None);
        assert!(!form.is_bound());
        assert!(!form.is_valid(&pool).await.unwrap());
        assert!(form.errors().is_empty());
        assert!(matches!(form.save(&pool).await, Err(FormError::Invalid)));
    }

    #[tokio::test]
    async fn prefix_scopes_submitted_keys() {
        let pool = testing::pool().await;
        let submitted = data(&[
            ("name", "Jazz Night"),
            ("participant-name", "Ana"),
            ("participant-email", "ana@example.com"),
        ]);

        let mut form = ParticipantForm::bound(submitted, None).with_prefix("participant");
        assert!(form.is_valid(&pool).await.unwrap());
        let participant = form.save(&pool).await.unwrap();
        assert_eq!(participant.name, "Ana");

        let fields = form.fields();
        let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["participant-name", "participant-email"]);
        assert!(fields.iter().all(|f| !f.required));
        assert!(ParticipantForm::unbound(None).fields().iter().all(|f| f.required));
    }

    #[tokio::test]
    async fn rendered_fields_carry_style_and_errors() {
        let pool = testing::pool().await;
        let mut form = CategoryForm::bound(data(&[("name", ""), ("description", "d")]), None);
        assert!(!form.is_valid(&pool).await.unwrap());

        let fields = form.fields();
        assert_eq!(fields[0].name, "name");
        assert_eq!(fields[0].errors, vec![REQUIRED.to_owned()]);
        assert_eq!(fields[0].placeholder.as_deref(), Some("Enter your category"));
        assert_eq!(fields[0].class, fields::FIELD_CLASS);
        assert_eq!(fields[1].input_type, "textarea");
        assert_eq!(fields[1].value, "d");
        assert!(fields[1].errors.is_empty());
    }

    #[test]
    fn required_trims_whitespace() {
        let mut errors = FieldErrors::new();
        let submitted = data(&[("name", "   "), ("location", " Paris ")]);
        assert_eq!(required(&submitted, "name", &mut errors), None);
        assert_eq!(required(&submitted, "location", &mut errors), Some("Paris"));
        assert_eq!(required(&submitted, "missing", &mut errors), None);
        assert_eq!(errors.len(), 2);
    }
}
