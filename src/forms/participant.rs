use async_trait::async_trait;
use sqlx::SqlitePool;
use validator::Validate;

use super::{add_error, merge_validation, required, FieldErrors, FieldSpec, FormData, ModelForm};
use crate::db::queries::participants;
use crate::db::{NewParticipant, Participant};

pub const EMAIL_TAKEN: &str = "Participant with this Email already exists.";

pub struct ParticipantFields;

#[derive(Validate)]
struct ParticipantInput {
    #[validate(length(max = 100, message = "Ensure this value has at most 100 characters."))]
    name: String,
    #[validate(
        email(message = "Enter a valid email address."),
        length(max = 254, message = "Ensure this value has at most 254 characters.")
    )]
    email: String,
}

#[async_trait]
impl ModelForm for ParticipantFields {
    type Instance = Participant;
    type Cleaned = NewParticipant;

    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::text("name", "Participant Name"),
        FieldSpec::email("email", "Participant Email"),
    ];

    fn initial(instance: Option<&Participant>) -> FormData {
        let mut data = FormData::new();
        if let Some(participant) = instance {
            data.insert("name".into(), participant.name.clone());
            data.insert("email".into(), participant.email.clone());
        }
        data
    }

    fn clean(data: &FormData) -> Result<NewParticipant, FieldErrors> {
        let mut errors = FieldErrors::new();
        let name = required(data, "name", &mut errors);
        let email = required(data, "email", &mut errors);
        let input = ParticipantInput {
            name: name.unwrap_or_default().to_owned(),
            email: email.unwrap_or_default().to_owned(),
        };
        merge_validation(&mut errors, input.validate());

        if errors.is_empty() {
            Ok(NewParticipant {
                name: input.name,
                email: input.email,
            })
        } else {
            Err(errors)
        }
    }

    async fn validate_stored(
        pool: &SqlitePool,
        cleaned: &NewParticipant,
        instance: Option<&Participant>,
    ) -> sqlx::Result<FieldErrors> {
        let mut errors = FieldErrors::new();
        if participants::email_taken(pool, &cleaned.email, instance.map(|p| p.id)).await? {
            add_error(&mut errors, "email", EMAIL_TAKEN);
        }
        Ok(errors)
    }

    // another writer can take the address between the check above and the insert
    fn conflict(err: &sqlx::Error) -> Option<FieldErrors> {
        let taken = err
            .as_database_error()
            .is_some_and(|db_err| db_err.is_unique_violation());
        taken.then(|| FieldErrors::from([("email".to_owned(), vec![EMAIL_TAKEN.to_owned()])]))
    }

    async fn save(
        pool: &SqlitePool,
        cleaned: &NewParticipant,
        instance: Option<&Participant>,
    ) -> sqlx::Result<Participant> {
        let id = match instance {
            Some(participant) => {
                participants::update_participant(pool, participant.id, cleaned).await?;
                participant.id
            }
            None => participants::create_participant(pool, cleaned).await?,
        };
        participants::get_participant(pool, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing;
    use crate::forms::{FormError, ParticipantForm, REQUIRED};

    fn submission(name: &str, email: &str) -> FormData {
        FormData::from([
            ("name".to_owned(), name.to_owned()),
            ("email".to_owned(), email.to_owned()),
        ])
    }

    #[tokio::test]
    async fn duplicate_email_is_a_field_error() {
        let pool = testing::pool().await;
        let mut first = ParticipantForm::bound(submission("Ana", "ana@example.com"), None);
        assert!(first.is_valid(&pool).await.unwrap());
        first.save(&pool).await.unwrap();

        let mut second = ParticipantForm::bound(submission("Ana B", "ana@example.com"), None);
        assert!(!second.is_valid(&pool).await.unwrap());
        assert_eq!(second.errors()["email"], vec![EMAIL_TAKEN.to_owned()]);
        assert_eq!(participants::count_participants(&pool).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn email_taken_after_validation_becomes_field_error() {
        let pool = testing::pool().await;
        let mut form = ParticipantForm::bound(submission("Ana", "ana@example.com"), None);
        assert!(form.is_valid(&pool).await.unwrap());

        testing::participant(&pool, "Someone Else", "ana@example.com").await;

        assert!(matches!(form.save(&pool).await, Err(FormError::Conflict)));
        assert_eq!(form.errors()["email"], vec![EMAIL_TAKEN.to_owned()]);
        let email = form.fields().into_iter().find(|f| f.name == "email").unwrap();
        assert_eq!(email.errors, vec![EMAIL_TAKEN.to_owned()]);
        assert_eq!(participants::count_participants(&pool).await.unwrap(), 1);

        // a later submission sees the stored row during validation
        assert_eq!(form.submit(&pool).await.unwrap(), None);
        assert_eq!(form.errors()["email"], vec![EMAIL_TAKEN.to_owned()]);
    }

    #[tokio::test]
    async fn editing_may_keep_own_email() {
        let pool = testing::pool().await;
        let ana = testing::participant(&pool, "Ana", "ana@example.com").await;

        let mut form =
            ParticipantForm::bound(submission("Ana Maria", "ana@example.com"), Some(ana.clone()));
        assert!(form.is_valid(&pool).await.unwrap());
        let saved = form.save(&pool).await.unwrap();

        assert_eq!(saved.id, ana.id);
        assert_eq!(saved.name, "Ana Maria");
    }

    #[test]
    fn email_format_is_checked() {
        let errors = ParticipantFields::clean(&submission("Ana", "not-an-email")).unwrap_err();
        assert_eq!(errors["email"], vec!["Enter a valid email address.".to_owned()]);
        assert!(!errors.contains_key("name"));
    }

    #[test]
    fn blank_section_is_invalid() {
        let errors = ParticipantFields::clean(&FormData::new()).unwrap_err();
        assert_eq!(errors["name"], vec![REQUIRED.to_owned()]);
        assert_eq!(errors["email"], vec![REQUIRED.to_owned()]);
    }

    #[test]
    fn placeholders_come_from_labels() {
        let fields = ParticipantForm::unbound(None).fields();
        assert_eq!(
            fields[0].placeholder.as_deref(),
            Some("Enter your participant name")
        );
        assert_eq!(fields[1].input_type, "email");
    }
}
