use async_trait::async_trait;
use sqlx::SqlitePool;
use validator::Validate;

use super::{merge_validation, required, FieldErrors, FieldSpec, FormData, ModelForm};
use crate::db::queries::categories;
use crate::db::{Category, NewCategory};

pub struct CategoryFields;

#[derive(Validate)]
struct CategoryInput {
    #[validate(length(max = 100, message = "Ensure this value has at most 100 characters."))]
    name: String,
    #[validate(length(max = 250, message = "Ensure this value has at most 250 characters."))]
    description: String,
}

#[async_trait]
impl ModelForm for CategoryFields {
    type Instance = Category;
    type Cleaned = NewCategory;

    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::text("name", "Category"),
        FieldSpec::textarea("description", "Category Description"),
    ];

    fn initial(instance: Option<&Category>) -> FormData {
        let mut data = FormData::new();
        if let Some(category) = instance {
            data.insert("name".into(), category.name.clone());
            data.insert("description".into(), category.description.clone());
        }
        data
    }

    fn clean(data: &FormData) -> Result<NewCategory, FieldErrors> {
        let mut errors = FieldErrors::new();
        let name = required(data, "name", &mut errors);
        let description = required(data, "description", &mut errors);
        let input = CategoryInput {
            name: name.unwrap_or_default().to_owned(),
            description: description.unwrap_or_default().to_owned(),
        };
        merge_validation(&mut errors, input.validate());

        if errors.is_empty() {
            Ok(NewCategory {
                name: input.name,
                description: input.description,
            })
        } else {
            Err(errors)
        }
    }

    async fn save(
        pool: &SqlitePool,
        cleaned: &NewCategory,
        instance: Option<&Category>,
    ) -> sqlx::Result<Category> {
        let id = match instance {
            Some(category) => {
                categories::update_category(pool, category.id, cleaned).await?;
                category.id
            }
            None => categories::create_category(pool, cleaned).await?,
        };
        categories::get_category(pool, id).await
    }
}
