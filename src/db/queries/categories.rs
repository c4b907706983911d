use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

use crate::db::{DbError, DeletePolicy};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: String,
    pub description: String,
}

pub async fn get_all_categories(pool: &SqlitePool) -> sqlx::Result<Vec<Category>> {
    sqlx::query_as::<_, Category>(
        r#"
        SELECT id, name, description FROM categories ORDER BY name, id
        "#,
    )
    .fetch_all(pool)
    .await
}

pub async fn get_category(pool: &SqlitePool, id: i64) -> sqlx::Result<Category> {
    sqlx::query_as::<_, Category>(
        r#"
        SELECT id, name, description FROM categories WHERE categories.id = ?1
        "#,
    )
    .bind(id)
    .fetch_one(pool)
    .await
}

pub async fn create_category(pool: &SqlitePool, category: &NewCategory) -> sqlx::Result<i64> {
    let id = sqlx::query(
        r#"
        INSERT INTO categories (name, description) VALUES (?1, ?2)
        "#,
    )
    .bind(&category.name)
    .bind(&category.description)
    .execute(pool)
    .await?
    .last_insert_rowid();

    Ok(id)
}

pub async fn update_category(pool: &SqlitePool, id: i64, category: &NewCategory) -> sqlx::Result<()> {
    let updated = sqlx::query(
        r#"
        UPDATE categories SET name=?1, description=?2 WHERE categories.id = ?3
        "#,
    )
    .bind(&category.name)
    .bind(&category.description)
    .bind(id)
    .execute(pool)
    .await?
    .rows_affected();

    if updated == 0 {
        return Err(sqlx::Error::RowNotFound);
    }
    Ok(())
}

pub async fn count_events_in_category(pool: &SqlitePool, id: i64) -> sqlx::Result<i64> {
    sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM events WHERE events.category_id = ?1
        "#,
    )
    .bind(id)
    .fetch_one(pool)
    .await
}

/// Deletes a category. Events are owned by their category: `Cascade` removes them (and their
/// participant links) in the same transaction, `Reject` refuses while any remain.
///
/// Returns the number of events deleted alongside the category.
pub async fn delete_category(
    pool: &SqlitePool,
    id: i64,
    policy: DeletePolicy,
) -> Result<u64, DbError> {
    get_category(pool, id).await?;
    let events = count_events_in_category(pool, id).await?;
    if events > 0 && policy == DeletePolicy::Reject {
        return Err(DbError::HasDependents {
            category_id: id,
            events,
        });
    }

    let mut tx = pool.begin().await?;
    sqlx::query(
        r#"
        DELETE FROM event_participants
        WHERE event_id IN (SELECT id FROM events WHERE events.category_id = ?1)
        "#,
    )
    .bind(id)
    .execute(&mut *tx)
    .await?;
    let deleted_events = sqlx::query(
        r#"
        DELETE FROM events WHERE events.category_id = ?1
        "#,
    )
    .bind(id)
    .execute(&mut *tx)
    .await?
    .rows_affected();
    sqlx::query(
        r#"
        DELETE FROM categories WHERE categories.id = ?1
        "#,
    )
    .bind(id)
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;

    tracing::debug!(category_id = id, deleted_events, "Category deleted");
    Ok(deleted_events)
}

pub async fn delete_all_categories(pool: &SqlitePool) -> sqlx::Result<u64> {
    let deleted = sqlx::query("DELETE FROM categories")
        .execute(pool)
        .await?
        .rows_affected();
    Ok(deleted)
}
