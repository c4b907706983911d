use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Participant {
    pub id: i64,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewParticipant {
    pub name: String,
    pub email: String,
}

pub async fn get_all_participants(pool: &SqlitePool) -> sqlx::Result<Vec<Participant>> {
    sqlx::query_as::<_, Participant>(
        r#"
        SELECT id, name, email FROM participants ORDER BY name, id
        "#,
    )
    .fetch_all(pool)
    .await
}

pub async fn get_participant(pool: &SqlitePool, id: i64) -> sqlx::Result<Participant> {
    sqlx::query_as::<_, Participant>(
        r#"
        SELECT id, name, email FROM participants WHERE participants.id = ?1
        "#,
    )
    .bind(id)
    .fetch_one(pool)
    .await
}

pub async fn create_participant(
    pool: &SqlitePool,
    participant: &NewParticipant,
) -> sqlx::Result<i64> {
    let id = sqlx::query(
        r#"
        INSERT INTO participants (name, email) VALUES (?1, ?2)
        "#,
    )
    .bind(&participant.name)
    .bind(&participant.email)
    .execute(pool)
    .await?
    .last_insert_rowid();

    Ok(id)
}

pub async fn update_participant(
    pool: &SqlitePool,
    id: i64,
    participant: &NewParticipant,
) -> sqlx::Result<()> {
    let updated = sqlx::query(
        r#"
        UPDATE participants SET name=?1, email=?2 WHERE participants.id = ?3
        "#,
    )
    .bind(&participant.name)
    .bind(&participant.email)
    .bind(id)
    .execute(pool)
    .await?
    .rows_affected();

    if updated == 0 {
        return Err(sqlx::Error::RowNotFound);
    }
    Ok(())
}

/// Whether another participant already uses `email`. `exclude` skips the row being edited.
pub async fn email_taken(
    pool: &SqlitePool,
    email: &str,
    exclude: Option<i64>,
) -> sqlx::Result<bool> {
    let matches: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM participants WHERE email = ?1 AND (?2 IS NULL OR id != ?2)
        "#,
    )
    .bind(email)
    .bind(exclude)
    .fetch_one(pool)
    .await?;
    Ok(matches > 0)
}

pub async fn count_participants(pool: &SqlitePool) -> sqlx::Result<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM participants")
        .fetch_one(pool)
        .await
}

pub async fn delete_all_participants(pool: &SqlitePool) -> sqlx::Result<u64> {
    let deleted = sqlx::query("DELETE FROM participants")
        .execute(pool)
        .await?
        .rows_affected();
    Ok(deleted)
}
