use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use time::OffsetDateTime;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub id: i64,
    pub name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

pub async fn list_all(db: &SqlitePool) -> anyhow::Result<Vec<Profile>> {
    let rows = sqlx::query_as::<_, Profile>(
        r#"
        SELECT id, name, created_at
        FROM profiles
        ORDER BY id
        "#,
    )
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn create(db: &SqlitePool, name: &str) -> anyhow::Result<Profile> {
    let profile = sqlx::query_as::<_, Profile>(
        r#"
        INSERT INTO profiles (name, created_at)
        VALUES (?, ?)
        RETURNING id, name, created_at
        "#,
    )
    .bind(name)
    .bind(OffsetDateTime::now_utc())
    .fetch_one(db)
    .await?;
    Ok(profile)
}

/// Rename a profile, returning `None` when the id does not exist.
pub async fn update_name(
    db: &SqlitePool,
    id: i64,
    name: &str,
) -> anyhow::Result<Option<Profile>> {
    let profile = sqlx::query_as::<_, Profile>(
        r#"
        UPDATE profiles
        SET name = ?
        WHERE id = ?
        RETURNING id, name, created_at
        "#,
    )
    .bind(name)
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(profile)
}

/// Delete a profile, reporting whether a row existed.
pub async fn delete(db: &SqlitePool, id: i64) -> anyhow::Result<bool> {
    let result = sqlx::query("DELETE FROM profiles WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}
