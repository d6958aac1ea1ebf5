use chrono::{DateTime, Utc};
use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use crate::error::AppError;
use crate::models::Division;

#[derive(sqlx::FromRow, Clone)]
struct DbDivision {
    id: Option<i64>,
    name: Option<String>,
    created_at: Option<DateTime<Utc>>,
}

#[instrument]
pub async fn create_division(pool: &Pool<Sqlite>, name: &str) -> Result<i64, AppError> {
    info!("Creating division");
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Division name is required".to_string()));
    }

    let res = sqlx::query("INSERT INTO divisions (name, created_at) VALUES (?, ?)")
        .bind(name)
        .bind(Utc::now())
        .execute(pool)
        .await?;

    Ok(res.last_insert_rowid())
}

#[instrument]
pub async fn get_division(pool: &Pool<Sqlite>, id: i64) -> Result<Division, AppError> {
    info!("Fetching division");
    let row = sqlx::query_as::<_, DbDivision>(
        "SELECT id, name, created_at FROM divisions WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Division with id {} not found", id)))?;

    with_supervisors(pool, row).await
}

#[instrument]
pub async fn list_divisions(pool: &Pool<Sqlite>) -> Result<Vec<Division>, AppError> {
    info!("Listing divisions");
    let rows = sqlx::query_as::<_, DbDivision>(
        "SELECT id, name, created_at FROM divisions ORDER BY name",
    )
    .fetch_all(pool)
    .await?;

    let mut divisions = Vec::with_capacity(rows.len());
    for row in rows {
        divisions.push(with_supervisors(pool, row).await?);
    }
    Ok(divisions)
}

/// Supervisor membership is derived from `users`, never stored on the division.
async fn with_supervisors(pool: &Pool<Sqlite>, row: DbDivision) -> Result<Division, AppError> {
    let id = row.id.unwrap_or_default();
    let spv_ids = sqlx::query_scalar::<_, i64>(
        "SELECT id FROM users WHERE role = 'spv' AND division_id = ? ORDER BY id",
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    Ok(Division {
        id,
        name: row.name.unwrap_or_default(),
        spv_ids,
        created_at: row.created_at.unwrap_or_else(Utc::now),
    })
}
