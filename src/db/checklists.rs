use chrono::{DateTime, Utc};
use sqlx::{Pool, Sqlite, Transaction};
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::error::AppError;
use crate::models::{Checklist, ChecklistInput, DbTask, NewTask, Task};

#[derive(sqlx::FromRow, Clone)]
struct DbChecklist {
    id: Option<i64>,
    title: Option<String>,
    created_by: Option<i64>,
    created_at: Option<DateTime<Utc>>,
    sort_order: Option<i64>,
}

impl DbChecklist {
    fn with_tasks(self, tasks: Vec<Task>) -> Checklist {
        Checklist {
            id: self.id.unwrap_or_default(),
            title: self.title.unwrap_or_default(),
            tasks,
            created_by: self.created_by.unwrap_or_default(),
            created_at: self.created_at.unwrap_or_else(Utc::now),
            order: self.sort_order.unwrap_or_default(),
        }
    }
}

async fn insert_tasks(
    tx: &mut Transaction<'_, Sqlite>,
    checklist_id: i64,
    tasks: &[NewTask],
) -> Result<(), AppError> {
    for (position, task) in tasks.iter().enumerate() {
        sqlx::query(
            "INSERT INTO checklist_tasks
             (checklist_id, position, description, input_type, expected_unit, actual_value, note)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(checklist_id)
        .bind(position as i64)
        .bind(&task.description)
        .bind(task.input_type.as_str())
        .bind(&task.expected_unit)
        .bind(&task.actual_value)
        .bind(&task.note)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

/// Creates a checklist owned by `created_by`, placed after that supervisor's
/// existing checklists in display order.
#[instrument(skip(pool, input), fields(title = %input.title))]
pub async fn create_checklist(
    pool: &Pool<Sqlite>,
    created_by: i64,
    input: &ChecklistInput,
) -> Result<i64, AppError> {
    info!("Creating checklist");
    input.validate()?;

    let mut tx = pool.begin().await?;

    let next_order = sqlx::query_scalar::<_, i64>(
        "SELECT COALESCE(MAX(sort_order) + 1, 0) FROM checklists WHERE created_by = ?",
    )
    .bind(created_by)
    .fetch_one(&mut *tx)
    .await?;

    let res = sqlx::query(
        "INSERT INTO checklists (title, created_by, created_at, sort_order) VALUES (?, ?, ?, ?)",
    )
    .bind(&input.title)
    .bind(created_by)
    .bind(Utc::now())
    .bind(next_order)
    .execute(&mut *tx)
    .await?;
    let checklist_id = res.last_insert_rowid();

    insert_tasks(&mut tx, checklist_id, &input.tasks).await?;
    tx.commit().await?;

    Ok(checklist_id)
}

#[instrument(skip(pool))]
pub async fn get_tasks(pool: &Pool<Sqlite>, checklist_id: i64) -> Result<Vec<Task>, AppError> {
    let rows = sqlx::query_as::<_, DbTask>(
        "SELECT id, position, description, input_type, expected_unit, actual_value, note,
                material_used, status, photos
         FROM checklist_tasks
         WHERE checklist_id = ?
         ORDER BY position",
    )
    .bind(checklist_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(Task::try_from).collect()
}

#[instrument(skip(pool))]
pub async fn find_checklist(pool: &Pool<Sqlite>, id: i64) -> Result<Option<Checklist>, AppError> {
    info!("Finding checklist");
    let row = sqlx::query_as::<_, DbChecklist>(
        "SELECT id, title, created_by, created_at, sort_order FROM checklists WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => {
            let tasks = get_tasks(pool, id).await?;
            Ok(Some(row.with_tasks(tasks)))
        }
        None => Ok(None),
    }
}

#[instrument(skip(pool))]
pub async fn get_checklist(pool: &Pool<Sqlite>, id: i64) -> Result<Checklist, AppError> {
    find_checklist(pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Checklist not found".to_string()))
}

/// A supervisor's checklists in their chosen display order.
#[instrument(skip(pool))]
pub async fn list_checklists_by_creator(
    pool: &Pool<Sqlite>,
    created_by: i64,
) -> Result<Vec<Checklist>, AppError> {
    info!("Listing checklists for creator");
    let rows = sqlx::query_as::<_, DbChecklist>(
        "SELECT id, title, created_by, created_at, sort_order
         FROM checklists
         WHERE created_by = ?
         ORDER BY sort_order, created_at, id",
    )
    .bind(created_by)
    .fetch_all(pool)
    .await?;

    let mut checklists = Vec::with_capacity(rows.len());
    for row in rows {
        let tasks = get_tasks(pool, row.id.unwrap_or_default()).await?;
        checklists.push(row.with_tasks(tasks));
    }
    Ok(checklists)
}

/// Sets the title and replaces the whole task list with `input.tasks`.
/// Tasks that are not resubmitted are gone afterwards.
#[instrument(skip(pool, input), fields(title = %input.title))]
pub async fn update_checklist(
    pool: &Pool<Sqlite>,
    id: i64,
    input: &ChecklistInput,
) -> Result<(), AppError> {
    info!("Updating checklist");
    input.validate()?;

    let mut tx = pool.begin().await?;

    let res = sqlx::query("UPDATE checklists SET title = ? WHERE id = ?")
        .bind(&input.title)
        .bind(id)
        .execute(&mut *tx)
        .await?;

    if res.rows_affected() == 0 {
        tx.rollback().await?;
        return Err(AppError::NotFound("Checklist not found".to_string()));
    }

    sqlx::query("DELETE FROM checklist_tasks WHERE checklist_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    insert_tasks(&mut tx, id, &input.tasks).await?;
    tx.commit().await?;

    Ok(())
}

/// Hard-deletes a checklist, its tasks and its template assignments.
/// Submissions recorded against it are kept.
#[instrument(skip(pool))]
pub async fn delete_checklist(pool: &Pool<Sqlite>, id: i64) -> Result<(), AppError> {
    info!("Deleting checklist");
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM checklist_assignments WHERE checklist_id = ? AND is_template = 1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    let res = sqlx::query("DELETE FROM checklists WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    if res.rows_affected() == 0 {
        tx.rollback().await?;
        return Err(AppError::NotFound("Checklist not found".to_string()));
    }

    tx.commit().await?;
    Ok(())
}

/// Writes `order = index` for each id, in sequence. Only checklists owned by
/// `owner` are touched; returns how many were updated.
#[instrument(skip(pool))]
pub async fn reorder_checklists(
    pool: &Pool<Sqlite>,
    owner: i64,
    ids_in_order: &[i64],
) -> Result<u64, AppError> {
    info!("Reordering checklists");
    let mut tx = pool.begin().await?;
    let mut updated = 0;

    for (index, id) in ids_in_order.iter().enumerate() {
        let res = sqlx::query("UPDATE checklists SET sort_order = ? WHERE id = ? AND created_by = ?")
            .bind(index as i64)
            .bind(id)
            .bind(owner)
            .execute(&mut *tx)
            .await?;

        if res.rows_affected() == 0 {
            warn!(checklist_id = %id, "Skipping checklist not owned by caller");
        }
        updated += res.rows_affected();
    }

    tx.commit().await?;
    Ok(updated)
}
