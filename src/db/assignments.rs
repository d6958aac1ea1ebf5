use chrono::Utc;
use std::collections::HashMap;
use sqlx::{Pool, Sqlite};
use tracing::{info, instrument, warn};

use crate::error::AppError;
use crate::models::{
    AssignmentView, ChecklistAssignment, DbAssignmentRow, Responses, Task, TaskResponse,
};

const ASSIGNMENT_SELECT: &str = "
    SELECT ca.id, ca.checklist_id, ca.asset_id, ca.division_id, ca.assigned_at, ca.is_template, ca.responses,
           ca.completed_at, ca.submitted_by,
           c.title AS checklist_title,
           a.name AS asset_name, a.location AS asset_location, a.division_id AS asset_division_id,
           u.name AS submitter_name
    FROM checklist_assignments ca
    LEFT JOIN checklists c ON c.id = ca.checklist_id
    LEFT JOIN assets a ON a.id = ca.asset_id
    LEFT JOIN users u ON u.id = ca.submitted_by";

fn into_views(rows: Vec<DbAssignmentRow>) -> Result<Vec<AssignmentView>, AppError> {
    rows.into_iter().map(AssignmentView::try_from).collect()
}

/// Replaces the template assignments of a checklist with one row per asset id.
///
/// Existing template rows for the checklist are deleted first, so the result
/// is exactly `asset_ids`; an empty slice clears every assignment. Duplicate
/// ids are inserted as given and unknown ids are skipped. Each row records
/// its asset's division. Submissions are never touched.
#[instrument(skip(pool))]
pub async fn assign_checklist_to_assets(
    pool: &Pool<Sqlite>,
    checklist_id: i64,
    asset_ids: &[i64],
) -> Result<u64, AppError> {
    info!("Assigning checklist to assets");
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM checklist_assignments WHERE checklist_id = ? AND is_template = 1")
        .bind(checklist_id)
        .execute(&mut *tx)
        .await?;

    let assigned_at = Utc::now();
    let mut inserted = 0;
    for asset_id in asset_ids {
        let res = sqlx::query(
            "INSERT INTO checklist_assignments
             (checklist_id, asset_id, division_id, assigned_at, is_template)
             SELECT ?, id, division_id, ?, 1 FROM assets WHERE id = ?",
        )
        .bind(checklist_id)
        .bind(assigned_at)
        .bind(asset_id)
        .execute(&mut *tx)
        .await?;
        inserted += res.rows_affected();
    }

    tx.commit().await?;
    Ok(inserted)
}

/// The current template rows of one checklist.
#[instrument(skip(pool))]
pub async fn list_templates_for_checklist(
    pool: &Pool<Sqlite>,
    checklist_id: i64,
) -> Result<Vec<AssignmentView>, AppError> {
    info!("Listing template assignments for checklist");
    let rows = sqlx::query_as::<_, DbAssignmentRow>(&format!(
        "{ASSIGNMENT_SELECT}
         WHERE ca.checklist_id = ? AND ca.is_template = 1
         ORDER BY ca.id"
    ))
    .bind(checklist_id)
    .fetch_all(pool)
    .await?;

    into_views(rows)
}

/// Template rows recorded against the division: a technician's work queue.
#[instrument(skip(pool))]
pub async fn list_templates_for_division(
    pool: &Pool<Sqlite>,
    division_id: i64,
) -> Result<Vec<AssignmentView>, AppError> {
    info!("Listing template assignments for division");
    let rows = sqlx::query_as::<_, DbAssignmentRow>(&format!(
        "{ASSIGNMENT_SELECT}
         WHERE ca.is_template = 1 AND ca.division_id = ?
         ORDER BY c.sort_order, ca.id"
    ))
    .bind(division_id)
    .fetch_all(pool)
    .await?;

    into_views(rows)
}

/// Completed submissions recorded against the division, newest first. Rows
/// whose asset has since been deleted are still listed.
#[instrument(skip(pool))]
pub async fn list_completed_for_division(
    pool: &Pool<Sqlite>,
    division_id: i64,
) -> Result<Vec<AssignmentView>, AppError> {
    info!("Listing completed submissions for division");
    let rows = sqlx::query_as::<_, DbAssignmentRow>(&format!(
        "{ASSIGNMENT_SELECT}
         WHERE ca.completed_at IS NOT NULL AND ca.division_id = ?
         ORDER BY ca.completed_at DESC, ca.id DESC"
    ))
    .bind(division_id)
    .fetch_all(pool)
    .await?;

    into_views(rows)
}

/// Every submission, including those whose checklist or asset has been deleted.
#[instrument(skip(pool))]
pub async fn list_all_submissions(pool: &Pool<Sqlite>) -> Result<Vec<AssignmentView>, AppError> {
    info!("Listing all submissions");
    let rows = sqlx::query_as::<_, DbAssignmentRow>(&format!(
        "{ASSIGNMENT_SELECT}
         WHERE ca.is_template = 0
         ORDER BY ca.completed_at DESC, ca.id DESC"
    ))
    .fetch_all(pool)
    .await?;

    into_views(rows)
}

#[instrument(skip(pool))]
pub async fn get_assignment(pool: &Pool<Sqlite>, id: i64) -> Result<AssignmentView, AppError> {
    info!("Fetching assignment");
    let row = sqlx::query_as::<_, DbAssignmentRow>(&format!("{ASSIGNMENT_SELECT} WHERE ca.id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Assignment not found".to_string()))?;

    AssignmentView::try_from(row)
}

/// Builds the response mapping for a submission from the checklist's tasks.
///
/// `results` and `photos` are keyed by task id. Every task of the checklist
/// gets an entry carrying its current description; blank values become
/// `None`. Keys that name no task are dropped.
pub fn build_responses(
    tasks: &[Task],
    results: &HashMap<String, String>,
    photos: &HashMap<String, Vec<String>>,
) -> Responses {
    for key in results.keys().chain(photos.keys()) {
        if !tasks.iter().any(|task| task.id.to_string() == *key) {
            warn!(task_key = %key, "Discarding response for unknown task");
        }
    }

    tasks
        .iter()
        .map(|task| {
            let key = task.id.to_string();
            let value = results
                .get(&key)
                .map(|value| value.trim())
                .filter(|value| !value.is_empty())
                .map(str::to_string);

            let response = TaskResponse {
                description: task.description.clone(),
                value,
                photos: photos.get(&key).cloned().unwrap_or_default(),
            };
            (key, response)
        })
        .collect()
}

/// Records one technician's execution of a template assignment.
///
/// Inserts a new row copying the template's checklist, asset, division and
/// assignment time; the template itself is left unchanged, so it can be
/// submitted again.
#[instrument(skip(pool, responses))]
pub async fn submit_checklist(
    pool: &Pool<Sqlite>,
    template_id: i64,
    submitted_by: i64,
    responses: &Responses,
) -> Result<ChecklistAssignment, AppError> {
    info!("Submitting checklist");
    let template = get_assignment(pool, template_id).await?.assignment;
    if !template.is_template {
        return Err(AppError::NotFound("Assignment not found".to_string()));
    }

    let completed_at = Utc::now();
    let res = sqlx::query(
        "INSERT INTO checklist_assignments
         (checklist_id, asset_id, division_id, assigned_at, is_template, responses,
          completed_at, submitted_by)
         VALUES (?, ?, ?, ?, 0, ?, ?, ?)",
    )
    .bind(template.checklist_id)
    .bind(template.asset_id)
    .bind(template.division_id)
    .bind(template.assigned_at)
    .bind(serde_json::to_string(responses)?)
    .bind(completed_at)
    .bind(submitted_by)
    .execute(pool)
    .await?;

    Ok(ChecklistAssignment {
        id: res.last_insert_rowid(),
        checklist_id: template.checklist_id,
        asset_id: template.asset_id,
        division_id: template.division_id,
        assigned_at: template.assigned_at,
        is_template: false,
        responses: Some(responses.clone()),
        completed_at: Some(completed_at),
        submitted_by: Some(submitted_by),
    })
}
