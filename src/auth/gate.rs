//! Ownership and division checks that run after the target entity is loaded.
//!
//! Each gate hands back the entity it loaded so the handler does not have to
//! look it up a second time.

use sqlx::{Pool, Sqlite};
use tracing::warn;

use crate::db::{assets::get_asset, assignments::get_assignment, checklists::find_checklist};
use crate::error::AppError;
use crate::models::{Asset, AssignmentView, Checklist};

use super::{Role, User};

/// Form fields a technician is allowed to write.
pub const TECHNICIAN_EDITABLE_FIELDS: [&str; 3] = ["functionalTest", "measurement", "visualCheck"];

fn deny(user: &User, what: &str, id: i64) -> AppError {
    warn!(
        user_id = %user.id,
        role = %user.role.as_str(),
        target = %what,
        target_id = %id,
        "Unauthorized access attempt"
    );
    AppError::Authorization(format!("Access denied: {} belongs to another division", what))
}

pub async fn asset_in_user_division(
    pool: &Pool<Sqlite>,
    user: &User,
    asset_id: i64,
) -> Result<Asset, AppError> {
    let asset = get_asset(pool, asset_id).await?;

    if user.division_id != Some(asset.division_id) {
        return Err(deny(user, "asset", asset_id));
    }
    Ok(asset)
}

pub async fn checklist_owned_by_user(
    pool: &Pool<Sqlite>,
    user: &User,
    checklist_id: i64,
) -> Result<Checklist, AppError> {
    let checklist = find_checklist(pool, checklist_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Checklist not found".to_string()))?;

    if checklist.created_by != user.id {
        warn!(
            user_id = %user.id,
            role = %user.role.as_str(),
            checklist_id = %checklist_id,
            "Attempt to act on another supervisor's checklist"
        );
        return Err(AppError::Authorization(
            "Access denied: you can only manage your own checklists".to_string(),
        ));
    }
    Ok(checklist)
}

/// Loads an assignment by id and checks that it was recorded against the
/// caller's division. Submissions keep their division after the asset is
/// deleted; a row without one belongs to nobody.
pub async fn assignment_in_user_division(
    pool: &Pool<Sqlite>,
    user: &User,
    assignment_id: i64,
) -> Result<AssignmentView, AppError> {
    let view = get_assignment(pool, assignment_id).await?;

    match (view.assignment.division_id, user.division_id) {
        (Some(recorded), Some(user_division)) if recorded == user_division => Ok(view),
        _ => Err(deny(user, "assignment", assignment_id)),
    }
}

/// Technicians may only submit the allow-listed fields; other roles pass.
pub fn technician_field_restriction<'a, I>(user: &User, keys: I) -> Result<(), AppError>
where
    I: IntoIterator<Item = &'a str>,
{
    if user.role != Role::Technician {
        return Ok(());
    }

    let rejected: Vec<&str> = keys
        .into_iter()
        .filter(|key| !TECHNICIAN_EDITABLE_FIELDS.contains(key))
        .collect();

    if rejected.is_empty() {
        Ok(())
    } else {
        warn!(
            user_id = %user.id,
            role = %user.role.as_str(),
            fields = ?rejected,
            "Technician attempted to write restricted fields"
        );
        Err(AppError::Authorization(format!(
            "Access denied: technicians cannot modify {}",
            rejected.join(", ")
        )))
    }
}
