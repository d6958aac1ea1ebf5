use rocket::State;
use rocket::form::Form;
use rocket::response::Redirect;
use rocket::serde::json::Json;
use serde::{Deserialize, Serialize};
use sqlx::{Pool, Sqlite};
use tracing::info;

use crate::auth::gate::{asset_in_user_division, checklist_owned_by_user};
use crate::auth::{Permission, User};
use crate::db::assets::list_assets;
use crate::db::assignments::{assign_checklist_to_assets, list_templates_for_checklist};
use crate::db::checklists::{
    create_checklist, delete_checklist, list_checklists_by_creator, reorder_checklists,
    update_checklist,
};
use crate::error::AppError;
use crate::models::{
    Asset, AssignmentView, Checklist, ChecklistInput, InputType, NewTask, Task,
};
use crate::validation::{ApiError, AppErrorExt};

const INPUT_TYPES: [InputType; 3] = [
    InputType::Visual,
    InputType::Measurement,
    InputType::Functional,
];

#[derive(Serialize, Deserialize, Debug)]
pub struct ChecklistWithAssignments {
    pub checklist: Checklist,
    pub assignments: Vec<AssignmentView>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct SpvDashboard {
    pub user: User,
    pub checklists: Vec<ChecklistWithAssignments>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ChecklistFormView {
    pub checklist: Option<Checklist>,
    pub input_types: Vec<InputType>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct AssignView {
    pub checklist: Checklist,
    pub assets: Vec<Asset>,
    pub assigned_asset_ids: Vec<i64>,
}

/// Task columns arrive as parallel sequences, one entry per task. A form
/// with a single task still yields one-element sequences.
#[derive(FromForm, Debug, Default)]
pub struct ChecklistForm {
    pub title: String,
    pub task_descriptions: Vec<String>,
    pub task_input_types: Vec<String>,
    pub task_expected_units: Vec<String>,
    pub task_default_values: Vec<String>,
    pub task_notes: Vec<String>,
}

impl ChecklistForm {
    /// Zips the task columns into tasks. Descriptions, input types and units
    /// must line up; default values and notes may be shorter.
    pub fn into_input(self) -> Result<ChecklistInput, AppError> {
        let count = self.task_descriptions.len();
        if self.task_input_types.len() != count || self.task_expected_units.len() != count {
            return Err(AppError::Validation(format!(
                "Task fields do not line up: {} descriptions, {} input types, {} units",
                count,
                self.task_input_types.len(),
                self.task_expected_units.len()
            )));
        }

        let mut tasks = Vec::with_capacity(count);
        for (index, description) in self.task_descriptions.into_iter().enumerate() {
            let actual_value = self
                .task_default_values
                .get(index)
                .map(|value| value.trim())
                .filter(|value| !value.is_empty())
                .map(str::to_string);

            tasks.push(NewTask {
                description: description.trim().to_string(),
                input_type: self.task_input_types[index].parse()?,
                expected_unit: self.task_expected_units[index].trim().to_string(),
                actual_value,
                note: self.task_notes.get(index).cloned().unwrap_or_default(),
            });
        }

        Ok(ChecklistInput {
            title: self.title.trim().to_string(),
            tasks,
        })
    }
}

#[derive(FromForm)]
pub struct AssignForm {
    asset_ids: Vec<i64>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct SortRequest {
    pub order: Vec<i64>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct SortResponse {
    pub updated: u64,
}

#[get("/spv/dashboard")]
pub async fn spv_dashboard(
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<SpvDashboard>, AppError> {
    user.require_permission(Permission::AuthorChecklists)?;

    let mut checklists = Vec::new();
    for checklist in list_checklists_by_creator(db, user.id).await? {
        let assignments = list_templates_for_checklist(db, checklist.id).await?;
        checklists.push(ChecklistWithAssignments {
            checklist,
            assignments,
        });
    }

    Ok(Json(SpvDashboard { user, checklists }))
}

#[get("/checklists")]
pub async fn checklists(
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<Checklist>>, AppError> {
    user.require_permission(Permission::AuthorChecklists)?;
    Ok(Json(list_checklists_by_creator(db, user.id).await?))
}

#[get("/checklists/new")]
pub fn new_checklist_page(user: User) -> Result<Json<ChecklistFormView>, AppError> {
    user.require_permission(Permission::AuthorChecklists)?;

    Ok(Json(ChecklistFormView {
        checklist: None,
        input_types: INPUT_TYPES.to_vec(),
    }))
}

#[post("/checklists", data = "<form>")]
pub async fn create_checklist_route(
    user: User,
    form: Form<ChecklistForm>,
    db: &State<Pool<Sqlite>>,
) -> Result<Redirect, AppError> {
    user.require_permission(Permission::AuthorChecklists)?;

    let input = form.into_inner().into_input()?;
    let id = create_checklist(db, user.id, &input).await?;

    info!(user_id = %user.id, checklist_id = %id, "Checklist created");
    Ok(Redirect::to("/checklists"))
}

#[get("/checklists/<id>/edit")]
pub async fn edit_checklist_page(
    id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<ChecklistFormView>, AppError> {
    user.require_permission(Permission::AuthorChecklists)?;
    let checklist = checklist_owned_by_user(db, &user, id).await?;

    Ok(Json(ChecklistFormView {
        checklist: Some(checklist),
        input_types: INPUT_TYPES.to_vec(),
    }))
}

#[post("/checklists/<id>/edit", data = "<form>")]
pub async fn update_checklist_route(
    id: i64,
    user: User,
    form: Form<ChecklistForm>,
    db: &State<Pool<Sqlite>>,
) -> Result<Redirect, AppError> {
    user.require_permission(Permission::AuthorChecklists)?;
    checklist_owned_by_user(db, &user, id).await?;

    let input = form.into_inner().into_input()?;
    update_checklist(db, id, &input).await?;
    Ok(Redirect::to("/checklists"))
}

#[post("/checklists/<id>/delete")]
pub async fn delete_checklist_route(
    id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Redirect, AppError> {
    user.require_permission(Permission::AuthorChecklists)?;
    checklist_owned_by_user(db, &user, id).await?;

    delete_checklist(db, id).await?;
    info!(user_id = %user.id, checklist_id = %id, "Checklist deleted");
    Ok(Redirect::to("/checklists"))
}

#[get("/checklists/<id>/assign")]
pub async fn assign_page(
    id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<AssignView>, AppError> {
    user.require_permission(Permission::AssignChecklists)?;
    let division_id = user.require_division()?;
    let checklist = checklist_owned_by_user(db, &user, id).await?;

    let assigned_asset_ids = list_templates_for_checklist(db, id)
        .await?
        .into_iter()
        .map(|view| view.assignment.asset_id)
        .collect();

    Ok(Json(AssignView {
        checklist,
        assets: list_assets(db, Some(division_id)).await?,
        assigned_asset_ids,
    }))
}

/// Replaces the checklist's asset set with the submitted one. An empty
/// selection unassigns the checklist everywhere.
#[post("/checklists/<id>/assign", data = "<form>")]
pub async fn assign_route(
    id: i64,
    user: User,
    form: Form<AssignForm>,
    db: &State<Pool<Sqlite>>,
) -> Result<Redirect, AppError> {
    user.require_permission(Permission::AssignChecklists)?;
    checklist_owned_by_user(db, &user, id).await?;

    for asset_id in &form.asset_ids {
        asset_in_user_division(db, &user, *asset_id).await?;
    }

    let assigned = assign_checklist_to_assets(db, id, &form.asset_ids).await?;
    info!(user_id = %user.id, checklist_id = %id, assigned = %assigned, "Checklist assigned");
    Ok(Redirect::to("/spv/dashboard"))
}

#[post("/checklists/sort", format = "json", data = "<request>")]
pub async fn sort_checklists(
    user: User,
    request: Json<SortRequest>,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<SortResponse>, ApiError> {
    user.require_permission(Permission::AuthorChecklists)
        .api_error()?;

    let updated = reorder_checklists(db, user.id, &request.order)
        .await
        .api_error()?;
    Ok(Json(SortResponse { updated }))
}

#[get("/checklists/<id>/tasks")]
pub async fn api_checklist_tasks(
    id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<Task>>, ApiError> {
    user.require_permission(Permission::AuthorChecklists)
        .api_error()?;

    let checklist = checklist_owned_by_user(db, &user, id).await.api_error()?;
    Ok(Json(checklist.tasks))
}
