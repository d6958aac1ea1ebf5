use rocket::State;
use rocket::form::{self, DataField, Form, FromFormField, ValueField};
use rocket::fs::TempFile;
use rocket::response::Redirect;
use rocket::serde::json::Json;
use serde::{Deserialize, Serialize};
use sqlx::{Pool, Sqlite};
use std::collections::HashMap;
use tracing::{info, warn};

use crate::auth::gate::assignment_in_user_division;
use crate::auth::{Permission, User};
use crate::config::AppConfig;
use crate::db::assignments::{
    build_responses, list_completed_for_division, list_templates_for_division, submit_checklist,
};
use crate::db::checklists::get_tasks;
use crate::error::AppError;
use crate::models::{AssignmentView, Task};
use crate::uploads::store_upload;

#[derive(Serialize, Deserialize, Debug)]
pub struct TechnicianDashboard {
    pub user: User,
    pub assignments: Vec<AssignmentView>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ChecklistFillView {
    pub assignment: AssignmentView,
    pub tasks: Vec<Task>,
}

/// One `results[<taskId>]` part: the task's value, or a photo when the part
/// carries a file name.
pub enum TaskResult<'r> {
    Value(String),
    Photo(TempFile<'r>),
}

#[rocket::async_trait]
impl<'r> FromFormField<'r> for TaskResult<'r> {
    fn from_value(field: ValueField<'r>) -> form::Result<'r, Self> {
        Ok(TaskResult::Value(field.value.to_string()))
    }

    async fn from_data(field: DataField<'r, '_>) -> form::Result<'r, Self> {
        if field.file_name.is_some() {
            Ok(TaskResult::Photo(TempFile::from_data(field).await?))
        } else {
            Ok(TaskResult::Value(String::from_data(field).await?))
        }
    }
}

/// Task results keyed by task id. A task may repeat its key to send a value
/// and any number of photos. `photos[<taskId>]` is still read for clients
/// that send files under a separate name.
#[derive(FromForm)]
pub struct SubmitChecklistForm<'r> {
    results: HashMap<String, Vec<TaskResult<'r>>>,
    photos: HashMap<String, Vec<TempFile<'r>>>,
}

fn is_task_key(tasks: &[Task], key: &str) -> bool {
    tasks.iter().any(|task| task.id.to_string() == key)
}

fn assignment_not_found() -> AppError {
    AppError::NotFound("Assignment not found".to_string())
}

#[get("/technician/dashboard")]
pub async fn technician_dashboard(
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<TechnicianDashboard>, AppError> {
    user.require_permission(Permission::ViewAssignedWork)?;
    let division_id = user.require_division()?;

    let assignments = list_templates_for_division(db, division_id).await?;
    Ok(Json(TechnicianDashboard { user, assignments }))
}

#[get("/technician/checklist/<id>")]
pub async fn checklist_page(
    id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<ChecklistFillView>, AppError> {
    user.require_permission(Permission::ViewAssignedWork)?;

    let assignment = assignment_in_user_division(db, &user, id).await?;
    if !assignment.assignment.is_template || assignment.checklist.is_none() {
        return Err(assignment_not_found());
    }

    let tasks = get_tasks(db, assignment.assignment.checklist_id).await?;
    Ok(Json(ChecklistFillView { assignment, tasks }))
}

#[post("/technician/checklist/<id>/submit", data = "<form>")]
pub async fn submit_checklist_route(
    id: i64,
    user: User,
    mut form: Form<SubmitChecklistForm<'_>>,
    db: &State<Pool<Sqlite>>,
    config: &State<AppConfig>,
) -> Result<Redirect, AppError> {
    user.require_permission(Permission::SubmitChecklists)?;

    let template = assignment_in_user_division(db, &user, id).await?;
    if !template.assignment.is_template || template.checklist.is_none() {
        return Err(assignment_not_found());
    }

    let tasks = get_tasks(db, template.assignment.checklist_id).await?;

    let form = &mut *form;
    let mut values: HashMap<String, String> = HashMap::new();
    let mut photos: HashMap<String, Vec<String>> = HashMap::new();

    for (task_key, parts) in form.results.iter_mut() {
        for part in parts.iter_mut() {
            match part {
                TaskResult::Value(value) => {
                    values.insert(task_key.clone(), value.clone());
                }
                TaskResult::Photo(file) => {
                    if !is_task_key(&tasks, task_key) {
                        warn!(task_key = %task_key, "Discarding photo for unknown task");
                        continue;
                    }
                    if let Some(path) = store_upload(file, &config.upload_dir).await? {
                        photos.entry(task_key.clone()).or_default().push(path);
                    }
                }
            }
        }
    }

    for (task_key, files) in form.photos.iter_mut() {
        if !is_task_key(&tasks, task_key) {
            warn!(task_key = %task_key, "Discarding photos for unknown task");
            continue;
        }
        for file in files.iter_mut() {
            if let Some(path) = store_upload(file, &config.upload_dir).await? {
                photos.entry(task_key.clone()).or_default().push(path);
            }
        }
    }

    let responses = build_responses(&tasks, &values, &photos);
    let submission = submit_checklist(db, id, user.id, &responses).await?;

    info!(
        user_id = %user.id,
        template_id = %id,
        submission_id = %submission.id,
        "Checklist submitted"
    );
    Ok(Redirect::to("/technician/report"))
}

#[get("/technician/report")]
pub async fn report(
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<AssignmentView>>, AppError> {
    user.require_permission(Permission::ViewOwnReports)?;
    let division_id = user.require_division()?;

    Ok(Json(list_completed_for_division(db, division_id).await?))
}

#[get("/technician/report/<id>")]
pub async fn report_detail(
    id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<AssignmentView>, AppError> {
    user.require_permission(Permission::ViewOwnReports)?;

    let submission = assignment_in_user_division(db, &user, id).await?;
    if submission.assignment.is_template {
        return Err(assignment_not_found());
    }

    Ok(Json(submission))
}
