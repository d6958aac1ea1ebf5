use rocket::State;
use rocket::serde::json::Json;
use serde::{Deserialize, Serialize};
use sqlx::{Pool, Sqlite};

use crate::auth::{Permission, User};
use crate::db::assets::list_assets;
use crate::db::assignments::list_all_submissions;
use crate::error::AppError;
use crate::models::{Asset, AssignmentView};

/// Read-only, across every division.
#[derive(Serialize, Deserialize, Debug)]
pub struct ManagerDashboard {
    pub user: User,
    pub assets: Vec<Asset>,
    pub submissions: Vec<AssignmentView>,
}

#[get("/manager/dashboard")]
pub async fn manager_dashboard(
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<ManagerDashboard>, AppError> {
    user.require_permission(Permission::ViewAllReports)?;

    Ok(Json(ManagerDashboard {
        assets: list_assets(db, None).await?,
        submissions: list_all_submissions(db).await?,
        user,
    }))
}
