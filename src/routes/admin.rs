//! Superuser screens: people, divisions and the facility taxonomy.

use rocket::State;
use rocket::form::Form;
use rocket::response::Redirect;
use rocket::serde::json::Json;
use serde::{Deserialize, Serialize};
use sqlx::{Pool, Sqlite};
use tracing::info;

use crate::auth::{Permission, Role, User};
use crate::db::assets::list_assets;
use crate::db::divisions::{create_division, list_divisions};
use crate::db::taxonomy::{
    create_category, create_floor, create_zone, list_categories, list_floors, list_zones,
};
use crate::db::users::{NewUser, create_user, list_users};
use crate::error::AppError;
use crate::models::{Asset, AssetCategory, Division, Floor, Zone};

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct EntityCounts {
    pub users: usize,
    pub divisions: usize,
    pub floors: usize,
    pub zones: usize,
    pub categories: usize,
    pub assets: usize,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct SuperuserDashboard {
    pub user: User,
    pub counts: EntityCounts,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct NewUserView {
    pub roles: Vec<Role>,
    pub divisions: Vec<Division>,
}

#[derive(FromForm)]
pub struct UserForm {
    name: String,
    email: String,
    password: String,
    role: String,
    division_id: Option<i64>,
}

#[derive(FromForm)]
pub struct NameForm {
    name: String,
}

#[derive(FromForm)]
pub struct ZoneForm {
    name: String,
    floor_id: Option<i64>,
}

#[get("/superuser/dashboard")]
pub async fn superuser_dashboard(
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<SuperuserDashboard>, AppError> {
    user.require_role(Role::Superuser)?;

    let counts = EntityCounts {
        users: list_users(db).await?.len(),
        divisions: list_divisions(db).await?.len(),
        floors: list_floors(db).await?.len(),
        zones: list_zones(db).await?.len(),
        categories: list_categories(db).await?.len(),
        assets: list_assets(db, None).await?.len(),
    };

    Ok(Json(SuperuserDashboard { user, counts }))
}

#[get("/admin/users")]
pub async fn users(user: User, db: &State<Pool<Sqlite>>) -> Result<Json<Vec<User>>, AppError> {
    user.require_permission(Permission::ManageUsers)?;
    Ok(Json(list_users(db).await?))
}

#[get("/admin/users/new")]
pub async fn new_user_page(
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<NewUserView>, AppError> {
    user.require_permission(Permission::ManageUsers)?;

    Ok(Json(NewUserView {
        roles: Role::ALL.to_vec(),
        divisions: list_divisions(db).await?,
    }))
}

#[post("/admin/users", data = "<form>")]
pub async fn create_user_route(
    user: User,
    form: Form<UserForm>,
    db: &State<Pool<Sqlite>>,
) -> Result<Redirect, AppError> {
    user.require_permission(Permission::ManageUsers)?;

    let form = form.into_inner();
    let role: Role = form
        .role
        .parse()
        .map_err(|e: anyhow::Error| AppError::Validation(e.to_string()))?;

    let new_user = NewUser {
        name: form.name,
        email: form.email,
        password: form.password,
        role,
        division_id: form.division_id,
    };
    let id = create_user(db, &new_user).await?;

    info!(created_by = %user.id, user_id = %id, "User created");
    Ok(Redirect::to("/admin/users"))
}

#[get("/admin/divisions")]
pub async fn divisions(
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<Division>>, AppError> {
    user.require_permission(Permission::ManageDivisions)?;
    Ok(Json(list_divisions(db).await?))
}

#[post("/admin/divisions", data = "<form>")]
pub async fn create_division_route(
    user: User,
    form: Form<NameForm>,
    db: &State<Pool<Sqlite>>,
) -> Result<Redirect, AppError> {
    user.require_permission(Permission::ManageDivisions)?;
    create_division(db, &form.name).await?;
    Ok(Redirect::to("/admin/divisions"))
}

#[get("/admin/floors")]
pub async fn floors(user: User, db: &State<Pool<Sqlite>>) -> Result<Json<Vec<Floor>>, AppError> {
    user.require_permission(Permission::ManageTaxonomy)?;
    Ok(Json(list_floors(db).await?))
}

#[post("/admin/floors", data = "<form>")]
pub async fn create_floor_route(
    user: User,
    form: Form<NameForm>,
    db: &State<Pool<Sqlite>>,
) -> Result<Redirect, AppError> {
    user.require_permission(Permission::ManageTaxonomy)?;
    create_floor(db, &form.name).await?;
    Ok(Redirect::to("/admin/floors"))
}

#[get("/admin/zones")]
pub async fn zones(user: User, db: &State<Pool<Sqlite>>) -> Result<Json<Vec<Zone>>, AppError> {
    user.require_permission(Permission::ManageTaxonomy)?;
    Ok(Json(list_zones(db).await?))
}

#[post("/admin/zones", data = "<form>")]
pub async fn create_zone_route(
    user: User,
    form: Form<ZoneForm>,
    db: &State<Pool<Sqlite>>,
) -> Result<Redirect, AppError> {
    user.require_permission(Permission::ManageTaxonomy)?;
    create_zone(db, &form.name, form.floor_id).await?;
    Ok(Redirect::to("/admin/zones"))
}

#[get("/admin/categories")]
pub async fn categories(
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<AssetCategory>>, AppError> {
    user.require_permission(Permission::ManageTaxonomy)?;
    Ok(Json(list_categories(db).await?))
}

#[post("/admin/categories", data = "<form>")]
pub async fn create_category_route(
    user: User,
    form: Form<NameForm>,
    db: &State<Pool<Sqlite>>,
) -> Result<Redirect, AppError> {
    user.require_permission(Permission::ManageTaxonomy)?;
    create_category(db, &form.name).await?;
    Ok(Redirect::to("/admin/categories"))
}

// Unscoped; every division's assets.
#[get("/admin/assets")]
pub async fn all_assets(user: User, db: &State<Pool<Sqlite>>) -> Result<Json<Vec<Asset>>, AppError> {
    user.require_role(Role::Superuser)?;
    Ok(Json(list_assets(db, None).await?))
}
