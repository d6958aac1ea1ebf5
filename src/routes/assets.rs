use rocket::State;
use rocket::form::Form;
use rocket::response::Redirect;
use rocket::serde::json::Json;
use serde::{Deserialize, Serialize};
use sqlx::{Pool, Sqlite};
use tracing::info;

use crate::auth::gate::asset_in_user_division;
use crate::auth::{Permission, User};
use crate::db::assets::{create_asset, delete_asset, list_assets, update_asset};
use crate::db::divisions::get_division;
use crate::db::taxonomy::{list_categories, list_floors, list_zones};
use crate::error::AppError;
use crate::models::{Asset, AssetCategory, AssetInput, Division, Floor, Zone};

#[derive(Serialize, Deserialize, Debug)]
pub struct AssetsView {
    pub division: Division,
    pub assets: Vec<Asset>,
}

/// Choices for the asset form's selects.
#[derive(Serialize, Deserialize, Debug)]
pub struct AssetOptions {
    pub categories: Vec<AssetCategory>,
    pub floors: Vec<Floor>,
    pub zones: Vec<Zone>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct AssetEditView {
    pub asset: Asset,
    pub options: AssetOptions,
}

#[derive(FromForm)]
pub struct AssetForm {
    name: String,
    #[field(default = String::new())]
    description: String,
    #[field(default = String::new())]
    location: String,
    category_id: i64,
    floor_id: Option<i64>,
    zone_id: Option<i64>,
}

impl From<AssetForm> for AssetInput {
    fn from(form: AssetForm) -> Self {
        Self {
            name: form.name.trim().to_string(),
            description: form.description,
            location: form.location,
            category_id: form.category_id,
            floor_id: form.floor_id,
            zone_id: form.zone_id,
        }
    }
}

async fn asset_options(db: &Pool<Sqlite>) -> Result<AssetOptions, AppError> {
    Ok(AssetOptions {
        categories: list_categories(db).await?,
        floors: list_floors(db).await?,
        zones: list_zones(db).await?,
    })
}

#[get("/assets")]
pub async fn assets(user: User, db: &State<Pool<Sqlite>>) -> Result<Json<AssetsView>, AppError> {
    user.require_permission(Permission::ManageAssets)?;
    let division_id = user.require_division()?;

    Ok(Json(AssetsView {
        division: get_division(db, division_id).await?,
        assets: list_assets(db, Some(division_id)).await?,
    }))
}

#[get("/assets/new")]
pub async fn new_asset_page(
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<AssetOptions>, AppError> {
    user.require_permission(Permission::ManageAssets)?;
    user.require_division()?;
    Ok(Json(asset_options(db).await?))
}

#[post("/assets", data = "<form>")]
pub async fn create_asset_route(
    user: User,
    form: Form<AssetForm>,
    db: &State<Pool<Sqlite>>,
) -> Result<Redirect, AppError> {
    user.require_permission(Permission::ManageAssets)?;
    let division_id = user.require_division()?;

    let input = AssetInput::from(form.into_inner());
    let id = create_asset(db, &input, division_id).await?;

    info!(user_id = %user.id, asset_id = %id, division_id = %division_id, "Asset created");
    Ok(Redirect::to("/assets"))
}

#[get("/assets/<id>/edit")]
pub async fn edit_asset_page(
    id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<AssetEditView>, AppError> {
    user.require_permission(Permission::ManageAssets)?;
    let asset = asset_in_user_division(db, &user, id).await?;

    Ok(Json(AssetEditView {
        asset,
        options: asset_options(db).await?,
    }))
}

#[post("/assets/<id>/edit", data = "<form>")]
pub async fn update_asset_route(
    id: i64,
    user: User,
    form: Form<AssetForm>,
    db: &State<Pool<Sqlite>>,
) -> Result<Redirect, AppError> {
    user.require_permission(Permission::ManageAssets)?;
    asset_in_user_division(db, &user, id).await?;

    update_asset(db, id, &AssetInput::from(form.into_inner())).await?;
    Ok(Redirect::to("/assets"))
}

#[post("/assets/<id>/delete")]
pub async fn delete_asset_route(
    id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Redirect, AppError> {
    user.require_permission(Permission::ManageAssets)?;
    asset_in_user_division(db, &user, id).await?;

    delete_asset(db, id).await?;
    info!(user_id = %user.id, asset_id = %id, "Asset deleted");
    Ok(Redirect::to("/assets"))
}
