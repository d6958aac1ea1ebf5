use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};
use validator::Validate;

use crate::error::AppError;
use crate::models::{Asset, AssetInput};

const ASSET_COLUMNS: &str =
    "id, name, description, location, category_id, floor_id, zone_id, division_id";

/// A zone bound to a floor cannot be paired with a different floor.
async fn check_location(pool: &Pool<Sqlite>, input: &AssetInput) -> Result<(), AppError> {
    if let (Some(floor_id), Some(zone_id)) = (input.floor_id, input.zone_id) {
        let zone = crate::db::taxonomy::get_zone(pool, zone_id).await?;
        if zone.floor_id.is_some_and(|zone_floor| zone_floor != floor_id) {
            return Err(AppError::Validation(format!(
                "Zone '{}' is not on the selected floor",
                zone.name
            )));
        }
    }
    Ok(())
}

/// Inserts an asset into `division_id`, which the caller takes from the
/// session, never from the submitted form.
#[instrument(skip(pool))]
pub async fn create_asset(
    pool: &Pool<Sqlite>,
    input: &AssetInput,
    division_id: i64,
) -> Result<i64, AppError> {
    info!("Creating asset");
    input.validate()?;
    check_location(pool, input).await?;

    let res = sqlx::query(
        "INSERT INTO assets (name, description, location, category_id, floor_id, zone_id, division_id)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&input.name)
    .bind(&input.description)
    .bind(&input.location)
    .bind(input.category_id)
    .bind(input.floor_id)
    .bind(input.zone_id)
    .bind(division_id)
    .execute(pool)
    .await?;

    Ok(res.last_insert_rowid())
}

#[instrument(skip(pool))]
pub async fn find_asset(pool: &Pool<Sqlite>, id: i64) -> Result<Option<Asset>, AppError> {
    info!("Finding asset");
    let asset = sqlx::query_as::<_, Asset>(&format!("SELECT {ASSET_COLUMNS} FROM assets WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(asset)
}

#[instrument(skip(pool))]
pub async fn get_asset(pool: &Pool<Sqlite>, id: i64) -> Result<Asset, AppError> {
    find_asset(pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Asset not found".to_string()))
}

/// Lists assets, scoped to one division when `division_id` is given.
#[instrument(skip(pool))]
pub async fn list_assets(
    pool: &Pool<Sqlite>,
    division_id: Option<i64>,
) -> Result<Vec<Asset>, AppError> {
    info!("Listing assets");
    let assets = match division_id {
        Some(division_id) => {
            sqlx::query_as::<_, Asset>(&format!(
                "SELECT {ASSET_COLUMNS} FROM assets WHERE division_id = ? ORDER BY name"
            ))
            .bind(division_id)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, Asset>(&format!("SELECT {ASSET_COLUMNS} FROM assets ORDER BY name"))
                .fetch_all(pool)
                .await?
        }
    };
    Ok(assets)
}

/// Overwrites every mutable field. The division never changes.
#[instrument(skip(pool))]
pub async fn update_asset(pool: &Pool<Sqlite>, id: i64, input: &AssetInput) -> Result<(), AppError> {
    info!("Updating asset");
    input.validate()?;
    check_location(pool, input).await?;

    let res = sqlx::query(
        "UPDATE assets
         SET name = ?, description = ?, location = ?, category_id = ?, floor_id = ?, zone_id = ?
         WHERE id = ?",
    )
    .bind(&input.name)
    .bind(&input.description)
    .bind(&input.location)
    .bind(input.category_id)
    .bind(input.floor_id)
    .bind(input.zone_id)
    .bind(id)
    .execute(pool)
    .await?;

    if res.rows_affected() == 0 {
        return Err(AppError::NotFound("Asset not found".to_string()));
    }
    Ok(())
}

/// Hard-deletes an asset together with its template assignments.
/// Submission history for the asset is kept.
#[instrument(skip(pool))]
pub async fn delete_asset(pool: &Pool<Sqlite>, id: i64) -> Result<(), AppError> {
    info!("Deleting asset");
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM checklist_assignments WHERE asset_id = ? AND is_template = 1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    let res = sqlx::query("DELETE FROM assets WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    if res.rows_affected() == 0 {
        tx.rollback().await?;
        return Err(AppError::NotFound("Asset not found".to_string()));
    }

    tx.commit().await?;
    Ok(())
}
