use sqlx::{Pool, Sqlite};
use tracing::{info, instrument, warn};

use crate::error::AppError;
use crate::models::{AssetCategory, Floor, Zone};

pub const DEFAULT_FLOORS: &[&str] = &[
    "Basement 2",
    "Basement 1",
    "Ground Floor",
    "Floor 1",
    "Floor 2",
    "Floor 3",
    "Rooftop",
];

pub const DEFAULT_ZONES: &[&str] = &[
    "North Wing",
    "South Wing",
    "East Wing",
    "West Wing",
    "Central Core",
    "Plant Room",
    "Car Park",
];

pub const DEFAULT_CATEGORIES: &[&str] = &[
    "HVAC",
    "Electrical",
    "Plumbing",
    "Fire Protection",
    "Elevator",
    "Generator",
    "Building Automation",
];

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub inserted: u64,
    pub failed: u64,
}

fn required_name(name: &str, what: &str) -> Result<String, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation(format!("{} name is required", what)));
    }
    Ok(name.to_string())
}

#[instrument]
pub async fn create_floor(pool: &Pool<Sqlite>, name: &str) -> Result<i64, AppError> {
    info!("Creating floor");
    let name = required_name(name, "Floor")?;
    let res = sqlx::query("INSERT INTO floors (name) VALUES (?)")
        .bind(name)
        .execute(pool)
        .await?;
    Ok(res.last_insert_rowid())
}

#[instrument]
pub async fn list_floors(pool: &Pool<Sqlite>) -> Result<Vec<Floor>, AppError> {
    info!("Listing floors");
    let floors = sqlx::query_as::<_, Floor>("SELECT id, name FROM floors ORDER BY name")
        .fetch_all(pool)
        .await?;
    Ok(floors)
}

#[instrument]
pub async fn create_zone(
    pool: &Pool<Sqlite>,
    name: &str,
    floor_id: Option<i64>,
) -> Result<i64, AppError> {
    info!("Creating zone");
    let name = required_name(name, "Zone")?;
    let res = sqlx::query("INSERT INTO zones (name, floor_id) VALUES (?, ?)")
        .bind(name)
        .bind(floor_id)
        .execute(pool)
        .await?;
    Ok(res.last_insert_rowid())
}

#[instrument]
pub async fn get_zone(pool: &Pool<Sqlite>, id: i64) -> Result<Zone, AppError> {
    sqlx::query_as::<_, Zone>("SELECT id, name, floor_id FROM zones WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Zone with id {} not found", id)))
}

#[instrument]
pub async fn list_zones(pool: &Pool<Sqlite>) -> Result<Vec<Zone>, AppError> {
    info!("Listing zones");
    let zones = sqlx::query_as::<_, Zone>("SELECT id, name, floor_id FROM zones ORDER BY name")
        .fetch_all(pool)
        .await?;
    Ok(zones)
}

#[instrument]
pub async fn create_category(pool: &Pool<Sqlite>, name: &str) -> Result<i64, AppError> {
    info!("Creating asset category");
    let name = required_name(name, "Category")?;
    let res = sqlx::query("INSERT INTO asset_categories (name) VALUES (?)")
        .bind(name)
        .execute(pool)
        .await?;
    Ok(res.last_insert_rowid())
}

#[instrument]
pub async fn list_categories(pool: &Pool<Sqlite>) -> Result<Vec<AssetCategory>, AppError> {
    info!("Listing asset categories");
    let categories =
        sqlx::query_as::<_, AssetCategory>("SELECT id, name FROM asset_categories ORDER BY name")
            .fetch_all(pool)
            .await?;
    Ok(categories)
}

/// Inserts each default floor, zone and category that is not present yet.
///
/// Runs at every start. Existing names are left untouched and a failed insert
/// is logged and skipped, so a second process seeding at the same time cannot
/// take this one down.
#[instrument(skip(pool))]
pub async fn ensure_seeded(pool: &Pool<Sqlite>) -> SeedReport {
    info!("Seeding default facility taxonomy");
    let mut report = SeedReport::default();

    let tables = [
        ("floors", DEFAULT_FLOORS),
        ("zones", DEFAULT_ZONES),
        ("asset_categories", DEFAULT_CATEGORIES),
    ];

    for (table, names) in tables {
        let sql = format!("INSERT INTO {table} (name) VALUES (?) ON CONFLICT (name) DO NOTHING");
        for name in names {
            match sqlx::query(&sql).bind(*name).execute(pool).await {
                Ok(res) => report.inserted += res.rows_affected(),
                Err(e) => {
                    warn!(table = %table, name = %name, error = %e, "Failed to seed default entry");
                    report.failed += 1;
                }
            }
        }
    }

    info!(
        inserted = report.inserted,
        failed = report.failed,
        "Seeding finished"
    );
    report
}
