#[cfg(test)]
mod tests {
    use crate::db::taxonomy::{
        DEFAULT_CATEGORIES, DEFAULT_FLOORS, DEFAULT_ZONES, create_category, create_floor,
        create_zone, ensure_seeded, get_zone, list_categories, list_floors, list_zones,
    };
    use crate::error::AppError;
    use crate::test::test_utils::TestDbBuilder;

    #[rocket::async_test]
    async fn test_seeding_is_idempotent() {
        // build() seeds once already
        let test_db = TestDbBuilder::new()
            .build()
            .await
            .expect("Failed to build test database");

        let floors = list_floors(&test_db.pool).await.expect("Failed to list floors");
        let zones = list_zones(&test_db.pool).await.expect("Failed to list zones");
        let categories = list_categories(&test_db.pool)
            .await
            .expect("Failed to list categories");
        assert_eq!(floors.len(), DEFAULT_FLOORS.len());
        assert_eq!(zones.len(), DEFAULT_ZONES.len());
        assert_eq!(categories.len(), DEFAULT_CATEGORIES.len());

        let report = ensure_seeded(&test_db.pool).await;
        assert_eq!(report.inserted, 0);
        assert_eq!(report.failed, 0);

        let floors_after = list_floors(&test_db.pool).await.expect("Failed to list floors");
        assert_eq!(floors_after, floors);
    }

    #[rocket::async_test]
    async fn test_seeding_fills_in_missing_defaults() {
        let test_db = TestDbBuilder::new()
            .build()
            .await
            .expect("Failed to build test database");

        sqlx::query("DELETE FROM asset_categories WHERE name = 'HVAC'")
            .execute(&test_db.pool)
            .await
            .expect("Failed to delete category");

        let report = ensure_seeded(&test_db.pool).await;
        assert_eq!(report.inserted, 1);

        let names: Vec<String> = list_categories(&test_db.pool)
            .await
            .expect("Failed to list categories")
            .into_iter()
            .map(|category| category.name)
            .collect();
        assert!(names.contains(&"HVAC".to_string()));
    }

    #[rocket::async_test]
    async fn test_create_reference_records() {
        let test_db = TestDbBuilder::new()
            .build()
            .await
            .expect("Failed to build test database");

        let floor_id = create_floor(&test_db.pool, "Mezzanine")
            .await
            .expect("Failed to create floor");
        let zone_id = create_zone(&test_db.pool, "Loading Dock", Some(floor_id))
            .await
            .expect("Failed to create zone");
        create_category(&test_db.pool, "Pumps")
            .await
            .expect("Failed to create category");

        let zone = get_zone(&test_db.pool, zone_id).await.expect("Failed to get zone");
        assert_eq!(zone.name, "Loading Dock");
        assert_eq!(zone.floor_id, Some(floor_id));

        let unbound = create_zone(&test_db.pool, "Courtyard", None)
            .await
            .expect("Zones may omit a floor");
        let unbound = get_zone(&test_db.pool, unbound).await.expect("Failed to get zone");
        assert_eq!(unbound.floor_id, None);
    }

    #[rocket::async_test]
    async fn test_reference_record_errors() {
        let test_db = TestDbBuilder::new()
            .build()
            .await
            .expect("Failed to build test database");

        let blank = create_floor(&test_db.pool, "   ").await;
        assert!(matches!(blank, Err(AppError::Validation(_))));

        let duplicate = create_floor(&test_db.pool, DEFAULT_FLOORS[0]).await;
        assert!(matches!(duplicate, Err(AppError::Conflict(_))));

        let dangling = create_zone(&test_db.pool, "Nowhere", Some(9999)).await;
        assert!(matches!(dangling, Err(AppError::Validation(_))));
    }
}
