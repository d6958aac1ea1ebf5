#[cfg(test)]
mod tests {
    use crate::db::assets::{create_asset, delete_asset, find_asset, get_asset, list_assets, update_asset};
    use crate::db::assignments::{
        assign_checklist_to_assets, build_responses, list_templates_for_checklist, submit_checklist,
    };
    use crate::db::checklists::get_tasks;
    use crate::db::taxonomy::{create_floor, create_zone, list_categories};
    use crate::error::AppError;
    use crate::models::AssetInput;
    use crate::test::test_utils::{D1, D2, TECHNICIAN, create_standard_test_db};
    use std::collections::HashMap;

    #[rocket::async_test]
    async fn test_asset_division_comes_from_the_caller() {
        let test_db = create_standard_test_db().await;
        let d1 = test_db.division_id(D1).expect("Division not found");
        let category_id = list_categories(&test_db.pool).await.expect("Failed to list")[0].id;

        let input = AssetInput {
            name: "Chiller-02".to_string(),
            description: "Water-cooled chiller".to_string(),
            location: "Roof plant".to_string(),
            category_id,
            ..AssetInput::default()
        };
        let id = create_asset(&test_db.pool, &input, d1)
            .await
            .expect("Failed to create asset");

        let asset = get_asset(&test_db.pool, id).await.expect("Failed to get asset");
        assert_eq!(asset.division_id, d1);
        assert_eq!(asset.name, "Chiller-02");
        assert_eq!(asset.description, "Water-cooled chiller");
    }

    #[rocket::async_test]
    async fn test_list_assets_scopes_by_division() {
        let test_db = create_standard_test_db().await;
        let d1 = test_db.division_id(D1).expect("Division not found");
        let d2 = test_db.division_id(D2).expect("Division not found");

        let all = list_assets(&test_db.pool, None).await.expect("Failed to list assets");
        assert_eq!(all.len(), 2);

        let d1_assets = list_assets(&test_db.pool, Some(d1)).await.expect("Failed to list assets");
        assert_eq!(d1_assets.len(), 1);
        assert_eq!(d1_assets[0].name, "AHU-01");

        let d2_assets = list_assets(&test_db.pool, Some(d2)).await.expect("Failed to list assets");
        assert_eq!(d2_assets.len(), 1);
        assert_eq!(d2_assets[0].name, "Panel-07");
    }

    #[rocket::async_test]
    async fn test_update_asset_overwrites_fields_but_not_division() {
        let test_db = create_standard_test_db().await;
        let id = test_db.asset_id("AHU-01").expect("Asset not found");
        let before = get_asset(&test_db.pool, id).await.expect("Failed to get asset");

        let floor_id = create_floor(&test_db.pool, "Mezzanine").await.expect("Failed to create floor");
        let input = AssetInput {
            name: "AHU-01A".to_string(),
            description: String::new(),
            location: "Level 1 plant".to_string(),
            category_id: before.category_id,
            floor_id: Some(floor_id),
            zone_id: None,
        };
        update_asset(&test_db.pool, id, &input).await.expect("Failed to update asset");

        let after = get_asset(&test_db.pool, id).await.expect("Failed to get asset");
        assert_eq!(after.name, "AHU-01A");
        assert_eq!(after.location, "Level 1 plant");
        assert_eq!(after.floor_id, Some(floor_id));
        assert_eq!(after.division_id, before.division_id);

        let missing = update_asset(&test_db.pool, 9999, &input).await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }

    #[rocket::async_test]
    async fn test_zone_must_sit_on_the_selected_floor() {
        let test_db = create_standard_test_db().await;
        let d1 = test_db.division_id(D1).expect("Division not found");
        let category_id = list_categories(&test_db.pool).await.expect("Failed to list")[0].id;

        let upper = create_floor(&test_db.pool, "Upper").await.expect("Failed to create floor");
        let lower = create_floor(&test_db.pool, "Lower").await.expect("Failed to create floor");
        let zone = create_zone(&test_db.pool, "Upper Lobby", Some(upper))
            .await
            .expect("Failed to create zone");

        let mismatched = AssetInput {
            name: "Fan Coil".to_string(),
            category_id,
            floor_id: Some(lower),
            zone_id: Some(zone),
            ..AssetInput::default()
        };
        let result = create_asset(&test_db.pool, &mismatched, d1).await;
        assert!(matches!(result, Err(AppError::Validation(_))));

        let matched = AssetInput {
            floor_id: Some(upper),
            ..mismatched
        };
        create_asset(&test_db.pool, &matched, d1)
            .await
            .expect("Matching floor and zone should be accepted");
    }

    #[rocket::async_test]
    async fn test_asset_requires_name_and_known_category() {
        let test_db = create_standard_test_db().await;
        let d1 = test_db.division_id(D1).expect("Division not found");

        let unnamed = AssetInput {
            category_id: 1,
            ..AssetInput::default()
        };
        let result = create_asset(&test_db.pool, &unnamed, d1).await;
        assert!(matches!(result, Err(AppError::Validation(_))));

        let unknown_category = AssetInput {
            name: "Mystery".to_string(),
            category_id: 9999,
            ..AssetInput::default()
        };
        let result = create_asset(&test_db.pool, &unknown_category, d1).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[rocket::async_test]
    async fn test_delete_asset_drops_templates_but_keeps_history() {
        let test_db = create_standard_test_db().await;
        let asset_id = test_db.asset_id("AHU-01").expect("Asset not found");
        let checklist_id = test_db.checklist_id("Monthly AHU Check").expect("Checklist not found");
        let technician = test_db.user_id(TECHNICIAN).expect("User not found");

        assign_checklist_to_assets(&test_db.pool, checklist_id, &[asset_id])
            .await
            .expect("Failed to assign");
        let template = list_templates_for_checklist(&test_db.pool, checklist_id)
            .await
            .expect("Failed to list templates")[0]
            .assignment
            .id;

        let tasks = get_tasks(&test_db.pool, checklist_id).await.expect("Failed to get tasks");
        let responses = build_responses(&tasks, &HashMap::new(), &HashMap::new());
        let submission = submit_checklist(&test_db.pool, template, technician, &responses)
            .await
            .expect("Failed to submit");

        delete_asset(&test_db.pool, asset_id).await.expect("Failed to delete asset");

        assert!(find_asset(&test_db.pool, asset_id).await.expect("Query failed").is_none());
        let templates = list_templates_for_checklist(&test_db.pool, checklist_id)
            .await
            .expect("Failed to list templates");
        assert!(templates.is_empty());

        let kept = crate::db::assignments::get_assignment(&test_db.pool, submission.id)
            .await
            .expect("Submission should survive asset deletion");
        assert!(kept.asset.is_none());
        assert_eq!(kept.assignment.asset_id, asset_id);
        assert_eq!(kept.assignment.division_id, test_db.division_id(D1));

        let report = crate::db::assignments::list_completed_for_division(
            &test_db.pool,
            test_db.division_id(D1).expect("Division not found"),
        )
        .await
        .expect("Failed to list report");
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].assignment.id, submission.id);

        let again = delete_asset(&test_db.pool, asset_id).await;
        assert!(matches!(again, Err(AppError::NotFound(_))));
    }
}
