#[cfg(test)]
mod tests {
    use crate::auth::{Permission, Role};
    use crate::db::divisions::{get_division, list_divisions};
    use crate::db::users::{NewUser, authenticate_user, create_user, get_user, list_users};
    use crate::error::AppError;
    use crate::test::test_utils::{
        D1, D2, MANAGER, SPV, STANDARD_PASSWORD, SUPERUSER, TECHNICIAN, TestDbBuilder,
        create_standard_test_db,
    };

    fn new_user(email: &str, role: Role, division_id: Option<i64>) -> NewUser {
        NewUser {
            name: "New User".to_string(),
            email: email.to_string(),
            password: STANDARD_PASSWORD.to_string(),
            role,
            division_id,
        }
    }

    #[rocket::async_test]
    async fn test_manager_and_superuser_never_carry_a_division() {
        let test_db = TestDbBuilder::new()
            .division(D1)
            .build()
            .await
            .expect("Failed to build test database");
        let division_id = test_db.division_id(D1);

        for (email, role) in [
            ("boss@example.com", Role::Manager),
            ("root@example.com", Role::Superuser),
        ] {
            let id = create_user(&test_db.pool, &new_user(email, role, division_id))
                .await
                .expect("Failed to create user");

            let user = get_user(&test_db.pool, id).await.expect("Failed to get user");
            assert_eq!(user.role, role);
            assert_eq!(user.division_id, None, "{} must not keep a division", role);
        }
    }

    #[rocket::async_test]
    async fn test_spv_and_technician_require_a_division() {
        let test_db = TestDbBuilder::new()
            .build()
            .await
            .expect("Failed to build test database");

        let missing = create_user(&test_db.pool, &new_user("spv@example.com", Role::Spv, None)).await;
        assert!(matches!(missing, Err(AppError::Validation(_))));

        let unknown = create_user(
            &test_db.pool,
            &new_user("tech@example.com", Role::Technician, Some(999)),
        )
        .await;
        assert!(matches!(unknown, Err(AppError::NotFound(_))));
    }

    #[rocket::async_test]
    async fn test_duplicate_email_is_a_conflict() {
        let test_db = create_standard_test_db().await;

        let result = create_user(&test_db.pool, &new_user(MANAGER, Role::Manager, None)).await;

        match result {
            Err(AppError::Conflict(msg)) => assert!(msg.contains(MANAGER)),
            other => panic!("Expected Conflict error, got {:?}", other),
        }
    }

    #[rocket::async_test]
    async fn test_invalid_input_is_rejected() {
        let test_db = create_standard_test_db().await;

        let bad_email = create_user(&test_db.pool, &new_user("not-an-email", Role::Manager, None)).await;
        assert!(matches!(bad_email, Err(AppError::Validation(_))));

        let mut short_password = new_user("short@example.com", Role::Manager, None);
        short_password.password = "123".to_string();
        let result = create_user(&test_db.pool, &short_password).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[rocket::async_test]
    async fn test_authenticate_user() {
        let test_db = create_standard_test_db().await;

        let user = authenticate_user(&test_db.pool, SPV, STANDARD_PASSWORD)
            .await
            .expect("Valid credentials should authenticate");
        assert_eq!(user.role, Role::Spv);
        assert_eq!(user.division_id, test_db.division_id(D1));

        match authenticate_user(&test_db.pool, "nobody@example.com", STANDARD_PASSWORD).await {
            Err(AppError::NotFound(msg)) => assert_eq!(msg, "User not found"),
            other => panic!("Expected NotFound error, got {:?}", other),
        }

        match authenticate_user(&test_db.pool, SPV, "wrong-password").await {
            Err(AppError::Authentication(msg)) => assert_eq!(msg, "Incorrect password"),
            other => panic!("Expected Authentication error, got {:?}", other),
        }
    }

    #[rocket::async_test]
    async fn test_stored_users_respect_division_rule() {
        let test_db = create_standard_test_db().await;

        let users = list_users(&test_db.pool).await.expect("Failed to list users");
        assert_eq!(users.len(), 6);

        for user in users {
            assert_eq!(
                user.division_id.is_some(),
                user.role.has_division(),
                "{} ({}) has the wrong division",
                user.email,
                user.role
            );
        }
    }

    #[rocket::async_test]
    async fn test_division_lists_its_supervisors() {
        let test_db = create_standard_test_db().await;
        let d1 = test_db.division_id(D1).expect("Division not found");

        let division = get_division(&test_db.pool, d1).await.expect("Failed to get division");
        assert_eq!(division.name, D1);
        assert_eq!(division.spv_ids, vec![test_db.user_id(SPV).expect("User not found")]);

        let divisions = list_divisions(&test_db.pool)
            .await
            .expect("Failed to list divisions");
        let names: Vec<&str> = divisions.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec![D2, D1]);

        assert!(test_db.user_id(TECHNICIAN).is_some());
        assert!(test_db.user_id(SUPERUSER).is_some());
    }

    #[test]
    fn test_role_permissions_are_disjoint() {
        assert!(Role::Superuser.has_permission(Permission::ManageUsers));
        assert!(!Role::Superuser.has_permission(Permission::AuthorChecklists));
        assert!(Role::Spv.has_permission(Permission::AssignChecklists));
        assert!(!Role::Spv.has_permission(Permission::SubmitChecklists));
        assert!(Role::Technician.has_permission(Permission::SubmitChecklists));
        assert!(!Role::Technician.has_permission(Permission::ManageAssets));
        assert!(Role::Manager.has_permission(Permission::ViewAllReports));
        assert!(!Role::Manager.has_permission(Permission::ManageUsers));
    }

    #[test]
    fn test_role_round_trip_and_landing_pages() {
        for role in Role::ALL {
            let parsed: Role = role.as_str().parse().expect("Role should parse");
            assert_eq!(parsed, role);
        }
        assert!("admin".parse::<Role>().is_err());

        assert_eq!(Role::Superuser.landing_page(), "/superuser/dashboard");
        assert_eq!(Role::Spv.landing_page(), "/spv/dashboard");
        assert_eq!(Role::Manager.landing_page(), "/");
        assert_eq!(Role::Technician.landing_page(), "/");
    }
}
