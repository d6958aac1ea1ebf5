#[cfg(test)]
pub mod test_db {
    use crate::auth::{Role, User};
    use crate::db::assets::create_asset;
    use crate::db::checklists::create_checklist;
    use crate::db::divisions::create_division;
    use crate::db::taxonomy::{ensure_seeded, list_categories};
    use crate::db::users::{NewUser, create_user, find_user_by_email};
    use crate::db::{apply_schema, connect};
    use crate::error::AppError;
    use crate::models::{AssetInput, ChecklistInput, InputType, NewTask};
    use sqlx::{Pool, Sqlite};
    use std::collections::HashMap;
    use std::sync::Once;

    static INIT: Once = Once::new();
    pub static STANDARD_PASSWORD: &str = "password123";

    #[derive(Default)]
    pub struct TestDbBuilder {
        divisions: Vec<String>,
        users: Vec<TestUser>,
        assets: Vec<TestAsset>,
        checklists: Vec<TestChecklist>,
    }

    pub struct TestUser {
        pub name: String,
        pub email: String,
        pub role: Role,
        pub division: Option<String>,
    }

    pub struct TestAsset {
        pub name: String,
        pub division: String,
    }

    pub struct TestChecklist {
        pub title: String,
        pub owner_email: String,
        pub tasks: Vec<String>,
    }

    impl TestDbBuilder {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn division(mut self, name: &str) -> Self {
            self.divisions.push(name.to_string());
            self
        }

        fn user(mut self, email: &str, role: Role, division: Option<&str>) -> Self {
            let name = email.split('@').next().unwrap_or(email).to_string();
            self.users.push(TestUser {
                name,
                email: email.to_string(),
                role,
                division: division.map(String::from),
            });
            self
        }

        pub fn superuser(self, email: &str) -> Self {
            self.user(email, Role::Superuser, None)
        }

        pub fn manager(self, email: &str) -> Self {
            self.user(email, Role::Manager, None)
        }

        pub fn spv(self, email: &str, division: &str) -> Self {
            self.user(email, Role::Spv, Some(division))
        }

        pub fn technician(self, email: &str, division: &str) -> Self {
            self.user(email, Role::Technician, Some(division))
        }

        pub fn asset(mut self, name: &str, division: &str) -> Self {
            self.assets.push(TestAsset {
                name: name.to_string(),
                division: division.to_string(),
            });
            self
        }

        pub fn checklist(mut self, title: &str, owner_email: &str, tasks: &[&str]) -> Self {
            self.checklists.push(TestChecklist {
                title: title.to_string(),
                owner_email: owner_email.to_string(),
                tasks: tasks.iter().map(|task| task.to_string()).collect(),
            });
            self
        }

        pub async fn build(self) -> Result<TestDb, AppError> {
            INIT.call_once(|| {
                let _ = env_logger::builder()
                    .parse_filters("debug")
                    .is_test(true)
                    .try_init();
            });

            let pool = connect("sqlite::memory:").await?;
            apply_schema(&pool).await?;
            ensure_seeded(&pool).await;

            let mut division_id_map: HashMap<String, i64> = HashMap::new();
            let mut user_id_map: HashMap<String, i64> = HashMap::new();
            let mut asset_id_map: HashMap<String, i64> = HashMap::new();
            let mut checklist_id_map: HashMap<String, i64> = HashMap::new();

            for name in &self.divisions {
                let id = create_division(&pool, name).await?;
                division_id_map.insert(name.clone(), id);
            }

            for user in &self.users {
                let division_id = user
                    .division
                    .as_ref()
                    .and_then(|name| division_id_map.get(name).copied());

                let id = create_user(
                    &pool,
                    &NewUser {
                        name: user.name.clone(),
                        email: user.email.clone(),
                        password: STANDARD_PASSWORD.to_string(),
                        role: user.role,
                        division_id,
                    },
                )
                .await?;
                user_id_map.insert(user.email.clone(), id);
            }

            let category_id = list_categories(&pool)
                .await?
                .first()
                .map(|category| category.id)
                .unwrap_or_default();

            for asset in &self.assets {
                let division_id = division_id_map.get(&asset.division).copied().ok_or_else(|| {
                    AppError::NotFound(format!("Test division {} not declared", asset.division))
                })?;

                let input = AssetInput {
                    name: asset.name.clone(),
                    location: "Plant room".to_string(),
                    category_id,
                    ..AssetInput::default()
                };
                let id = create_asset(&pool, &input, division_id).await?;
                asset_id_map.insert(asset.name.clone(), id);
            }

            for checklist in &self.checklists {
                let owner = user_id_map.get(&checklist.owner_email).copied().ok_or_else(|| {
                    AppError::NotFound(format!("Test user {} not declared", checklist.owner_email))
                })?;

                let input = ChecklistInput {
                    title: checklist.title.clone(),
                    tasks: checklist
                        .tasks
                        .iter()
                        .map(|description| NewTask {
                            description: description.clone(),
                            input_type: InputType::Visual,
                            expected_unit: String::new(),
                            actual_value: None,
                            note: String::new(),
                        })
                        .collect(),
                };
                let id = create_checklist(&pool, owner, &input).await?;
                checklist_id_map.insert(checklist.title.clone(), id);
            }

            Ok(TestDb {
                pool,
                division_id_map,
                user_id_map,
                asset_id_map,
                checklist_id_map,
            })
        }
    }

    pub struct TestDb {
        pub pool: Pool<Sqlite>,
        pub division_id_map: HashMap<String, i64>,
        pub user_id_map: HashMap<String, i64>,
        pub asset_id_map: HashMap<String, i64>,
        pub checklist_id_map: HashMap<String, i64>,
    }

    impl TestDb {
        pub fn division_id(&self, name: &str) -> Option<i64> {
            self.division_id_map.get(name).copied()
        }

        pub fn user_id(&self, email: &str) -> Option<i64> {
            self.user_id_map.get(email).copied()
        }

        pub fn asset_id(&self, name: &str) -> Option<i64> {
            self.asset_id_map.get(name).copied()
        }

        pub fn checklist_id(&self, title: &str) -> Option<i64> {
            self.checklist_id_map.get(title).copied()
        }

        pub async fn user(&self, email: &str) -> User {
            find_user_by_email(&self.pool, email)
                .await
                .expect("Failed to look up test user")
                .expect("Test user not found")
        }
    }
}

#[cfg(test)]
pub mod test_utils {
    pub use super::test_db::{STANDARD_PASSWORD, TestDb, TestDbBuilder};

    use crate::config::AppConfig;
    use crate::init_rocket;
    use rocket::http::{ContentType, Status};
    use rocket::local::asynchronous::Client;
    use uuid::Uuid;

    pub const D1: &str = "Mechanical";
    pub const D2: &str = "Electrical";

    pub const SUPERUSER: &str = "admin@example.com";
    pub const MANAGER: &str = "manager@example.com";
    pub const SPV: &str = "spv@example.com";
    pub const SPV_D2: &str = "spv2@example.com";
    pub const TECHNICIAN: &str = "tech@example.com";
    pub const TECHNICIAN_D2: &str = "tech2@example.com";

    pub async fn create_standard_test_db() -> TestDb {
        TestDbBuilder::new()
            .division(D1)
            .division(D2)
            .superuser(SUPERUSER)
            .manager(MANAGER)
            .spv(SPV, D1)
            .spv(SPV_D2, D2)
            .technician(TECHNICIAN, D1)
            .technician(TECHNICIAN_D2, D2)
            .asset("AHU-01", D1)
            .asset("Panel-07", D2)
            .checklist(
                "Monthly AHU Check",
                SPV,
                &["Inspect filters", "Measure supply air temperature"],
            )
            .build()
            .await
            .expect("Failed to build test database")
    }

    pub fn test_config() -> AppConfig {
        AppConfig {
            database_url: "sqlite::memory:".to_string(),
            upload_dir: std::env::temp_dir()
                .join(format!("maintenance-tracker-test-{}", Uuid::new_v4())),
            ..AppConfig::default()
        }
    }

    pub async fn setup_test_client(test_db: TestDb) -> (Client, TestDb) {
        let rocket = init_rocket(
            rocket::Config::figment(),
            test_db.pool.clone(),
            test_config(),
        );
        let client = Client::tracked(rocket)
            .await
            .expect("Failed to create Rocket test client");

        (client, test_db)
    }

    pub async fn login_test_user(client: &Client, email: &str) -> Status {
        client
            .post("/login")
            .header(ContentType::Form)
            .body(format!("email={}&password={}", email, STANDARD_PASSWORD))
            .dispatch()
            .await
            .status()
    }

    pub async fn logout(client: &Client) {
        client.get("/logout").dispatch().await;
    }
}
