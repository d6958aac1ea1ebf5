use serde::Deserialize;
use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};
use validator::Validate;

use crate::auth::{DbUser, Role, User};
use crate::error::AppError;

#[cfg(not(test))]
const HASH_COST: u32 = bcrypt::DEFAULT_COST;
#[cfg(test)]
const HASH_COST: u32 = 4;

const USER_COLUMNS: &str = "id, name, email, role, division_id";

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewUser {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "A valid email address is required"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    pub role: Role,
    pub division_id: Option<i64>,
}

#[instrument]
pub async fn get_user(pool: &Pool<Sqlite>, id: i64) -> Result<User, AppError> {
    info!("Fetching user by ID");
    let row = sqlx::query_as::<_, DbUser>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(user) => User::try_from(user),
        _ => Err(AppError::NotFound(format!(
            "User with id {} not found in database",
            id
        ))),
    }
}

#[instrument]
pub async fn find_user_by_email(pool: &Pool<Sqlite>, email: &str) -> Result<Option<User>, AppError> {
    info!("Finding user by email");
    let row = sqlx::query_as::<_, DbUser>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE email = ?"
    ))
    .bind(email)
    .fetch_optional(pool)
    .await?;

    row.map(User::try_from).transpose()
}

#[instrument]
pub async fn list_users(pool: &Pool<Sqlite>) -> Result<Vec<User>, AppError> {
    info!("Listing users");
    let rows = sqlx::query_as::<_, DbUser>(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY name"))
        .fetch_all(pool)
        .await?;

    rows.into_iter().map(User::try_from).collect()
}

/// Checks an email/password pair. Distinguishes an unknown email from a
/// wrong password, matching what the login form reports.
#[instrument(skip_all, fields(email = %email))]
pub async fn authenticate_user(
    pool: &Pool<Sqlite>,
    email: &str,
    password: &str,
) -> Result<User, AppError> {
    info!("Authenticating user");

    #[derive(sqlx::FromRow)]
    struct Credentials {
        id: i64,
        password: String,
    }

    let credentials =
        sqlx::query_as::<_, Credentials>("SELECT id, password FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    // A malformed stored hash is treated like a mismatch.
    if !bcrypt::verify(password, &credentials.password).unwrap_or(false) {
        return Err(AppError::Authentication("Incorrect password".to_string()));
    }

    get_user(pool, credentials.id).await
}

/// Registers a user. Superusers and managers never carry a division;
/// supervisors and technicians must name an existing one.
#[instrument(skip_all, fields(email = %new_user.email, role = %new_user.role))]
pub async fn create_user(pool: &Pool<Sqlite>, new_user: &NewUser) -> Result<i64, AppError> {
    info!("Creating new user");
    new_user.validate()?;

    let division_id = if new_user.role.has_division() {
        let division_id = new_user.division_id.ok_or_else(|| {
            AppError::Validation(format!("A {} must belong to a division", new_user.role))
        })?;
        crate::db::divisions::get_division(pool, division_id).await?;
        Some(division_id)
    } else {
        None
    };

    if find_user_by_email(pool, &new_user.email).await?.is_some() {
        return Err(AppError::Conflict(format!(
            "Email '{}' is already registered",
            new_user.email
        )));
    }

    let hashed_password = bcrypt::hash(&new_user.password, HASH_COST)?;

    // The unique index still guards against a concurrent registration.
    let res = sqlx::query(
        "INSERT INTO users (name, email, password, role, division_id) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&new_user.name)
    .bind(&new_user.email)
    .bind(hashed_password)
    .bind(new_user.role.as_str())
    .bind(division_id)
    .execute(pool)
    .await
    .map_err(|e| match AppError::from(e) {
        AppError::Conflict(_) => {
            AppError::Conflict(format!("Email '{}' is already registered", new_user.email))
        }
        other => other,
    })?;

    Ok(res.last_insert_rowid())
}
