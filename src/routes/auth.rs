use chrono::{Duration, Utc};
use rocket::State;
use rocket::form::Form;
use rocket::http::{Cookie, CookieJar, SameSite};
use rocket::response::Redirect;
use rocket::serde::json::Json;
use serde::{Deserialize, Serialize};
use sqlx::{Pool, Sqlite};
use tracing::{info, warn};

use crate::auth::{SESSION_COOKIE, User, UserSession};
use crate::config::AppConfig;
use crate::db::sessions::{create_user_session, invalidate_session};
use crate::db::users::authenticate_user;
use crate::error::AppError;

#[derive(Serialize, Deserialize, Debug)]
pub struct HomeView {
    pub user: Option<User>,
    pub dashboard: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct LoginView {
    pub user: Option<User>,
    pub fields: Vec<String>,
}

#[derive(FromForm)]
pub struct LoginForm {
    email: String,
    password: String,
}

#[get("/")]
pub fn index(user: Option<User>) -> Json<HomeView> {
    let dashboard = user
        .as_ref()
        .map(|user| user.role.dashboard_page().to_string());
    Json(HomeView { user, dashboard })
}

#[get("/login")]
pub fn login_page(user: Option<User>) -> Json<LoginView> {
    Json(LoginView {
        user,
        fields: vec!["email".to_string(), "password".to_string()],
    })
}

#[post("/login", data = "<form>")]
pub async fn login(
    form: Form<LoginForm>,
    cookies: &CookieJar<'_>,
    db: &State<Pool<Sqlite>>,
    config: &State<AppConfig>,
) -> Result<Redirect, AppError> {
    let user = authenticate_user(db, &form.email, &form.password).await?;

    let token = UserSession::generate_token();
    let expires_at = Utc::now() + Duration::hours(config.session_ttl_hours);
    create_user_session(db, user.id, &token, expires_at).await?;

    cookies.add_private(
        Cookie::build((SESSION_COOKIE, token))
            .same_site(SameSite::Lax)
            .http_only(true)
            .max_age(rocket::time::Duration::hours(config.session_ttl_hours)),
    );

    info!(user_id = %user.id, role = %user.role.as_str(), "User logged in");
    Ok(Redirect::to(user.role.landing_page()))
}

#[get("/logout")]
pub async fn logout(cookies: &CookieJar<'_>, db: &State<Pool<Sqlite>>) -> Redirect {
    let token = cookies
        .get_private(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string());

    if let Some(token) = token {
        if let Err(err) = invalidate_session(db, &token).await {
            warn!(error = %err, "Failed to delete session row on logout");
        }
    }

    cookies.remove_private(Cookie::build(SESSION_COOKIE));
    Redirect::to("/login")
}

#[get("/me")]
pub fn api_me(user: User) -> Json<User> {
    Json(user)
}
