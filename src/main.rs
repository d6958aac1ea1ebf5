#[macro_use]
extern crate rocket;

mod auth;
mod config;
mod db;
mod env;
mod error;
mod models;
mod routes;
mod telemetry;
mod uploads;
mod validation;
#[cfg(test)]
mod test;

use auth::{unauthorized, unauthorized_api};
use config::AppConfig;
use db::sessions::clean_expired_sessions;
use db::taxonomy::ensure_seeded;
use error::AppError;
use rocket::figment::Figment;
use rocket::{Build, Rocket, tokio};
use sqlx::{Pool, Sqlite};
use telemetry::{TelemetryFairing, init_tracing, shutdown_telemetry};
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Anyhow(anyhow::Error),
    #[error("{0}")]
    Figment(rocket::figment::Error),
    #[error("{0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Application error: {0}")]
    App(#[from] AppError),
    #[error("Launch error: {0}")]
    Launch(#[from] rocket::Error),
}

impl From<anyhow::Error> for Error {
    fn from(value: anyhow::Error) -> Self {
        Error::Anyhow(value)
    }
}

impl From<rocket::figment::Error> for Error {
    fn from(value: rocket::figment::Error) -> Self {
        Error::Figment(value)
    }
}

#[rocket::main]
async fn main() -> Result<(), Error> {
    let env_report = env::load_environment();
    init_tracing();

    match env_report {
        Ok(report) => {
            for path in &report.loaded {
                info!(path = %path.display(), "Loaded environment file");
            }
            for path in &report.missing {
                warn!(path = %path.display(), "Environment file not found, skipping");
            }
        }
        Err(err) => error!(error = %err, "Failed to load environment files"),
    }

    let figment = rocket::Config::figment();
    let config = AppConfig::from_figment(&figment)?;

    let pool = db::connect(&config.database_url).await?;
    db::apply_schema(&pool).await?;

    let seeded = ensure_seeded(&pool).await;
    info!(
        inserted = %seeded.inserted,
        failed = %seeded.failed,
        "Default taxonomy seeded"
    );

    let pool_clone = pool.clone();

    tokio::spawn(async move {
        tokio::time::sleep(tokio::time::Duration::from_secs(5)).await;

        loop {
            match clean_expired_sessions(&pool_clone).await {
                Ok(count) => {
                    if count > 0 {
                        info!("Cleaned up {} expired sessions", count);
                    }
                }
                Err(e) => {
                    error!("Failed to clean expired sessions: {}", e);
                }
            }

            tokio::time::sleep(tokio::time::Duration::from_secs(3600)).await;
        }
    });

    let _rocket = init_rocket(figment, pool, config).launch().await?;

    shutdown_telemetry();
    Ok(())
}

pub fn init_rocket(figment: Figment, pool: Pool<Sqlite>, config: AppConfig) -> Rocket<Build> {
    info!("Starting maintenance tracker");

    rocket::custom(config.apply_limits(figment))
        .manage(pool)
        .manage(config)
        .mount("/", routes::page_routes())
        .mount("/api", routes::api_routes())
        .register("/", catchers![unauthorized])
        .register("/api", catchers![unauthorized_api])
        .attach(TelemetryFairing)
}
