use rocket::data::{ByteUnit, ToByteUnit};
use rocket::figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database_url: String,
    pub upload_dir: PathBuf,
    pub session_ttl_hours: i64,
    /// Largest single photo accepted on a checklist submission.
    pub upload_limit: ByteUnit,
    /// Largest whole multipart submission.
    pub submission_limit: ByteUnit,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://maintenance.db?mode=rwc".to_string(),
            upload_dir: PathBuf::from("public/uploads"),
            session_ttl_hours: 8,
            upload_limit: 20.mebibytes(),
            submission_limit: 64.mebibytes(),
        }
    }
}

impl AppConfig {
    /// Reads the config from Rocket's figment (`Rocket.toml`, `ROCKET_*`).
    /// `DATABASE_URL` wins over both when set.
    pub fn from_figment(figment: &Figment) -> Result<Self, rocket::figment::Error> {
        let mut config: AppConfig = figment.extract()?;

        if let Ok(url) = std::env::var("DATABASE_URL") {
            if !url.is_empty() {
                config.database_url = url;
            }
        }

        Ok(config)
    }

    /// Rocket's `file` and `data-form` limits follow the upload settings.
    pub fn apply_limits(&self, figment: Figment) -> Figment {
        figment
            .merge(("limits.file", self.upload_limit))
            .merge(("limits.data-form", self.submission_limit))
    }
}
