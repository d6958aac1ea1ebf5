use std::path::{Path, PathBuf};

/// Layers read at start-up, later files overriding earlier ones.
const COMMON_ENV: &str = "config/common.env";
const SECRETS_ENV: &str = ".secrets.env";

/// Which environment files were applied and which were absent.
#[derive(Debug, Default, PartialEq)]
pub struct EnvReport {
    pub loaded: Vec<PathBuf>,
    pub missing: Vec<PathBuf>,
}

fn profile_env(profile: &str) -> &'static str {
    if profile == "production" {
        "config/prod.env"
    } else {
        "config/dev.env"
    }
}

/// Loads the environment files relative to the working directory.
pub fn load_environment() -> Result<EnvReport, dotenvy::Error> {
    load_environment_from(Path::new("."))
}

/// Loads `config/common.env`, the profile file chosen by `ROCKET_PROFILE`
/// and `.secrets.env` from `root`. Missing files are reported, not fatal.
pub fn load_environment_from(root: &Path) -> Result<EnvReport, dotenvy::Error> {
    let profile = dotenvy::var("ROCKET_PROFILE").unwrap_or_else(|_| "development".to_string());

    let mut report = EnvReport::default();
    for file in [COMMON_ENV, profile_env(&profile), SECRETS_ENV] {
        let path = root.join(file);
        if path.exists() {
            dotenvy::from_filename_override(&path)?;
            report.loaded.push(path);
        } else {
            report.missing.push(path);
        }
    }

    Ok(report)
}
