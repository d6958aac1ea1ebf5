use chrono::Utc;
use rocket::fs::TempFile;
use std::path::Path;
use tracing::{info, instrument};

use crate::error::AppError;

/// URL prefix under which stored uploads are referenced.
pub const PUBLIC_PREFIX: &str = "/uploads";

/// `<millis>-<name>[.<ext>]`. Two uploads with the same name in the same
/// millisecond collide; the later one wins.
pub fn stored_file_name(millis: i64, name: Option<&str>, extension: Option<&str>) -> String {
    let base = name.filter(|name| !name.is_empty()).unwrap_or("upload");
    match extension {
        Some(ext) if !ext.is_empty() => format!("{}-{}.{}", millis, base, ext),
        _ => format!("{}-{}", millis, base),
    }
}

/// Moves an uploaded file into `dir` and returns its public path, or `None`
/// for an empty file input.
#[instrument(skip(file))]
pub async fn store_upload(file: &mut TempFile<'_>, dir: &Path) -> Result<Option<String>, AppError> {
    if file.len() == 0 {
        return Ok(None);
    }

    rocket::tokio::fs::create_dir_all(dir).await?;

    let extension = file
        .content_type()
        .and_then(|content_type| content_type.extension())
        .map(|ext| ext.to_string());
    let file_name = stored_file_name(
        Utc::now().timestamp_millis(),
        file.name(),
        extension.as_deref(),
    );

    file.move_copy_to(dir.join(&file_name)).await?;
    info!(file_name = %file_name, "Stored upload");

    Ok(Some(format!("{}/{}", PUBLIC_PREFIX, file_name)))
}
