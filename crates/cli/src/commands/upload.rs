//! Image upload command.

use std::path::PathBuf;

use shopstate_engine::ShopContext;
use shopstate_engine::upload::UploadFile;
use tracing::info;

use super::CliError;

/// Upload `paths` to the configured endpoint and log the returned URLs.
///
/// # Errors
///
/// Returns an error if a file cannot be read, no endpoint is configured, or
/// the upload fails.
pub async fn images(ctx: &ShopContext, paths: &[PathBuf]) -> Result<(), CliError> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let file = UploadFile::from_path(path)
            .await
            .map_err(shopstate_engine::EngineError::from)?;
        files.push(file);
    }

    let urls = ctx.upload_images(files).await?;
    for (path, url) in paths.iter().zip(&urls) {
        info!("{} -> {url}", path.display());
    }
    Ok(())
}
