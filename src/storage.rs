use crate::models::AppData;
use crate::store::StoreError;
use std::path::Path;
use tokio::fs;
use tracing::error;

/// Reads the data file; a missing file is an empty board.
///
/// Unreadable or malformed files are errors so that the next write cannot
/// replace records that simply failed to parse.
pub async fn load_data(path: &Path) -> Result<AppData, StoreError> {
    match fs::read(path).await {
        Ok(bytes) => serde_json::from_slice(&bytes).map_err(|err| {
            error!(path = %path.display(), "failed to parse data file: {err}");
            StoreError::from(err)
        }),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(AppData::default()),
        Err(err) => {
            error!(path = %path.display(), "failed to read data file: {err}");
            Err(StoreError::from(err))
        }
    }
}

/// Writes the snapshot to a sibling temp file and renames it into place.
pub async fn persist_data(path: &Path, data: &AppData) -> Result<(), StoreError> {
    let payload = serde_json::to_vec_pretty(data)?;
    let temp_path = path.with_extension("json.tmp");

    let written = async {
        fs::write(&temp_path, payload).await?;
        fs::rename(&temp_path, path).await
    }
    .await;

    written.map_err(|err| {
        error!(path = %path.display(), "failed to write data file: {err}");
        StoreError::from(err)
    })
}
