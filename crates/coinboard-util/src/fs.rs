use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, trace};

/// Reads a `.json` file from `path`.
///
/// ```rust
/// let raw: serde_json::Value = coinboard_util::read_json("listings.json").await?;
/// ```
pub async fn read_json<T: serde::de::DeserializeOwned>(path: &str) -> Result<T> {
    let file = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {path}"))?;
    let data: T = serde_json::from_slice(&file)
        .with_context(|| format!("failed to deserialize {path}"))?;
    trace!("{path} read as json");
    Ok(data)
}

/// Reads a local asset (e.g. the logo image) into memory.
///
/// Missing files are an error here; callers decide whether that is fatal.
pub async fn read_asset(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("asset {} not found", path.display()))?;
    debug!("loaded asset {} ({} bytes)", path.display(), bytes.len());
    Ok(bytes)
}

/// Write `contents` to `path`, creating parent directories as necessary.
pub async fn write_file(path: impl AsRef<Path>, contents: &[u8]) -> Result<()> {
    let path = path.as_ref();
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(dir).await?;
    }
    tokio::fs::write(path, contents)
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;
    trace!("{} bytes written to {}", contents.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> std::path::PathBuf {
        std::env::temp_dir()
            .join(format!("coinboard-util-{}", std::process::id()))
            .join(name)
    }

    #[tokio::test]
    async fn write_then_read_json() {
        let path = scratch("nested/listings.json");
        write_file(&path, br#"{"data": []}"#).await.unwrap();

        let value: serde_json::Value = read_json(path.to_str().unwrap()).await.unwrap();
        assert_eq!(value["data"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn missing_asset_is_an_error() {
        let err = read_asset(scratch("no-such-logo.jpg")).await.unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
