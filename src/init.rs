use crate::config::Config;
use crate::logi;
use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs;

pub async fn ensure_directories(cfg: &Config) -> Result<()> {
    for dir in [&cfg.data_dir, &cfg.export_dir] {
        ensure_dir(dir).await?;
    }
    Ok(())
}

async fn ensure_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create dir {}", dir.display()))?;
        logi(format!("Created directory: {}", dir.display()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn creates_nested_dirs_once() {
        let root = tempfile::tempdir().unwrap();
        let cfg = Config {
            api_key: "k".to_string(),
            data_dir: root.path().join("a/data"),
            export_dir: root.path().join("b/exports"),
            ..Config::default()
        };
        ensure_directories(&cfg).await.unwrap();
        ensure_directories(&cfg).await.unwrap();
        assert!(cfg.data_dir.is_dir());
        assert!(cfg.export_dir.is_dir());
    }
}
