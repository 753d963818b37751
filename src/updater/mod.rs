//! Release checking, download, and install hand-off
//!
//! The coordinator only ever calls three things here: `check()` from the
//! update-check background activity, and `download()` + `install()` from the
//! notification-click path. Install errors travel back as `UpdateError` so
//! the shell can put them in front of the user.

mod release;

pub use release::{fetch_latest_release, ReleaseAsset, ReleaseError, ReleaseInfo};

use crate::config::version::is_newer_version;
use log::{debug, info};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UpdateError {
    #[error(transparent)]
    Release(#[from] ReleaseError),
    #[error("download failed: {0}")]
    Download(reqwest::Error),
    #[error("could not write update to disk: {0}")]
    Io(#[from] std::io::Error),
    #[error("installer hand-off failed: {0}")]
    Install(String),
}

/// Update pipeline against a GitHub repository.
pub struct Updater {
    repo: String,
}

impl Updater {
    pub fn new(repo: impl Into<String>) -> Self {
        Self { repo: repo.into() }
    }

    pub fn current_version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    /// Fetch the latest release; `Some` only when it is newer than the
    /// running binary.
    pub async fn check(&self) -> Result<Option<ReleaseInfo>, UpdateError> {
        let release = fetch_latest_release(&self.repo).await?;
        let latest = release.version();

        if is_newer_version(&latest, Self::current_version()) {
            info!("New version available: v{latest}");
            Ok(Some(release))
        } else {
            debug!("Already up to date (v{})", Self::current_version());
            Ok(None)
        }
    }

    /// Download an update artifact to the temp dir, returning its path.
    pub async fn download(&self, url: &str) -> Result<PathBuf, UpdateError> {
        debug!("Downloading update from {url}");

        let response = reqwest::get(url).await.map_err(UpdateError::Download)?;
        let response = response
            .error_for_status()
            .map_err(UpdateError::Download)?;

        let file_name = url
            .rsplit('/')
            .next()
            .filter(|n| !n.is_empty())
            .unwrap_or("sentra-update")
            .to_string();
        let bytes = response.bytes().await.map_err(UpdateError::Download)?;

        let target = std::env::temp_dir().join(file_name);
        tokio::fs::write(&target, &bytes).await?;

        info!("Downloaded {} bytes to {:?}", bytes.len(), target);
        Ok(target)
    }

    /// Hand the downloaded artifact to the platform's installer surface.
    pub async fn install(&self, path: &Path) -> Result<(), UpdateError> {
        if !path.exists() {
            return Err(UpdateError::Install(format!(
                "downloaded file missing: {}",
                path.display()
            )));
        }

        let opener = platform_opener();
        let status = tokio::process::Command::new(opener)
            .arg(path)
            .status()
            .await
            .map_err(|e| UpdateError::Install(format!("failed to launch {opener}: {e}")))?;

        if !status.success() {
            return Err(UpdateError::Install(format!(
                "{opener} exited with {status}"
            )));
        }

        info!("Installer launched for {:?}", path);
        Ok(())
    }
}

fn platform_opener() -> &'static str {
    #[cfg(target_os = "macos")]
    return "open";

    #[cfg(target_os = "windows")]
    return "explorer";

    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    return "xdg-open";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_version() {
        let version = Updater::current_version();
        assert!(!version.is_empty());
        assert!(version.contains('.'));
    }

    #[tokio::test]
    async fn test_install_rejects_missing_file() {
        let updater = Updater::new("sentra-monitor/sentra");
        let result = updater
            .install(Path::new("/nonexistent/sentra-update.tar.gz"))
            .await;
        assert!(matches!(result, Err(UpdateError::Install(_))));
    }
}
