//! Release metadata from the GitHub API

use once_cell::sync::Lazy;
use serde::Deserialize;
use thiserror::Error;

/// Shared HTTP client; building one per request would redo TLS setup.
static HTTP: Lazy<reqwest::Client> = Lazy::new(reqwest::Client::new);

const USER_AGENT: &str = concat!("sentra/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum ReleaseError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("release endpoint returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("no asset for this platform in release {0}")]
    MissingAsset(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseInfo {
    pub tag_name: String,
    pub name: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseAsset {
    pub name: String,
    pub browser_download_url: String,
}

impl ReleaseInfo {
    /// Version without the tag prefix ("v0.3.2" -> "0.3.2").
    pub fn version(&self) -> String {
        self.tag_name.trim_start_matches('v').to_string()
    }

    pub fn changelog(&self) -> &str {
        &self.body
    }

    /// The downloadable asset matching the running platform, by target-os
    /// marker in the asset file name.
    pub fn platform_asset(&self) -> Result<&ReleaseAsset, ReleaseError> {
        let marker = platform_marker();
        self.assets
            .iter()
            .find(|asset| asset.name.contains(marker))
            .ok_or_else(|| ReleaseError::MissingAsset(self.tag_name.clone()))
    }
}

fn platform_marker() -> &'static str {
    #[cfg(target_os = "linux")]
    return "linux";

    #[cfg(target_os = "macos")]
    return "darwin";

    #[cfg(target_os = "windows")]
    return "windows";

    #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
    return "unknown";
}

/// Fetch the latest release record for a `owner/repo` slug.
pub async fn fetch_latest_release(repo: &str) -> Result<ReleaseInfo, ReleaseError> {
    let url = format!("https://api.github.com/repos/{repo}/releases/latest");

    let response = HTTP
        .get(&url)
        .header("User-Agent", USER_AGENT)
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(ReleaseError::Status(response.status()));
    }

    Ok(response.json::<ReleaseInfo>().await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn release_with_assets(names: &[&str]) -> ReleaseInfo {
        ReleaseInfo {
            tag_name: "v0.4.0".to_string(),
            name: "Release 0.4.0".to_string(),
            body: "Changelog".to_string(),
            assets: names
                .iter()
                .map(|n| ReleaseAsset {
                    name: n.to_string(),
                    browser_download_url: format!("https://example.com/{n}"),
                })
                .collect(),
        }
    }

    #[test]
    fn test_version_extraction() {
        let release = release_with_assets(&[]);
        assert_eq!(release.version(), "0.4.0");
    }

    #[test]
    fn test_platform_asset_selection() {
        let release = release_with_assets(&[
            "sentra-x86_64-unknown-linux-gnu.tar.gz",
            "sentra-aarch64-apple-darwin.tar.gz",
            "sentra-x86_64-pc-windows-msvc.zip",
        ]);

        let asset = release.platform_asset().unwrap();
        assert!(asset.name.contains(platform_marker()));
    }

    #[test]
    fn test_missing_platform_asset() {
        let release = release_with_assets(&["README.md"]);
        assert!(matches!(
            release.platform_asset(),
            Err(ReleaseError::MissingAsset(_))
        ));
    }
}
