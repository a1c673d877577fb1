//! Latest-release lookup
//!
//! Reads the release metadata document and picks the binary and checksum
//! assets for the running platform. Only the fields below are read; the
//! rest of the document is ignored.

use super::http::{get_text_with_retry, Fetcher, RetryPolicy};
use super::platform::Platform;
use super::version::strip_tag_prefix;
use crate::config::UpdateConfig;
use crate::error::{CsError, CsResult};
use serde::Deserialize;
use tracing::debug;

/// Repository releases are published under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseSource {
    pub api_base: String,
    pub owner: String,
    pub repo: String,
}

impl ReleaseSource {
    /// Resolve the repository identity.
    ///
    /// Precedence: environment, config file, values baked in at build time.
    pub fn resolve(
        config: &UpdateConfig,
        env_owner: Option<String>,
        env_repo: Option<String>,
    ) -> CsResult<Self> {
        let pick = |env: Option<String>, file: &Option<String>, baked: Option<&str>| {
            env.filter(|v| !v.is_empty())
                .or_else(|| file.clone().filter(|v| !v.is_empty()))
                .or_else(|| baked.filter(|v| !v.is_empty()).map(str::to_string))
        };

        let owner = pick(env_owner, &config.owner, option_env!("CS_REPO_OWNER"));
        let repo = pick(env_repo, &config.repo, option_env!("CS_REPO_NAME"));
        match (owner, repo) {
            (Some(owner), Some(repo)) => Ok(Self {
                api_base: config.api_base.trim_end_matches('/').to_string(),
                owner,
                repo,
            }),
            _ => Err(CsError::UpdateSourceMissing),
        }
    }

    /// Metadata URL for the latest release
    pub fn latest_url(&self) -> String {
        format!(
            "{}/repos/{}/{}/releases/latest",
            self.api_base, self.owner, self.repo
        )
    }
}

#[derive(Debug, Deserialize)]
struct ReleasePayload {
    tag_name: Option<String>,
    #[serde(default)]
    assets: Vec<AssetPayload>,
}

#[derive(Debug, Deserialize)]
struct AssetPayload {
    name: String,
    #[serde(default)]
    browser_download_url: String,
}

/// Latest release as seen from the metadata endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatestRelease {
    /// Tag as published, e.g. `v1.4.0`
    pub tag: String,
    assets: Vec<(String, String)>,
}

impl LatestRelease {
    /// Parse the metadata document
    pub fn parse(json: &str) -> CsResult<Self> {
        let payload: ReleasePayload = serde_json::from_str(json)?;
        let tag = payload
            .tag_name
            .filter(|tag| !tag.is_empty())
            .ok_or(CsError::ReleaseTagMissing)?;
        let assets = payload
            .assets
            .into_iter()
            .filter(|asset| !asset.browser_download_url.is_empty())
            .map(|asset| (asset.name, asset.browser_download_url))
            .collect();
        Ok(Self { tag, assets })
    }

    /// Version with the tag's `v` prefix removed
    pub fn version(&self) -> &str {
        strip_tag_prefix(&self.tag)
    }

    /// Download URL of the asset called `name`
    pub fn asset_url(&self, name: &str) -> Option<&str> {
        self.assets
            .iter()
            .find(|(asset, _)| asset == name)
            .map(|(_, url)| url.as_str())
    }

    /// Pick the binary and checksum assets for `platform`
    pub fn descriptor(&self, product: &str, platform: &Platform) -> CsResult<ReleaseDescriptor> {
        let asset_name = platform.asset_name(product);
        let checksum_name = platform.checksum_name(product);

        match (self.asset_url(&asset_name), self.asset_url(&checksum_name)) {
            (Some(asset_url), Some(checksum_url)) => Ok(ReleaseDescriptor {
                tag: self.tag.clone(),
                platform: platform.clone(),
                asset_name,
                asset_url: asset_url.to_string(),
                checksum_url: checksum_url.to_string(),
            }),
            (asset, checksum) => {
                let mut missing = Vec::new();
                if asset.is_none() {
                    missing.push(asset_name);
                }
                if checksum.is_none() {
                    missing.push(checksum_name);
                }
                Err(CsError::ReleaseAssetNotFound {
                    os: platform.os.to_string(),
                    arch: platform.arch.to_string(),
                    missing,
                })
            }
        }
    }
}

/// Everything needed to download one platform's update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseDescriptor {
    pub tag: String,
    pub platform: Platform,
    pub asset_name: String,
    pub asset_url: String,
    pub checksum_url: String,
}

/// Fetch and parse the latest release
pub fn fetch_latest(
    fetcher: &dyn Fetcher,
    source: &ReleaseSource,
    retry: RetryPolicy,
) -> CsResult<LatestRelease> {
    let url = source.latest_url();
    let json = get_text_with_retry(fetcher, &url, retry)?;
    let release = LatestRelease::parse(&json)?;
    debug!(
        "Release tag: {} ({} assets)",
        release.tag,
        release.assets.len()
    );
    Ok(release)
}
