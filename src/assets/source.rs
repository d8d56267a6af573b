//! Asset stores the glyph images are fetched from.

use crate::{Error, Result};
use std::future::Future;
use std::path::{Component, Path, PathBuf};

/// Anything that can hand out the bytes behind a store path such as
/// `/letters/A.svg`.
pub trait AssetSource: Send + Sync {
    fn fetch(&self, path: &str) -> impl Future<Output = Result<Vec<u8>>> + Send;
}

/// Asset store rooted at a local directory (the `public/` folder of a static
/// site, for instance).
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn locate(&self, path: &str) -> Result<PathBuf> {
        let rel = Path::new(path.trim_start_matches('/'));
        if rel
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(Error::AssetLoad {
                path: path.to_string(),
                reason: "path escapes the asset root".to_string(),
            });
        }
        Ok(self.root.join(rel))
    }
}

impl AssetSource for DirectorySource {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>> {
        let file = self.locate(path)?;
        tokio::fs::read(&file).await.map_err(|e| Error::AssetLoad {
            path: path.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Asset store served over HTTP(S), resolved against a base URL.
#[cfg(feature = "http")]
#[derive(Debug, Clone)]
pub struct HttpSource {
    base: url::Url,
    client: reqwest::Client,
}

#[cfg(feature = "http")]
impl HttpSource {
    pub fn new(base: &str) -> Result<Self> {
        let mut base = url::Url::parse(base)
            .map_err(|e| Error::Config(format!("invalid asset base URL {}: {}", base, e)))?;
        if !base.path().ends_with('/') {
            let p = format!("{}/", base.path());
            base.set_path(&p);
        }
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { base, client })
    }
}

#[cfg(feature = "http")]
impl AssetSource for HttpSource {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>> {
        let load_err = |reason: String| Error::AssetLoad {
            path: path.to_string(),
            reason,
        };
        let url = self
            .base
            .join(path.trim_start_matches('/'))
            .map_err(|e| load_err(e.to_string()))?;
        let res = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| load_err(e.to_string()))?;
        let body = res.bytes().await.map_err(|e| load_err(e.to_string()))?;
        Ok(body.to_vec())
    }
}
