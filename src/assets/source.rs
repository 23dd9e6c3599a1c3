use std::{
    io::SeekFrom,
    path::PathBuf,
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use reqwest::{
    header::RANGE,
    Client,
    StatusCode,
};
use tokio::io::{
    AsyncReadExt,
    AsyncSeekExt,
};

use crate::core::KikuError;

/// Where raw asset bytes come from. Paths are relative to the source's base.
#[async_trait]
pub trait AssetSource: Send + Sync {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, KikuError>;

    /// Fetches the inclusive byte range `start..=end` of an asset.
    async fn fetch_range(&self, path: &str, start: u64, end: u64) -> Result<Vec<u8>, KikuError>;

    fn describe(&self) -> String;
}

/// Picks an HTTP source for `http(s)://` bases and a directory source otherwise.
pub fn source_for(base: &str) -> Result<Arc<dyn AssetSource>, KikuError> {
    if base.starts_with("http://") || base.starts_with("https://") {
        Ok(Arc::new(HttpAssets::new(base)?))
    } else {
        let root = base.strip_prefix("file://").unwrap_or(base);
        Ok(Arc::new(DirAssets::new(root)))
    }
}

pub struct HttpAssets {
    base: String,
    client: Client,
}

impl HttpAssets {
    pub fn new(base: &str) -> Result<Self, KikuError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| KikuError::Custom(format!("HTTP client build failed: {e}")))?;
        Ok(Self { base: base.trim_end_matches('/').to_string(), client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl AssetSource for HttpAssets {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, KikuError> {
        let resp = self
            .client
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| KikuError::asset_unavailable(path, e))?;

        if !resp.status().is_success() {
            return Err(KikuError::asset_unavailable(path, format!("HTTP {}", resp.status())));
        }

        let body = resp.bytes().await.map_err(|e| KikuError::asset_unavailable(path, e))?;
        Ok(body.to_vec())
    }

    async fn fetch_range(&self, path: &str, start: u64, end: u64) -> Result<Vec<u8>, KikuError> {
        check_range(path, start, end)?;
        let resp = self
            .client
            .get(self.url(path))
            .header(RANGE, format!("bytes={}-{}", start, end))
            .send()
            .await
            .map_err(|e| KikuError::asset_unavailable(path, e))?;

        let status = resp.status();
        let body = resp.bytes().await.map_err(|e| KikuError::asset_unavailable(path, e))?;
        match status {
            StatusCode::PARTIAL_CONTENT => {
                let size = (end - start + 1) as usize;
                let mut body = body.to_vec();
                // Some servers ignore the end of the range.
                body.truncate(size);
                Ok(body)
            }
            // Range not honoured: the full asset came back.
            StatusCode::OK => slice_bytes(path, &body, start, end),
            status => Err(KikuError::asset_unavailable(path, format!("HTTP {}", status))),
        }
    }

    fn describe(&self) -> String {
        self.base.clone()
    }
}

pub struct DirAssets {
    root: PathBuf,
}

impl DirAssets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}

#[async_trait]
impl AssetSource for DirAssets {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, KikuError> {
        tokio::fs::read(self.path(path)).await.map_err(|e| KikuError::asset_unavailable(path, e))
    }

    async fn fetch_range(&self, path: &str, start: u64, end: u64) -> Result<Vec<u8>, KikuError> {
        check_range(path, start, end)?;
        let mut file = tokio::fs::File::open(self.path(path))
            .await
            .map_err(|e| KikuError::asset_unavailable(path, e))?;
        file.seek(SeekFrom::Start(start)).await.map_err(|e| KikuError::asset_unavailable(path, e))?;

        let mut buf = vec![0u8; (end - start + 1) as usize];
        file.read_exact(&mut buf).await.map_err(|e| KikuError::asset_unavailable(path, e))?;
        Ok(buf)
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}

fn check_range(path: &str, start: u64, end: u64) -> Result<(), KikuError> {
    if end < start {
        return Err(KikuError::asset_unavailable(
            path,
            format!("invalid byte range {}-{}", start, end),
        ));
    }
    Ok(())
}

pub fn slice_bytes(path: &str, bytes: &[u8], start: u64, end: u64) -> Result<Vec<u8>, KikuError> {
    check_range(path, start, end)?;
    let (start, end) = (start as usize, end as usize);
    if end >= bytes.len() {
        return Err(KikuError::decode(
            path,
            format!("byte range {}-{} exceeds asset size {}", start, end, bytes.len()),
        ));
    }
    Ok(bytes[start..=end].to_vec())
}
