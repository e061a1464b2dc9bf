use crate::error::{truncate_for_log, Error, Result};
use crate::event::Event;
use async_trait::async_trait;
use reqwest::Client;
use std::path::{Path, PathBuf};
use tokio::fs::{create_dir_all, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, batch: &[Event]) -> Result<()>;
}

pub struct HttpTransport {
    client: Client,
    endpoint: String,
    access_token: String,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>, access_token: Option<String>) -> Self {
        Self::with_client(Client::new(), endpoint, access_token)
    }

    pub fn with_client(
        client: Client,
        endpoint: impl Into<String>,
        access_token: Option<String>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            access_token: access_token.unwrap_or_default(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, batch: &[Event]) -> Result<()> {
        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("access_token", self.access_token.as_str())])
            .json(batch)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!(
                %status,
                endpoint = %self.endpoint,
                body = %truncate_for_log(&body, 500),
                "events endpoint rejected batch"
            );
            return Err(Error::api(status, &body));
        }

        Ok(())
    }
}

pub struct JsonlTransport {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonlTransport {
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                create_dir_all(parent).await?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;

        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Transport for JsonlTransport {
    async fn send(&self, batch: &[Event]) -> Result<()> {
        let mut lines = String::new();
        for event in batch {
            lines.push_str(&serde_json::to_string(event)?);
            lines.push('\n');
        }

        let mut file = self.file.lock().await;
        file.write_all(lines.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}
