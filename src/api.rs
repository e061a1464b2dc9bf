use crate::error::{truncate_for_log, Error, Result};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self::with_client(Client::new(), base_url, api_key)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match &self.api_key {
            Some(key) => builder.header("Authorization", format!("Key {}", key)),
            None => builder,
        }
    }

    pub async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = checked(builder.send().await?).await?;
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|error| {
            debug!(%error, body = %truncate_for_log(&text, 500), "unexpected API response body");
            Error::Json(error)
        })
    }

    pub async fn send_empty(&self, builder: RequestBuilder) -> Result<()> {
        checked(builder.send().await?).await?;
        Ok(())
    }
}

async fn checked(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().to_string();
    let body = response.text().await.unwrap_or_default();
    debug!(%status, %url, body = %truncate_for_log(&body, 500), "API request failed");
    Err(Error::api(status, &body))
}
