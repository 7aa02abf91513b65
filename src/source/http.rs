use super::{rows_from_value, Annotation, NewAnnotation, QuerySource};
use crate::config::HttpConfig;
use crate::data::{EntityId, Row};
use crate::error::{Result, StrataError};
use crate::manifest::ManifestResponse;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use tracing::debug;
use url::Url;

/// Client for a running query API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base: Url,
}

impl ApiClient {
    /// Create a client for the API rooted at `base`.
    pub fn new(base: &str, config: &HttpConfig) -> Result<Self> {
        let mut base = Url::parse(base)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, base })
    }

    /// Resolve an API path (`/api/...`, optionally with a query string).
    pub fn url(&self, path: &str) -> Result<Url> {
        Ok(self.base.join(path.trim_start_matches('/'))?)
    }

    async fn send(&self, request: RequestBuilder, url: &Url) -> Result<Value> {
        debug!("HTTP {}", url);
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            // Error bodies look like {"error": "..."}; fall back to the reason phrase.
            let body: Option<Value> = response.json().await.ok();
            let message = body
                .as_ref()
                .and_then(|b| b.get("error"))
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("Request failed")
                        .to_string()
                });
            return Err(StrataError::status(url.as_str(), status.as_u16(), message));
        }
        Ok(response.json().await?)
    }

    async fn get(&self, path: &str) -> Result<Value> {
        let url = self.url(path)?;
        self.send(self.client.get(url.clone()), &url).await
    }
}

#[async_trait]
impl QuerySource for ApiClient {
    fn describe(&self) -> String {
        self.base.to_string()
    }

    async fn manifest(&self) -> Result<ManifestResponse> {
        ManifestResponse::from_value(self.get("/api/manifest").await?)
    }

    async fn execute(&self, query: &str, params: &[(String, String)]) -> Result<Vec<Row>> {
        let mut url = self.url(&format!("/api/queries/{query}/execute"))?;
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params.iter());
        }
        let body = self.send(self.client.get(url.clone()), &url).await?;
        rows_from_value(body, url.as_str())
    }

    async fn fetch_json(&self, path: &str) -> Result<Value> {
        self.get(path).await
    }

    async fn annotations(&self, entity_type: &str, entity_id: &EntityId) -> Result<Vec<Annotation>> {
        let url = self.url(&format!("/api/annotations/{entity_type}/{entity_id}"))?;
        let body = self.send(self.client.get(url.clone()), &url).await?;
        serde_json::from_value(body).map_err(|e| StrataError::json(url.as_str(), e))
    }

    async fn create_annotation(&self, annotation: &NewAnnotation) -> Result<Annotation> {
        let url = self.url("/api/annotations")?;
        let body = self
            .send(self.client.post(url.clone()).json(annotation), &url)
            .await?;
        serde_json::from_value(body).map_err(|e| StrataError::json(url.as_str(), e))
    }

    async fn delete_annotation(&self, id: i64) -> Result<()> {
        let url = self.url(&format!("/api/annotations/{id}"))?;
        self.send(self.client.delete(url.clone()), &url).await?;
        Ok(())
    }
}
