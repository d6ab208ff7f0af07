use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::json;

use super::{DuplicateResponse, GuiaBackend, SaveDuplicatesResponse};
use crate::config::BackendConfig;
use crate::error::BackendError;
use crate::models::{ChainKind, Guia, HierarchyNode, Level};

/// reqwest-backed gateway
#[derive(Debug, Clone)]
pub struct HttpBackend {
    http: reqwest::Client,
    base_url: String,
    api_token: Option<String>,
}

impl HttpBackend {
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let rb = self.http.request(method, url);
        match &self.api_token {
            Some(token) => rb.bearer_auth(token),
            None => rb,
        }
    }

    pub(crate) async fn send_json<T: DeserializeOwned>(rb: RequestBuilder) -> Result<T, BackendError> {
        let resp = Self::send(rb).await?;
        resp.json::<T>()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))
    }

    pub(crate) async fn send(rb: RequestBuilder) -> Result<reqwest::Response, BackendError> {
        let resp = rb.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
                .unwrap_or(body);
            tracing::error!("Backend responded {}: {}", status, message);
            return Err(BackendError::Server {
                status: status.as_u16(),
                message,
            });
        }
        Ok(resp)
    }
}

#[async_trait]
impl GuiaBackend for HttpBackend {
    async fn get_all_originals(&self) -> Result<Vec<Guia>, BackendError> {
        Self::send_json(self.request(Method::GET, "guias/originales")).await
    }

    async fn duplicate(&self, source_id: i64, count: u32) -> Result<DuplicateResponse, BackendError> {
        let rb = self
            .request(Method::POST, &format!("guias/{}/duplicar", source_id))
            .json(&json!({ "cantidad": count }));
        let resp: DuplicateResponse = Self::send_json(rb).await?;
        if !resp.success {
            return Err(BackendError::Rejected(resp.message));
        }
        Ok(resp)
    }

    async fn save_duplicates(&self, records: &[Guia]) -> Result<SaveDuplicatesResponse, BackendError> {
        let rb = self
            .request(Method::POST, "guias/duplicados")
            .json(&json!({ "guias": records }));
        Self::send_json(rb).await
    }

    async fn list_level(
        &self,
        kind: ChainKind,
        level: Level,
        parent_id: Option<i64>,
    ) -> Result<Vec<HierarchyNode>, BackendError> {
        let mut rb = self.request(Method::GET, level.resource_path(kind));
        if let Some(parent_id) = parent_id {
            rb = rb.query(&[("parent_id", parent_id)]);
        }
        Self::send_json(rb).await
    }
}
