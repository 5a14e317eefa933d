use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{DashboardError, Result};
use crate::models::{
    Alert, AnalysisReport, ChatMessage, Conversation, Envelope, ExchangeReply, HistoricalSeries,
    ManualAnalysisAck, NewConversation, OutgoingMessage, PriceBoard, ServiceStatus,
};
use crate::services::{ChatBackend, MarketSource};

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct ApiClientBuilder {
    base_url: String,
    timeout: Duration,
}

impl ApiClientBuilder {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<ApiClient> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(DashboardError::InvalidConfig(format!(
                "API url must be http(s): {}",
                self.base_url
            )));
        }

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::CONTENT_TYPE,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );

        let http = Client::builder()
            .timeout(self.timeout)
            .default_headers(headers)
            .build()?;

        Ok(ApiClient {
            http,
            base_url: self.base_url,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        ApiClientBuilder::new(base_url).build()
    }

    pub fn builder(base_url: impl Into<String>) -> ApiClientBuilder {
        ApiClientBuilder::new(base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.execute(self.http.get(self.url(path))).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<T> {
        self.execute(self.http.post(self.url(path)).json(body)).await
    }

    async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.execute(self.http.delete(self.url(path))).await
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await?;
        let status = response.status();
        debug!("{} {}", status, response.url());

        let body = response.text().await?;
        if !status.is_success() {
            return Err(DashboardError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }
        decode(&body)
    }

    pub async fn prices(&self) -> Result<PriceBoard> {
        self.get("/api/crypto/prices").await
    }

    pub async fn history(&self, coin_id: &str, days: u32) -> Result<HistoricalSeries> {
        self.get(&history_path(coin_id, days)?).await
    }

    pub async fn analysis(&self) -> Result<AnalysisReport> {
        self.get("/api/analysis").await
    }

    pub async fn alerts(&self) -> Result<Vec<Alert>> {
        let items: Vec<Value> = self.get("/api/alerts").await?;
        Ok(decode_each(items))
    }

    pub async fn status(&self) -> Result<ServiceStatus> {
        self.get("/api/status").await
    }

    pub async fn trigger_manual_analysis(&self) -> Result<ManualAnalysisAck> {
        self.post("/api/manual-analysis", &serde_json::json!({})).await
    }

    pub async fn conversations(&self, user_id: &str) -> Result<Envelope<Vec<Conversation>>> {
        self.get(&format!("/api/ai-chat/conversations/{}", path_segment(user_id)?))
            .await
    }

    pub async fn messages(&self, conversation_id: &str) -> Result<Envelope<Vec<ChatMessage>>> {
        self.get(&messages_path(conversation_id)?).await
    }

    pub async fn create_conversation(
        &self,
        request: &NewConversation,
    ) -> Result<Envelope<Conversation>> {
        self.post("/api/ai-chat/conversations", request).await
    }

    pub async fn delete_conversation(&self, conversation_id: &str) -> Result<Envelope<Value>> {
        self.delete(&conversation_path(conversation_id)?).await
    }

    pub async fn send_message(&self, message: &OutgoingMessage) -> Result<Envelope<ExchangeReply>> {
        self.post(&messages_path(&message.conversation_id)?, message)
            .await
    }
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| {
        DashboardError::MalformedResponse(format!("{e} in body starting {:?}", preview(body)))
    })
}

/// Decodes list items one by one, dropping the ones that do not parse.
fn decode_each<T: DeserializeOwned>(items: Vec<Value>) -> Vec<T> {
    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                warn!("skipping malformed item: {e}");
                None
            }
        })
        .collect()
}

fn preview(body: &str) -> &str {
    let end = body
        .char_indices()
        .nth(80)
        .map(|(i, _)| i)
        .unwrap_or(body.len());
    &body[..end]
}

// Ids are interpolated into the path, so anything that could change the route is refused.
fn path_segment(value: &str) -> Result<&str> {
    let valid = !value.is_empty()
        && !value.chars().all(|c| c == '.')
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(value)
    } else {
        Err(DashboardError::InvalidConfig(format!(
            "invalid path segment: {value:?}"
        )))
    }
}

fn history_path(coin_id: &str, days: u32) -> Result<String> {
    Ok(format!(
        "/api/crypto/history/{}?days={days}",
        path_segment(coin_id)?
    ))
}

fn conversation_path(conversation_id: &str) -> Result<String> {
    Ok(format!(
        "/api/ai-chat/conversations/{}",
        path_segment(conversation_id)?
    ))
}

fn messages_path(conversation_id: &str) -> Result<String> {
    Ok(format!("{}/messages", conversation_path(conversation_id)?))
}

#[async_trait]
impl MarketSource for ApiClient {
    async fn prices(&self) -> Result<PriceBoard> {
        ApiClient::prices(self).await
    }

    async fn history(&self, coin_id: &str, days: u32) -> Result<HistoricalSeries> {
        ApiClient::history(self, coin_id, days).await
    }

    async fn analysis(&self) -> Result<AnalysisReport> {
        ApiClient::analysis(self).await
    }

    async fn alerts(&self) -> Result<Vec<Alert>> {
        ApiClient::alerts(self).await
    }

    async fn status(&self) -> Result<ServiceStatus> {
        ApiClient::status(self).await
    }
}

#[async_trait]
impl ChatBackend for ApiClient {
    async fn conversations(&self, user_id: &str) -> Result<Envelope<Vec<Conversation>>> {
        ApiClient::conversations(self, user_id).await
    }

    async fn messages(&self, conversation_id: &str) -> Result<Envelope<Vec<ChatMessage>>> {
        ApiClient::messages(self, conversation_id).await
    }

    async fn create_conversation(
        &self,
        request: &NewConversation,
    ) -> Result<Envelope<Conversation>> {
        ApiClient::create_conversation(self, request).await
    }

    async fn delete_conversation(&self, conversation_id: &str) -> Result<Envelope<Value>> {
        ApiClient::delete_conversation(self, conversation_id).await
    }

    async fn send_message(&self, message: &OutgoingMessage) -> Result<Envelope<ExchangeReply>> {
        ApiClient::send_message(self, message).await
    }
}
