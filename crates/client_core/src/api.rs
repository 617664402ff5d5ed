//! Remote evaluation client: the three HTTP operations of the grading service.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::{EvaluationId, EvaluationResult, HistoryItem},
    error::ErrorBody,
    protocol::{EvaluateRequest, EvaluationPayload, HistoryResponse},
};
use tracing::{debug, warn};
use url::Url;

use crate::error::EvaluationError;

pub const DEFAULT_HISTORY_LIMIT: usize = 10;

/// Seam between the session/history controllers and the grading service.
///
/// Every call hits the network once: no caching, retry or timeout.
#[async_trait]
pub trait EvaluationApi: Send + Sync {
    async fn submit(
        &self,
        question_image_b64: &str,
        answer_image_b64: &str,
    ) -> Result<EvaluationResult, EvaluationError>;

    /// Newest first, in the order the service returns them.
    async fn list_history(&self, limit: usize) -> Result<Vec<HistoryItem>, EvaluationError>;

    async fn fetch_by_id(
        &self,
        evaluation_id: &EvaluationId,
    ) -> Result<EvaluationResult, EvaluationError>;
}

pub struct HttpEvaluationClient {
    http: Client,
    base_url: String,
}

impl HttpEvaluationClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_http_client(Client::new(), base_url)
    }

    pub fn with_http_client(http: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, EvaluationError> {
        let mut url = Url::parse(&self.base_url).map_err(|err| {
            EvaluationError::Transport(format!("invalid base url '{}': {err}", self.base_url))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                EvaluationError::Transport(format!(
                    "base url '{}' cannot carry a path",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, EvaluationError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.json::<ErrorBody>().await.unwrap_or_default();
        let message = body.message_or_status(status.as_u16());
        return Err(EvaluationError::remote(status.as_u16(), message));
    }
    Ok(response.json::<T>().await?)
}

fn into_result(payload: EvaluationPayload) -> EvaluationResult {
    if payload.has_count_mismatch() {
        warn!(
            evaluation_id = %payload.evaluation_id,
            incorrect_count = payload.incorrect_count,
            tabs = payload.tabs.len(),
            "incorrect_count disagrees with returned tabs; using tab count"
        );
    }
    payload.into_result()
}

#[async_trait]
impl EvaluationApi for HttpEvaluationClient {
    async fn submit(
        &self,
        question_image_b64: &str,
        answer_image_b64: &str,
    ) -> Result<EvaluationResult, EvaluationError> {
        if question_image_b64.is_empty() || answer_image_b64.is_empty() {
            return Err(EvaluationError::missing_images());
        }

        let url = self.endpoint(&["api", "evaluate"])?;
        debug!(%url, "submitting evaluation");
        let response = self
            .http
            .post(url)
            .json(&EvaluateRequest {
                question_image: question_image_b64.to_string(),
                answer_image: answer_image_b64.to_string(),
            })
            .send()
            .await?;
        let payload: EvaluationPayload = read_json(response).await?;
        Ok(into_result(payload))
    }

    async fn list_history(&self, limit: usize) -> Result<Vec<HistoryItem>, EvaluationError> {
        let url = self.endpoint(&["api", "evaluations"])?;
        debug!(%url, limit, "listing evaluation history");
        let response = self
            .http
            .get(url)
            .query(&[("limit", limit)])
            .send()
            .await?;
        let body: HistoryResponse = read_json(response).await?;
        Ok(body.evaluations)
    }

    async fn fetch_by_id(
        &self,
        evaluation_id: &EvaluationId,
    ) -> Result<EvaluationResult, EvaluationError> {
        let url = self.endpoint(&["api", "evaluations", evaluation_id.as_str()])?;
        debug!(%url, "fetching evaluation");
        let response = self.http.get(url).send().await?;
        let payload: EvaluationPayload = read_json(response).await?;
        Ok(into_result(payload))
    }
}

#[cfg(test)]
#[path = "tests/api_tests.rs"]
mod tests;
