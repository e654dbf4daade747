//! External capability contracts.
//!
//! The engine never talks to a concrete transport. Each external
//! collaborator (community comment source, web search, generative
//! assistant, image analyst) is a trait with a blocking HTTP-backed
//! production implementation and a fake implementation for tests and
//! offline runs. Failures are typed so each channel can degrade
//! independently.

use crate::report::VehicleFacts;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::time::Duration;

/// Capability errors, caught at the channel boundary.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CapabilityError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Request timeout after {0} seconds")]
    Timeout(u64),

    #[error("Invalid payload from capability: {0}")]
    InvalidPayload(String),

    #[error("Capability returned an empty response")]
    EmptyResponse,
}

/// One community comment as delivered by the evidence source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub body: String,
    /// Author identity, or the deletion marker "[deleted]".
    pub author: String,
    /// Author reputation score.
    pub karma: i64,
}

impl Comment {
    /// Whether the comment body is usable evidence.
    pub fn is_valid(&self) -> bool {
        let body = self.body.trim();
        !body.is_empty() && body != "[deleted]"
    }
}

/// One search result: URL plus text snippet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub url: String,
    pub snippet: String,
}

/// The assistant's structured answer. Authoritative when invoked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistantReply {
    pub diagnosis: String,
    pub solution_steps: Vec<String>,
    pub parts_needed: Vec<String>,
}

/// Community evidence source: thread id in, ordered comments out.
pub trait CommentSource: Send + Sync {
    fn fetch_comments(&self, thread_id: &str) -> Result<Vec<Comment>, CapabilityError>;
}

/// Web search capability: per query, a list of url/snippet results.
pub trait WebSearch: Send + Sync {
    fn search(&self, queries: &[String]) -> Result<Vec<Vec<SearchHit>>, CapabilityError>;
}

/// Generative assistant capability.
pub trait Assistant: Send + Sync {
    fn infer(
        &self,
        problem: &str,
        facts: &VehicleFacts,
        enriched_text: &str,
    ) -> Result<AssistantReply, CapabilityError>;
}

/// Image description capability. Output only enriches the text passed to
/// the assistant; it never feeds the extractor or the web collector.
pub trait ImageAnalyst: Send + Sync {
    fn describe(&self, image_url: &str, context: &str) -> Result<String, CapabilityError>;
}

// ============================================================================
// HTTP implementations
// ============================================================================

/// Connection settings shared by the HTTP capability clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityEndpoint {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for CapabilityEndpoint {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8080".to_string(),
            api_key: None,
            timeout_secs: 20,
        }
    }
}

fn build_client(config: &CapabilityEndpoint) -> Result<reqwest::blocking::Client, CapabilityError> {
    reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .map_err(|e| CapabilityError::Http(format!("Failed to create HTTP client: {}", e)))
}

fn map_send_error(e: reqwest::Error, timeout_secs: u64) -> CapabilityError {
    if e.is_timeout() {
        CapabilityError::Timeout(timeout_secs)
    } else {
        CapabilityError::Http(format!("Request failed: {}", e))
    }
}

/// Comment source backed by a JSON HTTP service.
pub struct HttpCommentSource {
    config: CapabilityEndpoint,
    client: reqwest::blocking::Client,
}

impl HttpCommentSource {
    pub fn new(config: CapabilityEndpoint) -> Result<Self, CapabilityError> {
        let client = build_client(&config)?;
        Ok(Self { config, client })
    }
}

impl CommentSource for HttpCommentSource {
    fn fetch_comments(&self, thread_id: &str) -> Result<Vec<Comment>, CapabilityError> {
        let url = format!("{}/threads/{}/comments", self.config.endpoint, thread_id);
        let mut request = self.client.get(&url);
        if let Some(api_key) = &self.config.api_key {
            request = request.bearer_auth(api_key);
        }
        let response = request
            .send()
            .map_err(|e| map_send_error(e, self.config.timeout_secs))?;

        if !response.status().is_success() {
            return Err(CapabilityError::Http(format!(
                "HTTP {} from comment source",
                response.status()
            )));
        }

        response
            .json::<Vec<Comment>>()
            .map_err(|e| CapabilityError::InvalidPayload(format!("Failed to parse comments: {}", e)))
    }
}

/// Web search backed by a JSON HTTP service.
pub struct HttpWebSearch {
    config: CapabilityEndpoint,
    client: reqwest::blocking::Client,
}

impl HttpWebSearch {
    pub fn new(config: CapabilityEndpoint) -> Result<Self, CapabilityError> {
        let client = build_client(&config)?;
        Ok(Self { config, client })
    }
}

impl WebSearch for HttpWebSearch {
    fn search(&self, queries: &[String]) -> Result<Vec<Vec<SearchHit>>, CapabilityError> {
        let url = format!("{}/search", self.config.endpoint);
        let body = serde_json::json!({ "queries": queries });

        let mut request = self.client.post(&url).json(&body);
        if let Some(api_key) = &self.config.api_key {
            request = request.bearer_auth(api_key);
        }
        let response = request
            .send()
            .map_err(|e| map_send_error(e, self.config.timeout_secs))?;

        if !response.status().is_success() {
            return Err(CapabilityError::Http(format!(
                "HTTP {} from search capability",
                response.status()
            )));
        }

        response
            .json::<Vec<Vec<SearchHit>>>()
            .map_err(|e| CapabilityError::InvalidPayload(format!("Failed to parse results: {}", e)))
    }
}

/// Assistant backed by a JSON HTTP service.
pub struct HttpAssistant {
    config: CapabilityEndpoint,
    client: reqwest::blocking::Client,
}

impl HttpAssistant {
    pub fn new(config: CapabilityEndpoint) -> Result<Self, CapabilityError> {
        let client = build_client(&config)?;
        Ok(Self { config, client })
    }
}

impl Assistant for HttpAssistant {
    fn infer(
        &self,
        problem: &str,
        facts: &VehicleFacts,
        enriched_text: &str,
    ) -> Result<AssistantReply, CapabilityError> {
        let url = format!("{}/diagnose", self.config.endpoint);
        let body = serde_json::json!({
            "problem": problem,
            "vehicle": facts,
            "post_content": enriched_text,
        });

        let mut request = self.client.post(&url).json(&body);
        if let Some(api_key) = &self.config.api_key {
            request = request.bearer_auth(api_key);
        }
        let response = request
            .send()
            .map_err(|e| map_send_error(e, self.config.timeout_secs))?;

        if !response.status().is_success() {
            return Err(CapabilityError::Http(format!(
                "HTTP {} from assistant",
                response.status()
            )));
        }

        let reply: AssistantReply = response.json().map_err(|e| {
            CapabilityError::InvalidPayload(format!("Failed to parse assistant reply: {}", e))
        })?;

        if reply.diagnosis.trim().is_empty() {
            return Err(CapabilityError::EmptyResponse);
        }
        Ok(reply)
    }
}

/// Image analyst backed by a JSON HTTP service.
pub struct HttpImageAnalyst {
    config: CapabilityEndpoint,
    client: reqwest::blocking::Client,
}

impl HttpImageAnalyst {
    pub fn new(config: CapabilityEndpoint) -> Result<Self, CapabilityError> {
        let client = build_client(&config)?;
        Ok(Self { config, client })
    }
}

impl ImageAnalyst for HttpImageAnalyst {
    fn describe(&self, image_url: &str, context: &str) -> Result<String, CapabilityError> {
        let url = format!("{}/describe", self.config.endpoint);
        let body = serde_json::json!({ "image_url": image_url, "context": context });

        let mut request = self.client.post(&url).json(&body);
        if let Some(api_key) = &self.config.api_key {
            request = request.bearer_auth(api_key);
        }
        let response = request
            .send()
            .map_err(|e| map_send_error(e, self.config.timeout_secs))?;

        if !response.status().is_success() {
            return Err(CapabilityError::Http(format!(
                "HTTP {} from image analyst",
                response.status()
            )));
        }

        let json: serde_json::Value = response.json().map_err(|e| {
            CapabilityError::InvalidPayload(format!("Failed to parse description: {}", e))
        })?;
        json.get("description")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .ok_or(CapabilityError::EmptyResponse)
    }
}

// ============================================================================
// Fakes for tests and offline runs
// ============================================================================

/// Fake comment source with queued responses and a call counter.
pub struct FakeCommentSource {
    responses: Mutex<Vec<Result<Vec<Comment>, CapabilityError>>>,
    call_count: Mutex<usize>,
}

impl FakeCommentSource {
    pub fn new(responses: Vec<Result<Vec<Comment>, CapabilityError>>) -> Self {
        Self {
            responses: Mutex::new(responses),
            call_count: Mutex::new(0),
        }
    }

    /// Always return the same comment list.
    pub fn with_comments(comments: Vec<Comment>) -> Self {
        Self::new(vec![Ok(comments)])
    }

    /// Always fail with the given error.
    pub fn always_error(error: CapabilityError) -> Self {
        Self::new(vec![Err(error)])
    }

    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }
}

impl CommentSource for FakeCommentSource {
    fn fetch_comments(&self, _thread_id: &str) -> Result<Vec<Comment>, CapabilityError> {
        *self.call_count.lock().unwrap() += 1;
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Err(CapabilityError::EmptyResponse);
        }
        if responses.len() == 1 {
            responses[0].clone()
        } else {
            responses.remove(0)
        }
    }
}

/// Fake web search returning a fixed per-query result set.
pub struct FakeWebSearch {
    response: Result<Vec<Vec<SearchHit>>, CapabilityError>,
    call_count: Mutex<usize>,
}

impl FakeWebSearch {
    pub fn with_results(results: Vec<Vec<SearchHit>>) -> Self {
        Self {
            response: Ok(results),
            call_count: Mutex::new(0),
        }
    }

    pub fn empty() -> Self {
        Self::with_results(Vec::new())
    }

    pub fn always_error(error: CapabilityError) -> Self {
        Self {
            response: Err(error),
            call_count: Mutex::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }
}

impl WebSearch for FakeWebSearch {
    fn search(&self, _queries: &[String]) -> Result<Vec<Vec<SearchHit>>, CapabilityError> {
        *self.call_count.lock().unwrap() += 1;
        self.response.clone()
    }
}

/// Fake assistant returning a fixed reply.
pub struct FakeAssistant {
    response: Result<AssistantReply, CapabilityError>,
    call_count: Mutex<usize>,
}

impl FakeAssistant {
    pub fn with_reply(reply: AssistantReply) -> Self {
        Self {
            response: Ok(reply),
            call_count: Mutex::new(0),
        }
    }

    pub fn always_error(error: CapabilityError) -> Self {
        Self {
            response: Err(error),
            call_count: Mutex::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }
}

impl Assistant for FakeAssistant {
    fn infer(
        &self,
        _problem: &str,
        _facts: &VehicleFacts,
        _enriched_text: &str,
    ) -> Result<AssistantReply, CapabilityError> {
        *self.call_count.lock().unwrap() += 1;
        self.response.clone()
    }
}

/// Fake image analyst returning a fixed description.
pub struct FakeImageAnalyst {
    response: Result<String, CapabilityError>,
}

impl FakeImageAnalyst {
    pub fn with_description(description: &str) -> Self {
        Self {
            response: Ok(description.to_string()),
        }
    }

    pub fn always_error(error: CapabilityError) -> Self {
        Self {
            response: Err(error),
        }
    }
}

impl ImageAnalyst for FakeImageAnalyst {
    fn describe(&self, _image_url: &str, _context: &str) -> Result<String, CapabilityError> {
        self.response.clone()
    }
}
