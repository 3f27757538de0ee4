//! [`InferenceGateway`] – the remote generative-AI boundary.
//!
//! Every operation recovers from failure into a typed fallback value, so
//! callers never see a transport error. [`GeminiGateway`] is the production
//! implementation and talks to the Gemini `generateContent` REST endpoint.
//!
//! # Example
//!
//! ```rust,no_run
//! use tuklas_runtime::gateway::{GeminiGateway, InferenceGateway};
//!
//! # async fn run() {
//! let gateway = GeminiGateway::new("my-api-key", "gemini-1.5-flash-latest");
//! // Requires network access and a valid key.
//! let quest = gateway.daily_quest().await;
//! println!("{}", quest.text());
//! # }
//! ```

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use tuklas_hal::CapturedImage;
use tuklas_types::{LearningCard, UserLevel};

use crate::prompts::{self, CardReply, IdentifyReply};
use crate::sanitize::{self, SanitizeError};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash-latest";

pub const UNIDENTIFIED_NAME: &str = "Could not identify object";
pub const UNIDENTIFIED_CONTEXT: &str = "unknown";
pub const DEEPEN_FALLBACK: &str = "I'm not sure how to explain that further at the moment.";
pub const QUEST_FALLBACK: &str = "Today's Quest: Discover something new around you!";
pub const CAREER_EMPTY: &str = "Start scanning objects to discover your potential career paths!";
pub const CAREER_FALLBACK: &str =
    "Explore your discoveries below to see how they connect to amazing careers!";

// ─────────────────────────────────────────────────────────────────────────────
// Result types
// ─────────────────────────────────────────────────────────────────────────────

/// What the model thinks the photographed object is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identification {
    pub object_name: String,
    pub context: String,
}

impl Identification {
    pub fn new(object_name: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            object_name: object_name.into(),
            context: context.into(),
        }
    }

    /// The sentinel returned when identification fails.
    pub fn unidentified() -> Self {
        Self::new(UNIDENTIFIED_NAME, UNIDENTIFIED_CONTEXT)
    }

    /// `false` for the sentinel or a blank object name.
    pub fn is_identified(&self) -> bool {
        let name = self.object_name.trim();
        !name.is_empty() && name != UNIDENTIFIED_NAME
    }
}

/// Free-text reply that is either generated or a canned fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Generated(String),
    Fallback(&'static str),
}

impl Reply {
    pub fn text(&self) -> &str {
        match self {
            Reply::Generated(text) => text,
            Reply::Fallback(text) => text,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Reply::Fallback(_))
    }

    pub fn into_text(self) -> String {
        match self {
            Reply::Generated(text) => text,
            Reply::Fallback(text) => text.to_string(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Trait
// ─────────────────────────────────────────────────────────────────────────────

/// The five generative operations the app relies on.
///
/// None of them fail: each returns its fallback when the remote service is
/// unreachable, refuses, or replies with something unusable.
#[async_trait]
pub trait InferenceGateway: Send + Sync {
    /// Name and one-word category of the object in `image`, or
    /// [`Identification::unidentified`].
    async fn identify(&self, image: &CapturedImage) -> Identification;

    /// A complete three-section card, or `None`.
    async fn generate_card(
        &self,
        object_name: &str,
        context: &str,
        level: UserLevel,
    ) -> Option<LearningCard>;

    /// One level deeper explanation of the last line of `conversation`.
    async fn deepen(&self, conversation: &str) -> Reply;

    async fn daily_quest(&self) -> Reply;

    /// A short career theme built from recent discovery names.
    async fn career_insight(&self, object_names: &[String]) -> Reply;
}

// ─────────────────────────────────────────────────────────────────────────────
// Error type
// ─────────────────────────────────────────────────────────────────────────────

/// Errors that can arise while talking to the Gemini endpoint.
///
/// These never cross the [`InferenceGateway`] boundary; they are logged and
/// replaced by the operation's fallback.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Invalid endpoint URL: {0}")]
    BadUrl(String),
    #[error("Service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Unexpected response format: {0}")]
    BadResponse(String),
    #[error("Unusable reply: {0}")]
    Sanitize(#[from] SanitizeError),
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire shapes
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text { text: &'a str },
    Image { inline_data: InlineData<'a> },
}

#[derive(Serialize)]
struct InlineData<'a> {
    mime_type: &'a str,
    data: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// GeminiGateway
// ─────────────────────────────────────────────────────────────────────────────

/// Async client for the Gemini `generateContent` endpoint.
///
/// Construct once and share behind an `Arc`.
pub struct GeminiGateway {
    base_url: String,
    model: String,
    api_key: String,
    client: reqwest::Client,
}

impl GeminiGateway {
    /// Gateway using `model` on the public endpoint.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: model.into(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Send requests to `base_url` instead of the public endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> Result<reqwest::Url, GatewayError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        );
        reqwest::Url::parse_with_params(&url, &[("key", self.api_key.as_str())])
            .map_err(|e| GatewayError::BadUrl(format!("{url}: {e}")))
    }

    /// Send one request and return the first candidate's text.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Http`] if the request fails,
    /// [`GatewayError::Status`] for a non-2xx reply, or
    /// [`GatewayError::BadResponse`] if no candidate text is present.
    async fn generate(&self, parts: Vec<Part<'_>>) -> Result<String, GatewayError> {
        let body = GenerateRequest {
            contents: [Content { parts }],
        };

        // reqwest errors carry the request URL, and with it the key.
        let response = self
            .client
            .post(self.endpoint()?)
            .json(&body)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let reply: GenerateResponse = response.json().await.map_err(reqwest::Error::without_url)?;
        reply
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text)
            .ok_or_else(|| GatewayError::BadResponse("no candidate text".into()))
    }

    async fn generate_text(&self, prompt: &str) -> Result<String, GatewayError> {
        let text = self.generate(vec![Part::Text { text: prompt }]).await?;
        let text = text.trim();
        if text.is_empty() {
            return Err(SanitizeError::Empty.into());
        }
        Ok(text.to_string())
    }

    async fn try_identify(&self, image: &CapturedImage) -> Result<Identification, GatewayError> {
        let parts = vec![
            Part::Text {
                text: prompts::identify(),
            },
            Part::Image {
                inline_data: InlineData {
                    mime_type: &image.mime_type,
                    data: STANDARD.encode(&image.data),
                },
            },
        ];
        let raw = self.generate(parts).await?;
        let reply: IdentifyReply = sanitize::parse_json(&raw)?;
        let context = if reply.context.trim().is_empty() {
            UNIDENTIFIED_CONTEXT.to_string()
        } else {
            reply.context.trim().to_string()
        };
        Ok(Identification::new(reply.object_name.trim(), context))
    }

    async fn try_generate_card(
        &self,
        object_name: &str,
        context: &str,
        level: UserLevel,
    ) -> Result<Option<LearningCard>, GatewayError> {
        let prompt = prompts::learning_card(object_name, context, level);
        let raw = self.generate(vec![Part::Text { text: &prompt }]).await?;
        let reply: CardReply = sanitize::parse_json(&raw)?;
        Ok(reply.into_card())
    }
}

#[async_trait]
impl InferenceGateway for GeminiGateway {
    async fn identify(&self, image: &CapturedImage) -> Identification {
        match self.try_identify(image).await {
            Ok(found) if found.is_identified() => {
                debug!(object = %found.object_name, context = %found.context, "object identified");
                found
            }
            Ok(_) => {
                warn!("identify reply carried no object name");
                Identification::unidentified()
            }
            Err(e) => {
                warn!(error = %e, "identify failed");
                Identification::unidentified()
            }
        }
    }

    async fn generate_card(
        &self,
        object_name: &str,
        context: &str,
        level: UserLevel,
    ) -> Option<LearningCard> {
        match self.try_generate_card(object_name, context, level).await {
            Ok(Some(card)) => Some(card),
            Ok(None) => {
                warn!(object = %object_name, "learning card came back incomplete");
                None
            }
            Err(e) => {
                warn!(object = %object_name, error = %e, "learning card generation failed");
                None
            }
        }
    }

    async fn deepen(&self, conversation: &str) -> Reply {
        match self.generate_text(&prompts::deepen(conversation)).await {
            Ok(text) => Reply::Generated(text),
            Err(e) => {
                warn!(error = %e, "deeper explanation failed");
                Reply::Fallback(DEEPEN_FALLBACK)
            }
        }
    }

    async fn daily_quest(&self) -> Reply {
        match self.generate_text(prompts::daily_quest()).await {
            Ok(text) => Reply::Generated(text),
            Err(e) => {
                warn!(error = %e, "daily quest failed");
                Reply::Fallback(QUEST_FALLBACK)
            }
        }
    }

    async fn career_insight(&self, object_names: &[String]) -> Reply {
        if object_names.is_empty() {
            return Reply::Fallback(CAREER_EMPTY);
        }
        match self.generate_text(&prompts::career_insight(object_names)).await {
            Ok(text) => Reply::Generated(text),
            Err(e) => {
                warn!(error = %e, "career insight failed");
                Reply::Fallback(CAREER_FALLBACK)
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
