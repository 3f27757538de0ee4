//! `tuklas-runtime` – scanning, explaining and talking to the AI service.
//!
//! # Modules
//!
//! - [`gateway`] – [`InferenceGateway`][gateway::InferenceGateway], the
//!   fallback-only boundary to the generative-AI service, and
//!   [`GeminiGateway`][gateway::GeminiGateway], its REST implementation.
//! - [`sanitize`] – strips Markdown code fences from model replies before
//!   JSON decoding.
//! - [`prompts`] – builds every prompt; the learning-card prompt embeds the
//!   reply's JSON Schema.
//! - [`pipeline`] – [`ScanPipeline`][pipeline::ScanPipeline]: capture →
//!   identify → card → journal, with points and haptic feedback.
//! - [`conversation`] – [`CardConversation`][conversation::CardConversation]:
//!   the in-memory "Bakit?" thread for one card section.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]: the global
//!   `tracing` subscriber with optional OTLP export.

pub mod conversation;
pub mod gateway;
pub mod pipeline;
pub mod prompts;
pub mod sanitize;
pub mod telemetry;

pub use conversation::{CardConversation, ExpandError, FOLLOW_UP_TITLE};
pub use gateway::{GatewayError, GeminiGateway, Identification, InferenceGateway, Reply};
pub use pipeline::{POINTS_PER_DISCOVERY, ScanOutcome, ScanPipeline, ScanState};
pub use sanitize::{SanitizeError, parse_json, strip_fences};
pub use telemetry::{TelemetryConfig, TelemetryGuard, init_tracing};
