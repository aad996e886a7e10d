//! Hosted natural-language service seam.
//!
//! [`NlpService`] is the narrow interface the hosted annotators call.
//! [`ComprehendService`] implements it on AWS Comprehend; tests substitute
//! in-memory fakes.

mod comprehend;
pub mod retry;

pub use comprehend::ComprehendService;
pub use retry::RetryPolicy;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::AnnotationError;

/// Categorical sentiment as reported by the hosted service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
    Mixed,
}

impl SentimentLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "POSITIVE",
            SentimentLabel::Negative => "NEGATIVE",
            SentimentLabel::Neutral => "NEUTRAL",
            SentimentLabel::Mixed => "MIXED",
        }
    }

    /// Case-insensitive parse of a service label.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_uppercase().as_str() {
            "POSITIVE" => Some(SentimentLabel::Positive),
            "NEGATIVE" => Some(SentimentLabel::Negative),
            "NEUTRAL" => Some(SentimentLabel::Neutral),
            "MIXED" => Some(SentimentLabel::Mixed),
            _ => None,
        }
    }
}

/// Per-category confidence returned alongside the label.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SentimentScores {
    pub positive: f32,
    pub negative: f32,
    pub neutral: f32,
    pub mixed: f32,
}

/// Result of a single sentiment detection call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SentimentDetection {
    pub label: SentimentLabel,
    pub scores: SentimentScores,
}

/// Client for a hosted NLP service.
#[async_trait]
pub trait NlpService: Send + Sync {
    async fn detect_sentiment(
        &self,
        text: &str,
        language_code: &str,
    ) -> Result<SentimentDetection, AnnotationError>;

    async fn detect_key_phrases(
        &self,
        text: &str,
        language_code: &str,
    ) -> Result<Vec<String>, AnnotationError>;
}
