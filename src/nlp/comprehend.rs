use async_trait::async_trait;
use aws_credential_types::provider::ProvideCredentials;
use aws_sdk_comprehend::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_comprehend::types::LanguageCode;
use std::time::Duration;
use tracing::{debug, info};

use super::{NlpService, SentimentDetection, SentimentLabel, SentimentScores};
use crate::error::{AnnotationError, ServiceErrorKind};

/// [`NlpService`] backed by AWS Comprehend `DetectSentiment` and
/// `DetectKeyPhrases`.
pub struct ComprehendService {
    client: aws_sdk_comprehend::Client,
}

impl ComprehendService {
    /// Creates a client from an already loaded AWS configuration.
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: aws_sdk_comprehend::Client::new(config),
        }
    }

    /// Loads AWS configuration from the environment and verifies that a
    /// region is set and credentials resolve within `probe_timeout`.
    pub async fn from_env(probe_timeout: Duration) -> Result<Self, AnnotationError> {
        let config = aws_config::load_from_env().await;

        let region = config.region().ok_or_else(|| {
            AnnotationError::new(
                ServiceErrorKind::Auth,
                "no AWS region configured (set AWS_REGION or a profile region)",
            )
        })?;

        let provider = config.credentials_provider().ok_or_else(|| {
            AnnotationError::new(ServiceErrorKind::Auth, "no AWS credentials provider configured")
        })?;

        match tokio::time::timeout(probe_timeout, provider.provide_credentials()).await {
            Err(_) => {
                return Err(AnnotationError::new(
                    ServiceErrorKind::Network,
                    format!(
                        "timed out after {}s resolving AWS credentials",
                        probe_timeout.as_secs()
                    ),
                ));
            }
            Ok(Err(e)) => {
                return Err(AnnotationError::new(
                    ServiceErrorKind::Auth,
                    format!("could not resolve AWS credentials: {}", DisplayErrorContext(&e)),
                ));
            }
            Ok(Ok(_)) => {}
        }

        info!(region = %region, "Comprehend client ready");
        Ok(Self::new(&config))
    }
}

#[async_trait]
impl NlpService for ComprehendService {
    async fn detect_sentiment(
        &self,
        text: &str,
        language_code: &str,
    ) -> Result<SentimentDetection, AnnotationError> {
        let out = self
            .client
            .detect_sentiment()
            .text(text)
            .language_code(LanguageCode::from(language_code))
            .send()
            .await
            .map_err(classify_sdk_error)?;

        let raw_label = out
            .sentiment()
            .ok_or_else(|| malformed("DetectSentiment response has no Sentiment"))?;
        let label = SentimentLabel::parse(raw_label.as_str())
            .ok_or_else(|| malformed(format!("unknown sentiment label '{}'", raw_label.as_str())))?;

        let score = out
            .sentiment_score()
            .ok_or_else(|| malformed("DetectSentiment response has no SentimentScore"))?;

        let scores = SentimentScores {
            positive: score.positive().unwrap_or_default(),
            negative: score.negative().unwrap_or_default(),
            neutral: score.neutral().unwrap_or_default(),
            mixed: score.mixed().unwrap_or_default(),
        };

        debug!(label = label.as_str(), "Sentiment detected");
        Ok(SentimentDetection { label, scores })
    }

    async fn detect_key_phrases(
        &self,
        text: &str,
        language_code: &str,
    ) -> Result<Vec<String>, AnnotationError> {
        let out = self
            .client
            .detect_key_phrases()
            .text(text)
            .language_code(LanguageCode::from(language_code))
            .send()
            .await
            .map_err(classify_sdk_error)?;

        let phrases: Vec<String> = out
            .key_phrases()
            .iter()
            .filter_map(|p| p.text().map(str::to_string))
            .collect();

        debug!(count = phrases.len(), "Key phrases detected");
        Ok(phrases)
    }
}

fn malformed(message: impl Into<String>) -> AnnotationError {
    AnnotationError::new(ServiceErrorKind::MalformedResponse, message)
}

fn classify_sdk_error<E, R>(err: SdkError<E, R>) -> AnnotationError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    R: std::fmt::Debug,
{
    let kind = match &err {
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) => ServiceErrorKind::Network,
        SdkError::ResponseError(_) => ServiceErrorKind::MalformedResponse,
        SdkError::ConstructionFailure(_) => ServiceErrorKind::Rejected,
        SdkError::ServiceError(ctx) => kind_for_code(ctx.err().code()),
        _ => ServiceErrorKind::Unavailable,
    };
    AnnotationError::new(kind, DisplayErrorContext(&err).to_string())
}

/// Maps a Comprehend error code onto our error kinds.
fn kind_for_code(code: Option<&str>) -> ServiceErrorKind {
    match code {
        Some("ThrottlingException" | "TooManyRequestsException") => ServiceErrorKind::RateLimited,
        Some(
            "UnrecognizedClientException"
            | "AccessDeniedException"
            | "InvalidSignatureException"
            | "ExpiredTokenException"
            | "InvalidClientTokenId",
        ) => ServiceErrorKind::Auth,
        Some(
            "TextSizeLimitExceededException"
            | "UnsupportedLanguageException"
            | "InvalidRequestException",
        ) => ServiceErrorKind::Rejected,
        _ => ServiceErrorKind::Unavailable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_for_code() {
        assert_eq!(
            kind_for_code(Some("ThrottlingException")),
            ServiceErrorKind::RateLimited
        );
        assert_eq!(
            kind_for_code(Some("ExpiredTokenException")),
            ServiceErrorKind::Auth
        );
        assert_eq!(
            kind_for_code(Some("TextSizeLimitExceededException")),
            ServiceErrorKind::Rejected
        );
        assert_eq!(
            kind_for_code(Some("InternalServerException")),
            ServiceErrorKind::Unavailable
        );
        assert_eq!(kind_for_code(None), ServiceErrorKind::Unavailable);
    }
}
