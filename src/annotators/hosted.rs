use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use super::{KeywordExtractor, Keywords, Sentiment, SentimentAnalyzer};
use crate::error::{AnnotationError, ServiceErrorKind};
use crate::nlp::{NlpService, RetryPolicy};

/// Largest UTF-8 payload the hosted service accepts per call.
pub const MAX_TEXT_BYTES: usize = 5000;

/// Cuts `text` to at most [`MAX_TEXT_BYTES`] on a char boundary.
fn clip(text: &str) -> &str {
    if text.len() <= MAX_TEXT_BYTES {
        return text;
    }
    let mut end = MAX_TEXT_BYTES;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    debug!(bytes = text.len(), kept = end, "Clipping text for hosted call");
    &text[..end]
}

pub struct HostedSentiment {
    service: Arc<dyn NlpService>,
    language_code: String,
    retry: RetryPolicy,
}

impl HostedSentiment {
    pub fn new(service: Arc<dyn NlpService>, language_code: &str, retry: RetryPolicy) -> Self {
        Self {
            service,
            language_code: language_code.to_string(),
            retry,
        }
    }
}

#[async_trait]
impl SentimentAnalyzer for HostedSentiment {
    async fn analyze(&self, text: &str) -> Result<Sentiment, AnnotationError> {
        // The service rejects empty input, and no label can stand in for one.
        if text.trim().is_empty() {
            return Err(AnnotationError::new(
                ServiceErrorKind::Rejected,
                "empty text has no sentiment",
            ));
        }

        let text = clip(text);
        let detection = self
            .retry
            .run("detect_sentiment", || {
                self.service.detect_sentiment(text, &self.language_code)
            })
            .await?;

        Ok(Sentiment::Label {
            label: detection.label,
            scores: detection.scores,
        })
    }
}

pub struct HostedKeyPhrases {
    service: Arc<dyn NlpService>,
    language_code: String,
    retry: RetryPolicy,
}

impl HostedKeyPhrases {
    pub fn new(service: Arc<dyn NlpService>, language_code: &str, retry: RetryPolicy) -> Self {
        Self {
            service,
            language_code: language_code.to_string(),
            retry,
        }
    }
}

#[async_trait]
impl KeywordExtractor for HostedKeyPhrases {
    async fn extract(&self, text: &str) -> Result<Keywords, AnnotationError> {
        if text.trim().is_empty() {
            return Ok(Keywords::Phrases(Vec::new()));
        }

        let text = clip(text);
        let phrases = self
            .retry
            .run("detect_key_phrases", || {
                self.service.detect_key_phrases(text, &self.language_code)
            })
            .await?;

        Ok(Keywords::Phrases(phrases))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nlp::{SentimentDetection, SentimentLabel, SentimentScores};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Fails the first `failures` calls with `kind`, then answers.
    struct Flaky {
        failures: Mutex<u32>,
        kind: ServiceErrorKind,
        seen: Mutex<Vec<String>>,
    }

    impl Flaky {
        fn new(failures: u32, kind: ServiceErrorKind) -> Self {
            Self {
                failures: Mutex::new(failures),
                kind,
                seen: Mutex::new(Vec::new()),
            }
        }

        fn fail_once_more(&self) -> Result<(), AnnotationError> {
            let mut left = self.failures.lock().unwrap();
            if *left > 0 {
                *left -= 1;
                return Err(AnnotationError::new(self.kind, "injected"));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl NlpService for Flaky {
        async fn detect_sentiment(
            &self,
            text: &str,
            language_code: &str,
        ) -> Result<SentimentDetection, AnnotationError> {
            assert_eq!(language_code, "en");
            self.seen.lock().unwrap().push(text.to_string());
            self.fail_once_more()?;
            Ok(SentimentDetection {
                label: SentimentLabel::Mixed,
                scores: SentimentScores {
                    mixed: 0.9,
                    ..SentimentScores::default()
                },
            })
        }

        async fn detect_key_phrases(
            &self,
            text: &str,
            _language_code: &str,
        ) -> Result<Vec<String>, AnnotationError> {
            self.seen.lock().unwrap().push(text.to_string());
            self.fail_once_more()?;
            Ok(vec!["the food".into(), "slow service".into()])
        }
    }

    fn retry(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(1),
            ..RetryPolicy::default()
        }
    }

    #[tokio::test]
    async fn test_sentiment_retries_then_reports_label() {
        let service = Arc::new(Flaky::new(1, ServiceErrorKind::RateLimited));
        let analyzer = HostedSentiment::new(service.clone(), "en", retry(3));
        let sentiment = analyzer.analyze("Mixed feelings").await.unwrap();
        assert!(matches!(
            sentiment,
            Sentiment::Label { label: SentimentLabel::Mixed, .. }
        ));
        assert_eq!(service.seen.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_sentiment_surfaces_exhausted_retries() {
        let service = Arc::new(Flaky::new(5, ServiceErrorKind::Network));
        let analyzer = HostedSentiment::new(service, "en", retry(2));
        let err = analyzer.analyze("hello").await.unwrap_err();
        assert_eq!(err.kind, ServiceErrorKind::Network);
    }

    #[tokio::test]
    async fn test_empty_text_skips_service() {
        let service = Arc::new(Flaky::new(0, ServiceErrorKind::Network));
        let extractor = HostedKeyPhrases::new(service.clone(), "en", retry(1));
        assert_eq!(extractor.extract("   ").await.unwrap(), Keywords::Phrases(vec![]));
        assert!(service.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_blank_text_sentiment_is_rejected_without_a_call() {
        let service = Arc::new(Flaky::new(5, ServiceErrorKind::Network));
        let analyzer = HostedSentiment::new(service.clone(), "en", retry(3));
        let err = analyzer.analyze("  \n ").await.unwrap_err();
        assert_eq!(err.kind, ServiceErrorKind::Rejected);
        assert!(service.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_key_phrases_returned_in_service_order() {
        let service = Arc::new(Flaky::new(0, ServiceErrorKind::Network));
        let extractor = HostedKeyPhrases::new(service, "en", retry(1));
        let keywords = extractor.extract("The food was good but slow service").await.unwrap();
        assert_eq!(keywords.to_flat(), "the food slow service");
    }

    #[test]
    fn test_clip_respects_char_boundaries() {
        let long = "é".repeat(MAX_TEXT_BYTES);
        let clipped = clip(&long);
        assert!(clipped.len() <= MAX_TEXT_BYTES);
        assert!(clipped.chars().all(|c| c == 'é'));
        assert_eq!(clip("short"), "short");
    }
}
