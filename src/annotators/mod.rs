//! Per-record sentiment and keyword annotation.
//!
//! Both concerns are capability traits with a lexical (offline) and a hosted
//! implementation. [`Annotators`] bundles one of each, chosen by
//! [`AnnotationMode`].

mod hosted;
mod lexical;
mod lexicon;
pub mod tagger;

pub use hosted::{HostedKeyPhrases, HostedSentiment};
pub use lexical::{LexicalKeywords, LexicalSentiment};

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::AnnotationMode;
use crate::error::AnnotationError;
use crate::nlp::{NlpService, RetryPolicy, SentimentLabel, SentimentScores};

/// Sentiment attached to a record.
#[derive(Debug, Clone, PartialEq)]
pub enum Sentiment {
    /// Polarity in `[-1.0, 1.0]`.
    Polarity(f64),
    /// Hosted label with per-category scores.
    Label {
        label: SentimentLabel,
        scores: SentimentScores,
    },
}

impl Sentiment {
    fn cells(&self) -> Vec<String> {
        match self {
            Sentiment::Polarity(p) => vec![p.to_string()],
            Sentiment::Label { label, scores } => vec![
                label.as_str().to_string(),
                serde_json::to_string(scores).unwrap_or_default(),
            ],
        }
    }
}

/// Keywords attached to a record.
#[derive(Debug, Clone, PartialEq)]
pub enum Keywords {
    /// Nouns and adjectives, each in text order.
    Terms {
        nouns: Vec<String>,
        adjectives: Vec<String>,
    },
    /// Key phrases as returned by the hosted service.
    Phrases(Vec<String>),
}

impl Keywords {
    /// Flat text form: nouns then adjectives, or the flattened phrases.
    pub fn to_flat(&self) -> String {
        match self {
            Keywords::Terms { nouns, adjectives } => {
                let mut words: Vec<&str> = nouns.iter().map(String::as_str).collect();
                words.extend(adjectives.iter().map(String::as_str));
                words.join(" ")
            }
            Keywords::Phrases(phrases) => flatten_phrases(phrases),
        }
    }

    fn cells(&self) -> Vec<String> {
        match self {
            Keywords::Terms { nouns, adjectives } => {
                vec![nouns.join(" "), adjectives.join(" "), self.to_flat()]
            }
            Keywords::Phrases(_) => vec![self.to_flat()],
        }
    }
}

/// Joins phrases with spaces and drops list decoration characters.
pub fn flatten_phrases(phrases: &[String]) -> String {
    phrases
        .join(" ")
        .chars()
        .filter(|c| !matches!(c, '[' | ']' | ',' | '\''))
        .collect()
}

#[async_trait]
pub trait SentimentAnalyzer: Send + Sync {
    async fn analyze(&self, text: &str) -> Result<Sentiment, AnnotationError>;
}

#[async_trait]
pub trait KeywordExtractor: Send + Sync {
    async fn extract(&self, text: &str) -> Result<Keywords, AnnotationError>;
}

/// Sentiment and keywords for one record.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub sentiment: Sentiment,
    pub keywords: Keywords,
}

impl Annotation {
    /// Extra cells appended to the joined row, matching [`Annotators::headers`].
    pub fn cells(&self) -> Vec<String> {
        let mut cells = self.sentiment.cells();
        cells.extend(self.keywords.cells());
        cells
    }
}

/// The pair of annotators used for a run.
#[derive(Clone)]
pub struct Annotators {
    mode: AnnotationMode,
    sentiment: Arc<dyn SentimentAnalyzer>,
    keywords: Arc<dyn KeywordExtractor>,
}

impl Annotators {
    pub fn new(
        mode: AnnotationMode,
        sentiment: Arc<dyn SentimentAnalyzer>,
        keywords: Arc<dyn KeywordExtractor>,
    ) -> Self {
        Self {
            mode,
            sentiment,
            keywords,
        }
    }

    /// Offline lexicon sentiment and noun/adjective keywords.
    pub fn lexical() -> Self {
        Self::new(
            AnnotationMode::Lexical,
            Arc::new(LexicalSentiment::new()),
            Arc::new(LexicalKeywords::new()),
        )
    }

    /// Hosted sentiment and key phrases through `service`.
    pub fn hosted(service: Arc<dyn NlpService>, language_code: &str, retry: RetryPolicy) -> Self {
        Self::new(
            AnnotationMode::Hosted,
            Arc::new(HostedSentiment::new(
                Arc::clone(&service),
                language_code,
                retry.clone(),
            )),
            Arc::new(HostedKeyPhrases::new(service, language_code, retry)),
        )
    }

    pub fn mode(&self) -> AnnotationMode {
        self.mode
    }

    /// Output columns added by this mode.
    pub fn headers(&self) -> &'static [&'static str] {
        match self.mode {
            AnnotationMode::Lexical => &["sentiment", "nouns", "adjectives", "keywords"],
            AnnotationMode::Hosted => &["Sentiment", "SentimentScore", "KeyPhrases"],
        }
    }

    /// Computes sentiment, then keywords, for one text.
    pub async fn annotate(&self, text: &str) -> Result<Annotation, AnnotationError> {
        let sentiment = self.sentiment.analyze(text).await?;
        let keywords = self.keywords.extract(text).await?;
        Ok(Annotation {
            sentiment,
            keywords,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flatten_phrases_strips_list_decoration() {
        let phrases = vec!["the pancakes".to_string(), "Bob's, diner".to_string(), "[x]".to_string()];
        assert_eq!(flatten_phrases(&phrases), "the pancakes Bobs diner x");
        assert_eq!(flatten_phrases(&[]), "");
    }

    #[test]
    fn test_cells_match_header_width() {
        let lexical = Annotation {
            sentiment: Sentiment::Polarity(0.5),
            keywords: Keywords::Terms {
                nouns: vec!["pancakes".into(), "coffee".into()],
                adjectives: vec!["fluffy".into()],
            },
        };
        assert_eq!(
            lexical.cells(),
            vec!["0.5", "pancakes coffee", "fluffy", "pancakes coffee fluffy"]
        );
        assert_eq!(lexical.cells().len(), Annotators::lexical().headers().len());

        let hosted = Annotation {
            sentiment: Sentiment::Label {
                label: SentimentLabel::Positive,
                scores: SentimentScores::default(),
            },
            keywords: Keywords::Phrases(vec!["good food".into()]),
        };
        let cells = hosted.cells();
        assert_eq!(cells.len(), 3);
        assert_eq!(cells[0], "POSITIVE");
        assert!(cells[1].starts_with("{\"Positive\""));
        assert_eq!(cells[2], "good food");
    }

    #[tokio::test]
    async fn test_lexical_annotators_end_to_end() {
        let annotators = Annotators::lexical();
        assert_eq!(annotators.mode(), AnnotationMode::Lexical);
        let annotation = annotators
            .annotate("The fluffy pancakes were amazing")
            .await
            .unwrap();
        match annotation.sentiment {
            Sentiment::Polarity(p) => assert!(p > 0.0),
            other => panic!("unexpected sentiment {other:?}"),
        }
        assert_eq!(annotation.keywords.to_flat(), "pancakes fluffy amazing");
    }
}
