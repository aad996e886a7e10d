use async_trait::async_trait;

use super::lexicon::{intensity, is_negation, polarity};
use super::tagger::{tag, tokenize};
use super::{KeywordExtractor, Keywords, Sentiment, SentimentAnalyzer};
use crate::error::AnnotationError;

/// Factor applied to an opinion word that follows a negation.
const NEGATION_FACTOR: f64 = -0.5;

/// Offline lexicon polarity scorer. Deterministic; never fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct LexicalSentiment;

impl LexicalSentiment {
    pub fn new() -> Self {
        Self
    }

    /// Mean polarity of the opinion words in `text`, clamped to `[-1, 1]`.
    /// Text without opinion words (including empty text) scores `0.0`.
    pub fn score(&self, text: &str) -> f64 {
        let mut values = Vec::new();
        let mut boost = 1.0;
        let mut negated = false;

        for token in tokenize(text) {
            let word = token.to_lowercase();

            if !word.chars().any(char::is_alphanumeric) {
                boost = 1.0;
                negated = false;
                continue;
            }
            if is_negation(&word) {
                negated = true;
                continue;
            }
            if let Some(factor) = intensity(&word) {
                boost *= factor;
                continue;
            }
            match polarity(&word) {
                Some(p) => {
                    let mut v = p * boost;
                    if negated {
                        v *= NEGATION_FACTOR;
                    }
                    values.push(v.clamp(-1.0, 1.0));
                    boost = 1.0;
                    negated = false;
                }
                None => boost = 1.0,
            }
        }

        if values.is_empty() {
            return 0.0;
        }
        (values.iter().sum::<f64>() / values.len() as f64).clamp(-1.0, 1.0)
    }
}

#[async_trait]
impl SentimentAnalyzer for LexicalSentiment {
    async fn analyze(&self, text: &str) -> Result<Sentiment, AnnotationError> {
        Ok(Sentiment::Polarity(self.score(text)))
    }
}

/// Keywords as every noun followed by every adjective, in text order.
#[derive(Debug, Default, Clone, Copy)]
pub struct LexicalKeywords;

impl LexicalKeywords {
    pub fn new() -> Self {
        Self
    }

    /// Nouns and adjectives of `text`, each list in original order.
    pub fn nouns_and_adjectives(&self, text: &str) -> (Vec<String>, Vec<String>) {
        let mut nouns = Vec::new();
        let mut adjectives = Vec::new();

        for (word, t) in tag(text) {
            if t.is_noun() {
                nouns.push(word);
            } else if t.is_adjective() {
                adjectives.push(word);
            }
        }

        (nouns, adjectives)
    }

    pub fn keywords(&self, text: &str) -> String {
        let (nouns, adjectives) = self.nouns_and_adjectives(text);
        Keywords::Terms { nouns, adjectives }.to_flat()
    }
}

#[async_trait]
impl KeywordExtractor for LexicalKeywords {
    async fn extract(&self, text: &str) -> Result<Keywords, AnnotationError> {
        let (nouns, adjectives) = self.nouns_and_adjectives(text);
        Ok(Keywords::Terms { nouns, adjectives })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text_is_exactly_neutral() {
        let s = LexicalSentiment::new();
        assert_eq!(s.score(""), 0.0);
        assert_eq!(s.score("   \t "), 0.0);
        assert_eq!(s.score("We sat at a table."), 0.0);
    }

    #[test]
    fn test_polarity_direction() {
        let s = LexicalSentiment::new();
        assert!(s.score("The food was great and the staff friendly") > 0.0);
        assert!(s.score("Terrible service, cold eggs") < 0.0);
    }

    #[test]
    fn test_negation_flips_and_dampens() {
        let s = LexicalSentiment::new();
        let plain = s.score("good");
        let negated = s.score("not good");
        assert!(negated < 0.0);
        assert!(negated.abs() < plain);
        assert!(s.score("The eggs weren't bad") > 0.0);
    }

    #[test]
    fn test_intensifier_is_clamped() {
        let s = LexicalSentiment::new();
        assert_eq!(s.score("absolutely extremely perfect"), 1.0);
        assert!(s.score("very good") > s.score("good"));
    }

    #[test]
    fn test_scores_stay_in_range() {
        let s = LexicalSentiment::new();
        let samples = [
            "worst worst worst!!!",
            "best best best",
            "Not terrible, not great. Really, really awful coffee though.",
            "so so so so so so so good",
            "never never never bad",
        ];
        for text in samples {
            let v = s.score(text);
            assert!((-1.0..=1.0).contains(&v), "{text} -> {v}");
        }
    }

    #[test]
    fn test_keywords_nouns_then_adjectives() {
        let k = LexicalKeywords::new();
        let (nouns, adjectives) = k.nouns_and_adjectives("The fluffy pancakes were amazing");
        assert_eq!(nouns, vec!["pancakes"]);
        assert_eq!(adjectives, vec!["fluffy", "amazing"]);
        assert_eq!(k.keywords("The fluffy pancakes were amazing"), "pancakes fluffy amazing");
    }

    #[test]
    fn test_keywords_keep_duplicates_and_order() {
        let k = LexicalKeywords::new();
        assert_eq!(
            k.keywords("Good coffee, good toast. Bad service."),
            "coffee toast service Good good Bad"
        );
    }

    #[test]
    fn test_auxiliaries_are_not_keywords() {
        let k = LexicalKeywords::new();
        let nouns = |text: &str| k.nouns_and_adjectives(text).0;
        assert!(nouns("I think that was great").is_empty());
        assert_eq!(nouns("It's been a long wait"), vec!["wait"]);
        assert!(nouns("The other two were cold").is_empty());
        assert!(nouns("All were cold").is_empty());
        assert_eq!(k.keywords("All were cold"), "cold");
    }

    #[tokio::test]
    async fn test_extract_keeps_nouns_and_adjectives_apart() {
        let keywords = LexicalKeywords::new()
            .extract("The fluffy pancakes were amazing")
            .await
            .unwrap();
        assert_eq!(
            keywords,
            Keywords::Terms {
                nouns: vec!["pancakes".into()],
                adjectives: vec!["fluffy".into(), "amazing".into()],
            }
        );
    }

    #[test]
    fn test_keywords_empty_text() {
        assert_eq!(LexicalKeywords::new().keywords(""), "");
    }
}
