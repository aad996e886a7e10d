//! Polarity lexicon for the offline sentiment scorer.
//!
//! Values are averaged per matched word, so a single entry's magnitude is
//! its full contribution when it is the only opinion word in a text.

use std::collections::HashMap;
use std::sync::LazyLock;

static POLARITY: &[(&str, f64)] = &[
    // positive
    ("amazing", 0.6),
    ("awesome", 1.0),
    ("beautiful", 0.85),
    ("best", 1.0),
    ("better", 0.5),
    ("clean", 0.37),
    ("comfortable", 0.4),
    ("cool", 0.35),
    ("cozy", 0.5),
    ("crispy", 0.3),
    ("decent", 0.17),
    ("delicious", 1.0),
    ("delightful", 1.0),
    ("enjoy", 0.4),
    ("enjoyed", 0.4),
    ("excellent", 1.0),
    ("fabulous", 0.4),
    ("fantastic", 0.4),
    ("fast", 0.2),
    ("fine", 0.42),
    ("fluffy", 0.3),
    ("fresh", 0.3),
    ("friendly", 0.38),
    ("fun", 0.3),
    ("generous", 0.5),
    ("glad", 0.5),
    ("good", 0.7),
    ("great", 0.8),
    ("happy", 0.8),
    ("helpful", 0.5),
    ("hot", 0.25),
    ("impressed", 1.0),
    ("incredible", 0.9),
    ("love", 0.5),
    ("loved", 0.7),
    ("lovely", 0.5),
    ("nice", 0.6),
    ("perfect", 1.0),
    ("pleasant", 0.73),
    ("polite", 0.3),
    ("quick", 0.33),
    ("recommend", 0.4),
    ("reasonable", 0.2),
    ("satisfied", 0.5),
    ("superb", 1.0),
    ("sweet", 0.35),
    ("tasty", 0.6),
    ("warm", 0.6),
    ("welcoming", 0.5),
    ("wonderful", 1.0),
    ("worth", 0.3),
    ("yummy", 0.8),
    // negative
    ("angry", -0.5),
    ("annoyed", -0.4),
    ("awful", -1.0),
    ("bad", -0.7),
    ("bland", -0.5),
    ("broken", -0.4),
    ("burnt", -0.5),
    ("cold", -0.6),
    ("crowded", -0.3),
    ("disappointed", -0.75),
    ("disappointing", -0.6),
    ("disgusting", -1.0),
    ("dirty", -0.6),
    ("dry", -0.3),
    ("expensive", -0.5),
    ("gross", -0.8),
    ("hate", -0.8),
    ("horrible", -1.0),
    ("ignored", -0.4),
    ("inattentive", -0.5),
    ("lukewarm", -0.3),
    ("mediocre", -0.5),
    ("messy", -0.4),
    ("nasty", -1.0),
    ("overpriced", -0.6),
    ("poor", -0.4),
    ("rude", -0.3),
    ("sad", -0.5),
    ("slow", -0.3),
    ("soggy", -0.5),
    ("sticky", -0.3),
    ("stale", -0.5),
    ("sorry", -0.5),
    ("terrible", -1.0),
    ("unfriendly", -0.5),
    ("unprofessional", -0.6),
    ("upset", -0.5),
    ("wait", -0.1),
    ("worse", -0.4),
    ("worst", -1.0),
    ("wrong", -0.5),
];

static INTENSIFIERS: &[(&str, f64)] = &[
    ("absolutely", 1.5),
    ("extremely", 1.5),
    ("incredibly", 1.4),
    ("really", 1.2),
    ("so", 1.3),
    ("super", 1.3),
    ("too", 1.2),
    ("totally", 1.3),
    ("very", 1.3),
    ("quite", 1.1),
];

static NEGATIONS: &[&str] = &["not", "n't", "never", "no", "nothing", "hardly", "barely"];

static POLARITY_INDEX: LazyLock<HashMap<&'static str, f64>> =
    LazyLock::new(|| POLARITY.iter().copied().collect());

static INTENSIFIER_INDEX: LazyLock<HashMap<&'static str, f64>> =
    LazyLock::new(|| INTENSIFIERS.iter().copied().collect());

/// Polarity of a lower-cased word, if it carries any.
pub fn polarity(word: &str) -> Option<f64> {
    POLARITY_INDEX.get(word).copied()
}

/// Multiplier applied to the next opinion word.
pub fn intensity(word: &str) -> Option<f64> {
    INTENSIFIER_INDEX.get(word).copied()
}

pub fn is_negation(word: &str) -> bool {
    NEGATIONS.contains(&word)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_polarity_is_in_range() {
        for (word, p) in POLARITY {
            assert!((-1.0..=1.0).contains(p), "{word} out of range");
        }
    }

    #[test]
    fn test_lookups() {
        assert_eq!(polarity("good"), Some(0.7));
        assert_eq!(polarity("table"), None);
        assert_eq!(intensity("very"), Some(1.3));
        assert!(is_negation("n't"));
        assert!(!is_negation("yes"));
    }
}
