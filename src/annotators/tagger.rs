//! Rule-based part-of-speech tagger.
//!
//! Tags follow the Penn Treebank set. A closed-class lexicon covers function
//! words and frequent review vocabulary; unknown words fall back to suffix
//! rules, then a few contextual corrections run over the whole sentence.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

/// Penn Treebank tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Nn,
    Nns,
    Nnp,
    Nnps,
    Jj,
    Jjr,
    Jjs,
    Vb,
    Vbd,
    Vbg,
    Vbn,
    Vbp,
    Vbz,
    Rb,
    Dt,
    In,
    Prp,
    PrpPossessive,
    Cc,
    Md,
    To,
    Cd,
    Uh,
    Wh,
    Ex,
    Pos,
    Punct,
}

impl Tag {
    pub fn penn(&self) -> &'static str {
        match self {
            Tag::Nn => "NN",
            Tag::Nns => "NNS",
            Tag::Nnp => "NNP",
            Tag::Nnps => "NNPS",
            Tag::Jj => "JJ",
            Tag::Jjr => "JJR",
            Tag::Jjs => "JJS",
            Tag::Vb => "VB",
            Tag::Vbd => "VBD",
            Tag::Vbg => "VBG",
            Tag::Vbn => "VBN",
            Tag::Vbp => "VBP",
            Tag::Vbz => "VBZ",
            Tag::Rb => "RB",
            Tag::Dt => "DT",
            Tag::In => "IN",
            Tag::Prp => "PRP",
            Tag::PrpPossessive => "PRP$",
            Tag::Cc => "CC",
            Tag::Md => "MD",
            Tag::To => "TO",
            Tag::Cd => "CD",
            Tag::Uh => "UH",
            Tag::Wh => "WP",
            Tag::Ex => "EX",
            Tag::Pos => "POS",
            Tag::Punct => ".",
        }
    }

    /// Any noun subtype (`NN*`).
    pub fn is_noun(&self) -> bool {
        self.penn().starts_with("NN")
    }

    /// Any adjective subtype (`JJ*`).
    pub fn is_adjective(&self) -> bool {
        self.penn().starts_with("JJ")
    }

    fn is_verb(&self) -> bool {
        self.penn().starts_with("VB")
    }

    fn opens_noun_phrase(&self) -> bool {
        matches!(
            self,
            Tag::Dt | Tag::PrpPossessive | Tag::Jj | Tag::Jjr | Tag::Jjs | Tag::Cd | Tag::Pos
        )
    }
}

/// Word groups by tag. A word listed under several tags takes the first.
const GROUPS: &[(Tag, &[&str])] = &[
    (
        Tag::Dt,
        &[
            "a", "an", "the", "this", "that", "these", "those", "every", "each", "some",
            "any", "all", "both", "another", "either", "neither", "no", "half",
        ],
    ),
    (
        Tag::In,
        &[
            "in", "on", "at", "of", "for", "with", "from", "by", "about", "into", "over",
            "after", "before", "during", "under", "between", "through", "since", "until",
            "because", "if", "while", "than", "like", "around", "without", "against",
            "near", "behind", "upon", "though", "although", "whether", "as", "per",
        ],
    ),
    (
        Tag::Prp,
        &[
            "i", "you", "he", "she", "it", "we", "they", "me", "him", "us", "them",
            "myself", "yourself", "himself", "herself", "itself", "ourselves",
            "themselves",
        ],
    ),
    (
        Tag::PrpPossessive,
        &["my", "your", "his", "her", "its", "our", "their"],
    ),
    (Tag::Cc, &["and", "or", "but", "nor", "yet", "plus"]),
    (
        Tag::Md,
        &["can", "could", "will", "would", "shall", "should", "may", "might", "must", "ca", "wo"],
    ),
    (Tag::To, &["to"]),
    (Tag::Ex, &["there"]),
    (Tag::Pos, &["'s"]),
    (
        Tag::Wh,
        &["who", "what", "which", "whom", "whose", "where", "when", "why", "how"],
    ),
    (Tag::Uh, &["oh", "wow", "yes", "ok", "okay", "please", "yeah", "hey"]),
    (
        Tag::Cd,
        &[
            "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
            "twenty", "thirty", "hundred",
        ],
    ),
    (
        Tag::Rb,
        &[
            "not", "n't", "never", "very", "really", "so", "too", "also", "just", "only",
            "always", "often", "again", "still", "even", "here", "now", "then", "quite",
            "almost", "already", "ever", "soon", "back", "out", "up", "down", "off",
            "away", "well", "maybe", "probably", "definitely", "extremely", "super",
            "pretty", "rather", "once", "twice", "instead", "together", "enough",
            "absolutely", "totally", "incredibly", "barely", "hardly", "later",
        ],
    ),
    (
        Tag::Vbz,
        &["is", "has", "does", "'s", "seems", "looks", "tastes", "comes", "gets", "goes"],
    ),
    (Tag::Vbp, &["are", "am", "have", "do", "'re", "'m", "'ve"]),
    (
        Tag::Vbd,
        &[
            "was", "were", "had", "did", "came", "went", "got", "took", "said", "told",
            "ate", "asked", "ordered", "waited", "seemed", "looked", "tasted", "brought",
            "gave", "left", "made", "felt", "paid", "sat", "served", "arrived", "walked",
            "tried", "wanted", "needed", "received", "returned", "forgot", "stopped",
        ],
    ),
    (Tag::Vbn, &["been", "done", "gone", "seen", "eaten", "given", "taken"]),
    (Tag::Vbg, &["being", "having", "going", "doing", "waiting", "eating"]),
    (
        Tag::Vb,
        &[
            "be", "go", "get", "come", "eat", "try", "make", "take", "give", "say", "see",
            "know", "want", "need", "recommend", "return", "order", "wait", "pay",
        ],
    ),
    (
        Tag::Jjr,
        &["better", "worse", "bigger", "smaller", "faster", "slower", "cheaper", "more", "less"],
    ),
    (
        Tag::Jjs,
        &["best", "worst", "biggest", "fastest", "cheapest", "most", "least"],
    ),
    (
        Tag::Jj,
        &[
            "good", "great", "bad", "nice", "amazing", "awesome", "fluffy", "delicious",
            "tasty", "hot", "cold", "warm", "fresh", "friendly", "rude", "slow", "quick",
            "fast", "clean", "dirty", "terrible", "horrible", "awful", "excellent",
            "perfect", "wonderful", "fantastic", "new", "old", "big", "small", "little",
            "large", "long", "short", "happy", "sad", "sure", "free", "full", "empty",
            "busy", "crowded", "fine", "decent", "mediocre", "bland", "soggy", "crispy",
            "dry", "sweet", "sticky", "greasy", "cheap", "expensive", "first", "last",
            "next", "other", "same", "only", "own", "many", "few", "much", "several",
            "whole", "entire", "real", "high", "low", "late", "early", "poor", "yummy",
            "lukewarm", "stale", "burnt", "nasty", "gross", "incredible", "superb",
            "pleasant", "lovely", "cozy", "polite", "overpriced", "wrong", "right",
            "ready", "sorry", "glad", "disappointed", "disappointing", "impressed",
            "satisfied", "upset", "attentive", "inattentive", "unprofessional", "unfriendly",
            "welcoming", "disgusting", "messy", "beautiful", "delightful", "fabulous",
            "generous", "reasonable", "worth", "fun", "cool", "comfortable", "helpful",
        ],
    ),
    (
        Tag::Nn,
        &[
            "food", "service", "place", "time", "waitress", "waiter", "server", "staff",
            "manager", "coffee", "breakfast", "lunch", "dinner", "meal", "table", "order",
            "restaurant", "location", "experience", "bacon", "toast", "syrup", "butter",
            "menu", "price", "check", "bill", "night", "morning", "day", "minute", "hour",
            "wait", "water", "juice", "tea", "omelette", "omelet", "sausage", "ham",
            "cheese", "chicken", "steak", "burger", "salad", "soup", "dessert",
            "atmosphere", "parking", "lot", "kitchen", "cook", "customer", "bathroom",
            "floor", "people", "family", "friend", "husband", "wife", "son", "daughter",
            "kid", "plate", "fork", "cup", "booth", "counter", "host", "hostess", "door",
            "stack", "potato", "hash", "egg", "crepe", "waffle", "biscuit", "gravy",
            "refill", "tip", "visit", "quality", "value", "money", "way", "thing", "lot",
        ],
    ),
    (
        Tag::Nns,
        &[
            "pancakes", "eggs", "waffles", "crepes", "potatoes", "hashbrowns", "browns",
            "fries", "prices", "people", "minutes", "hours", "times", "servers", "staff",
            "tables", "customers", "kids", "friends", "plates", "drinks", "refills",
            "reviews", "years", "days", "items", "options", "portions",
        ],
    ),
];

static LEXICON: LazyLock<HashMap<&'static str, Tag>> = LazyLock::new(|| {
    let mut map = HashMap::new();
    for (tag, words) in GROUPS {
        for word in *words {
            map.entry(*word).or_insert(*tag);
        }
    }
    map
});

/// Lexicon words listed both as a noun and as a verb ("order", "wait").
static NOUN_OR_VERB: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    let words_where = |pred: fn(&Tag) -> bool| -> HashSet<&'static str> {
        GROUPS
            .iter()
            .filter(|(t, _)| pred(t))
            .flat_map(|(_, words)| words.iter().copied())
            .collect()
    };
    let verbs = words_where(Tag::is_verb);
    words_where(Tag::is_noun)
        .intersection(&verbs)
        .copied()
        .collect()
});

/// Whether a verb reading of `lower` may be a noun in disguise. Closed-class
/// verbs ("was", "been", "had") never qualify.
fn may_be_noun(lower: &str) -> bool {
    !LEXICON.contains_key(lower) || NOUN_OR_VERB.contains(lower)
}

/// Splits text into word and punctuation tokens. Clitics (`n't`, `'s`,
/// `'re`, ...) become separate tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let chars: Vec<char> = text.chars().collect();

    for (i, &c) in chars.iter().enumerate() {
        let inner_joiner = (c == '\'' || c == '-' || c == '\u{2019}')
            && !current.is_empty()
            && chars.get(i + 1).is_some_and(|n| n.is_alphanumeric());

        if c.is_alphanumeric() || inner_joiner {
            current.push(if c == '\u{2019}' { '\'' } else { c });
            continue;
        }

        flush_word(&mut current, &mut tokens);
        if !c.is_whitespace() {
            tokens.push(c.to_string());
        }
    }
    flush_word(&mut current, &mut tokens);

    tokens
}

fn flush_word(current: &mut String, tokens: &mut Vec<String>) {
    if current.is_empty() {
        return;
    }
    let word = std::mem::take(current);
    let lower = word.to_lowercase();

    if lower.len() > 3 && lower.ends_with("n't") {
        let split = word.len() - 3;
        tokens.push(word[..split].to_string());
        tokens.push(word[split..].to_string());
        return;
    }

    for clitic in ["'s", "'re", "'ve", "'ll", "'m", "'d"] {
        if lower.len() > clitic.len() && lower.ends_with(clitic) {
            let split = word.len() - clitic.len();
            tokens.push(word[..split].to_string());
            tokens.push(word[split..].to_string());
            return;
        }
    }

    tokens.push(word);
}

fn is_punct(token: &str) -> bool {
    !token.chars().any(|c| c.is_alphanumeric())
}

/// Tag guess for a word absent from the lexicon.
fn guess(word: &str, lower: &str, sentence_start: bool) -> Tag {
    if lower.chars().all(|c| c.is_ascii_digit() || c == '.' || c == ',') {
        return Tag::Cd;
    }
    if !sentence_start && word.chars().next().is_some_and(char::is_uppercase) {
        return if lower.ends_with('s') { Tag::Nnps } else { Tag::Nnp };
    }
    if lower.len() > 4 && lower.ends_with("ly") {
        return Tag::Rb;
    }
    const ADJ_SUFFIXES: &[&str] = &["ous", "ful", "ive", "able", "ible", "less", "ic", "ish"];
    if lower.len() > 4 && ADJ_SUFFIXES.iter().any(|s| lower.ends_with(s)) {
        return Tag::Jj;
    }
    if lower.len() > 4 && lower.ends_with("ing") {
        return Tag::Vbg;
    }
    if lower.len() > 3 && lower.ends_with("ed") {
        return Tag::Vbd;
    }
    if lower.len() > 3
        && lower.ends_with('s')
        && !["ss", "us", "is"].iter().any(|s| lower.ends_with(s))
    {
        return Tag::Nns;
    }
    Tag::Nn
}

/// Tags every token of `text`, punctuation included.
pub fn tag(text: &str) -> Vec<(String, Tag)> {
    let tokens = tokenize(text);
    let mut tagged: Vec<(String, Tag)> = Vec::with_capacity(tokens.len());
    let mut sentence_start = true;

    for token in tokens {
        if is_punct(&token) {
            sentence_start = matches!(token.as_str(), "." | "!" | "?");
            tagged.push((token, Tag::Punct));
            continue;
        }

        let lower = token.to_lowercase();
        let tag = LEXICON
            .get(lower.as_str())
            .copied()
            .unwrap_or_else(|| guess(&token, &lower, sentence_start));
        sentence_start = false;
        tagged.push((token, tag));
    }

    apply_context_rules(&mut tagged);
    tagged
}

fn apply_context_rules(tagged: &mut [(String, Tag)]) {
    for i in 1..tagged.len() {
        let prev = tagged[i - 1].1;
        let (word, tag) = &tagged[i];
        let lower = word.to_lowercase();

        let fixed = match *tag {
            // "the order", "my wait"
            t if t.is_verb()
                && t != Tag::Vbg
                && prev.opens_noun_phrase()
                && may_be_noun(&lower) =>
            {
                if lower.ends_with('s') && t == Tag::Vbz {
                    Tag::Nns
                } else {
                    Tag::Nn
                }
            }
            // "to order", "will wait"
            Tag::Nn if matches!(prev, Tag::To | Tag::Md) => Tag::Vb,
            // "I think", "they serve"
            Tag::Nn if is_subject_pronoun(&tagged[i - 1].0) => Tag::Vbp,
            // "was served", "had eaten"
            Tag::Vbd if is_auxiliary(&tagged[i - 1].0) => Tag::Vbn,
            // "she loves"
            Tag::Nns if matches!(prev, Tag::Prp | Tag::Nnp | Tag::Wh) => Tag::Vbz,
            t => t,
        };
        tagged[i].1 = fixed;
    }
}

fn is_subject_pronoun(word: &str) -> bool {
    matches!(word.to_lowercase().as_str(), "i" | "you" | "we" | "they")
}

fn is_auxiliary(word: &str) -> bool {
    matches!(
        word.to_lowercase().as_str(),
        "was" | "were" | "is" | "are" | "be" | "been" | "being" | "had" | "has" | "have" | "get" | "got"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags_of(text: &str) -> Vec<(String, &'static str)> {
        tag(text).into_iter().map(|(w, t)| (w, t.penn())).collect()
    }

    #[test]
    fn test_tokenize_splits_punctuation_and_clitics() {
        assert_eq!(
            tokenize("We didn't love it. It's ok!"),
            vec!["We", "did", "n't", "love", "it", ".", "It", "'s", "ok", "!"]
        );
        assert!(tokenize("").is_empty());
        assert_eq!(tokenize("  \n "), Vec::<String>::new());
    }

    #[test]
    fn test_tokenize_keeps_hyphenated_words() {
        assert_eq!(tokenize("a well-made omelette"), vec!["a", "well-made", "omelette"]);
    }

    #[test]
    fn test_tag_sample_sentence() {
        let tagged = tags_of("The fluffy pancakes were amazing");
        assert_eq!(
            tagged,
            vec![
                ("The".to_string(), "DT"),
                ("fluffy".to_string(), "JJ"),
                ("pancakes".to_string(), "NNS"),
                ("were".to_string(), "VBD"),
                ("amazing".to_string(), "JJ"),
            ]
        );
    }

    #[test]
    fn test_unknown_word_suffix_rules() {
        assert_eq!(guess("gorgeous", "gorgeous", false), Tag::Jj);
        assert_eq!(guess("quickly", "quickly", false), Tag::Rb);
        assert_eq!(guess("Tampa", "tampa", false), Tag::Nnp);
        assert_eq!(guess("Tampa", "tampa", true), Tag::Nn);
        assert_eq!(guess("blueberries", "blueberries", false), Tag::Nns);
        assert_eq!(guess("2016", "2016", false), Tag::Cd);
    }

    #[test]
    fn test_context_rules() {
        let tagged = tags_of("The wait was long and I want to order");
        assert_eq!(tagged[1], ("wait".to_string(), "NN"));
        assert_eq!(tagged[7].1, "TO");
        assert_eq!(tagged[8], ("order".to_string(), "VB"));

        let tagged = tags_of("Our food was served cold");
        assert_eq!(tagged[3], ("served".to_string(), "VBN"));
    }

    #[test]
    fn test_closed_class_verbs_stay_verbs_after_determiners() {
        let tagged = tags_of("I think that was great");
        assert_eq!(tagged[1], ("think".to_string(), "VBP"));
        assert_eq!(tagged[3], ("was".to_string(), "VBD"));

        let tagged = tags_of("It's been a long wait");
        assert_eq!(tagged[2], ("been".to_string(), "VBN"));
        assert_eq!(tagged[5], ("wait".to_string(), "NN"));

        assert_eq!(tags_of("The other two were cold")[3].1, "VBD");
        assert_eq!(tags_of("All were cold")[1].1, "VBD");
    }

    #[test]
    fn test_noun_or_verb_words() {
        assert!(NOUN_OR_VERB.contains("order"));
        assert!(NOUN_OR_VERB.contains("wait"));
        assert!(!NOUN_OR_VERB.contains("was"));
        assert!(may_be_noun("frobnicated"));
        assert!(!may_be_noun("been"));
    }

    #[test]
    fn test_noun_and_adjective_predicates() {
        assert!(Tag::Nnps.is_noun());
        assert!(Tag::Jjs.is_adjective());
        assert!(!Tag::Vbg.is_noun());
        assert!(!Tag::Rb.is_adjective());
    }
}
