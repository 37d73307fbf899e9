//! Word-list sentiment scorer.
//!
//! Counts normalized tokens that appear in a fixed positive and a fixed
//! negative word set. Pure and total: every input, including the empty
//! string, gets an answer.

use crate::core::sentiment::round_to;
use crate::core::{SentimentLabel, SentimentResult};
use serde::Serialize;
use std::collections::HashSet;

const POSITIVE_WORDS: &[&str] = &[
    "good", "great", "excellent", "amazing", "awesome", "fantastic", "wonderful", "perfect",
    "love", "like", "best", "brilliant", "outstanding", "superb", "marvelous", "incredible",
    "fabulous", "happy", "joy", "pleased", "satisfied", "delighted",
];

const NEGATIVE_WORDS: &[&str] = &[
    "bad", "terrible", "awful", "horrible", "hate", "worst", "disgusting", "pathetic",
    "useless", "disappointing", "poor", "annoying", "stupid", "ridiculous", "frustrating",
    "waste", "regret", "angry", "sad", "upset", "disappointed", "broken", "failed",
];

/// Confidence when both counts are equal (including no matches at all).
pub const NEUTRAL_SCORE: f32 = 0.55;
const BASE_SCORE: f32 = 0.7;
const PER_MATCH_BONUS: f32 = 0.1;
const MAX_SCORE: f32 = 0.95;

/// Two disjoint sets of normalized indicator words.
#[derive(Debug, Clone)]
pub struct WordLexicon {
    positive: HashSet<String>,
    negative: HashSet<String>,
}

impl WordLexicon {
    /// Builds a lexicon from raw word lists, normalizing every entry.
    ///
    /// # Panics
    ///
    /// Panics if a word normalizes into both sets.
    pub fn new<P, N>(positive: P, negative: N) -> Self
    where
        P: IntoIterator,
        P::Item: AsRef<str>,
        N: IntoIterator,
        N::Item: AsRef<str>,
    {
        let positive: HashSet<String> = positive
            .into_iter()
            .filter_map(|w| normalize_token(w.as_ref()))
            .collect();
        let negative: HashSet<String> = negative
            .into_iter()
            .filter_map(|w| normalize_token(w.as_ref()))
            .collect();

        let overlap: Vec<&String> = positive.intersection(&negative).collect();
        assert!(
            overlap.is_empty(),
            "positive and negative word sets overlap: {overlap:?}"
        );

        Self { positive, negative }
    }

    pub fn is_positive(&self, token: &str) -> bool {
        self.positive.contains(token)
    }

    pub fn is_negative(&self, token: &str) -> bool {
        self.negative.contains(token)
    }
}

impl Default for WordLexicon {
    fn default() -> Self {
        Self::new(POSITIVE_WORDS, NEGATIVE_WORDS)
    }
}

/// Lower-cases and strips every non-alphanumeric character; `None` if nothing is left.
fn normalize_token(word: &str) -> Option<String> {
    let token: String = word
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect();
    (!token.is_empty()).then_some(token)
}

/// Splits on whitespace and normalizes each token, dropping empties.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace().filter_map(normalize_token).collect()
}

/// Everything that went into a lexicon decision.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LexiconAnalysis {
    pub original_words: Vec<String>,
    pub processed_words: Vec<String>,
    pub positive_words_found: Vec<String>,
    pub negative_words_found: Vec<String>,
    pub positive_count: usize,
    pub negative_count: usize,
}

impl LexiconAnalysis {
    pub fn result(&self) -> SentimentResult {
        decide(self.positive_count, self.negative_count)
    }
}

/// Decision rule over positive (`p`) and negative (`n`) match counts.
fn decide(p: usize, n: usize) -> SentimentResult {
    let label = match p.cmp(&n) {
        std::cmp::Ordering::Greater => SentimentLabel::Positive,
        std::cmp::Ordering::Less => SentimentLabel::Negative,
        std::cmp::Ordering::Equal => {
            return SentimentResult::new(SentimentLabel::Positive, NEUTRAL_SCORE)
        }
    };

    let confidence = (BASE_SCORE + PER_MATCH_BONUS * (p + n) as f32).min(MAX_SCORE);
    SentimentResult::new(label, round_to(confidence, 2))
}

/// Stateless scorer over an immutable [`WordLexicon`].
#[derive(Debug, Clone, Default)]
pub struct LexiconScorer {
    lexicon: WordLexicon,
}

impl LexiconScorer {
    pub fn new(lexicon: WordLexicon) -> Self {
        Self { lexicon }
    }

    pub fn analyze(&self, text: &str) -> LexiconAnalysis {
        let original_words = text
            .to_lowercase()
            .split_whitespace()
            .map(str::to_string)
            .collect();
        let processed_words = tokenize(text);

        let positive_words_found: Vec<String> = processed_words
            .iter()
            .filter(|w| self.lexicon.is_positive(w))
            .cloned()
            .collect();
        let negative_words_found: Vec<String> = processed_words
            .iter()
            .filter(|w| self.lexicon.is_negative(w))
            .cloned()
            .collect();

        LexiconAnalysis {
            original_words,
            positive_count: positive_words_found.len(),
            negative_count: negative_words_found.len(),
            processed_words,
            positive_words_found,
            negative_words_found,
        }
    }

    /// Same decision as `analyze(text).result()`, counting matches in place.
    pub fn score(&self, text: &str) -> SentimentResult {
        let (positive, negative) = text
            .split_whitespace()
            .filter_map(normalize_token)
            .fold((0, 0), |(p, n), token| {
                (
                    p + usize::from(self.lexicon.is_positive(&token)),
                    n + usize::from(self.lexicon.is_negative(&token)),
                )
            });
        decide(positive, negative)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_result(result: SentimentResult, label: SentimentLabel, score: f32) {
        assert_eq!(result.label, label);
        assert!(
            (result.score - score).abs() < 1e-6,
            "expected score {score}, got {}",
            result.score
        );
    }

    #[test]
    fn empty_input_is_neutral_positive() {
        let scorer = LexiconScorer::default();
        assert_result(scorer.score(""), SentimentLabel::Positive, 0.55);
        assert_result(scorer.score("   \t\n"), SentimentLabel::Positive, 0.55);
    }

    #[test]
    fn unknown_words_are_neutral() {
        let scorer = LexiconScorer::default();
        assert_result(
            scorer.score("The weather is nice today"),
            SentimentLabel::Positive,
            0.55,
        );
    }

    #[test]
    fn punctuation_is_stripped_before_matching() {
        let scorer = LexiconScorer::default();
        assert_result(scorer.score("This is amazing!"), SentimentLabel::Positive, 0.8);
    }

    #[test]
    fn single_negative_match() {
        let scorer = LexiconScorer::default();
        assert_result(scorer.score("I hate this product"), SentimentLabel::Negative, 0.8);
        assert_result(
            scorer.score("This is terrible quality"),
            SentimentLabel::Negative,
            0.8,
        );
    }

    #[test]
    fn case_and_trailing_punctuation_do_not_matter() {
        let scorer = LexiconScorer::default();
        assert_eq!(scorer.analyze("GREAT!!").positive_count, 1);
        assert_eq!(scorer.score("GREAT!!"), scorer.score("great"));
    }

    #[test]
    fn confidence_grows_with_matches_and_caps() {
        let scorer = LexiconScorer::default();
        assert_result(scorer.score("good great"), SentimentLabel::Positive, 0.9);
        assert_result(
            scorer.score("good great excellent amazing awesome"),
            SentimentLabel::Positive,
            0.95,
        );
        // Opposing words still count towards confidence.
        assert_result(scorer.score("good great bad"), SentimentLabel::Positive, 0.95);
    }

    #[test]
    fn ties_are_neutral() {
        let scorer = LexiconScorer::default();
        assert_result(scorer.score("good but bad"), SentimentLabel::Positive, 0.55);
    }

    #[test]
    fn scoring_is_deterministic() {
        let scorer = LexiconScorer::default();
        let first = scorer.score("awful, just awful");
        scorer.score("wonderful");
        assert_eq!(scorer.score("awful, just awful"), first);
    }

    #[test]
    fn analysis_reports_matches() {
        let analysis = LexiconScorer::default().analyze("Love it, HATE the price...");
        assert_eq!(
            analysis.original_words,
            vec!["love", "it,", "hate", "the", "price..."]
        );
        assert_eq!(
            analysis.processed_words,
            vec!["love", "it", "hate", "the", "price"]
        );
        assert_eq!(analysis.positive_words_found, vec!["love"]);
        assert_eq!(analysis.negative_words_found, vec!["hate"]);
    }

    #[test]
    fn score_matches_the_analysis_decision() {
        let scorer = LexiconScorer::default();
        for text in [
            "",
            "!!!",
            "Love it, HATE the price...",
            "GREAT!! great, Great",
            "bad bad good",
            "good great excellent amazing awesome fantastic",
            "ünïcödé wörds",
        ] {
            assert_eq!(scorer.score(text), scorer.analyze(text).result(), "{text}");
        }
    }

    #[test]
    fn tokens_made_of_punctuation_are_dropped() {
        assert_eq!(tokenize("!!! -- ok ..."), vec!["ok"]);
    }

    #[test]
    fn default_lexicon_is_disjoint() {
        // Construction asserts disjointness.
        let lexicon = WordLexicon::default();
        assert!(lexicon.is_positive("joy"));
        assert!(lexicon.is_negative("broken"));
    }

    #[test]
    #[should_panic(expected = "overlap")]
    fn overlapping_sets_are_rejected() {
        WordLexicon::new(["fine", "Good"], ["good!"]);
    }
}
