use super::model::{ClassScore, TextClassifier};
use crate::core::sentiment::round_to;
use crate::core::{Result, SentimentError, SentimentLabel, SentimentResult};
use std::sync::Arc;

/// Native labels that count as positive, compared case-insensitively.
const POSITIVE_LABELS: &[&str] = &["POSITIVE", "LABEL_1", "1"];

/// Maps a model's native class label onto the engine's two labels.
pub fn map_label(native: &str) -> SentimentLabel {
    if POSITIVE_LABELS
        .iter()
        .any(|candidate| native.eq_ignore_ascii_case(candidate))
    {
        SentimentLabel::Positive
    } else {
        SentimentLabel::Negative
    }
}

/// Normalizes a loaded classifier's per-class output into a [`SentimentResult`].
#[derive(Clone)]
pub struct ModelScorer {
    classifier: Arc<dyn TextClassifier>,
}

impl ModelScorer {
    pub fn new(classifier: Arc<dyn TextClassifier>) -> Self {
        Self { classifier }
    }

    pub fn source(&self) -> &str {
        self.classifier.source()
    }

    pub fn score(&self, text: &str) -> Result<SentimentResult> {
        let scores = self
            .classifier
            .classify(text)
            .map_err(|e| SentimentError::Inference(format!("{e:#}")))?;

        let best = best_class(scores)?;
        Ok(SentimentResult::new(
            map_label(&best.label),
            round_to(best.score, 4),
        ))
    }
}

impl std::fmt::Debug for ModelScorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelScorer")
            .field("source", &self.source())
            .finish()
    }
}

fn best_class(scores: Vec<ClassScore>) -> Result<ClassScore> {
    let best = scores
        .into_iter()
        .max_by(|a, b| a.score.total_cmp(&b.score))
        .ok_or_else(|| SentimentError::Inference("model returned no class scores".into()))?;

    if !best.score.is_finite() {
        return Err(SentimentError::Inference(format!(
            "model returned a non-finite score for '{}'",
            best.label
        )));
    }
    Ok(best)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedClassifier(Vec<(&'static str, f32)>);

    impl TextClassifier for FixedClassifier {
        fn classify(&self, _text: &str) -> anyhow::Result<Vec<ClassScore>> {
            Ok(self
                .0
                .iter()
                .map(|(label, score)| ClassScore {
                    label: label.to_string(),
                    score: *score,
                })
                .collect())
        }

        fn source(&self) -> &str {
            "fixed"
        }
    }

    struct BrokenClassifier;

    impl TextClassifier for BrokenClassifier {
        fn classify(&self, _text: &str) -> anyhow::Result<Vec<ClassScore>> {
            anyhow::bail!("device lost")
        }

        fn source(&self) -> &str {
            "broken"
        }
    }

    fn scorer(classes: Vec<(&'static str, f32)>) -> ModelScorer {
        ModelScorer::new(Arc::new(FixedClassifier(classes)))
    }

    #[test]
    fn label_mapping() {
        for positive in ["POSITIVE", "positive", "Label_1", "1"] {
            assert_eq!(map_label(positive), SentimentLabel::Positive, "{positive}");
        }
        for negative in ["NEGATIVE", "LABEL_0", "0", "neutral", "LABEL_2", ""] {
            assert_eq!(map_label(negative), SentimentLabel::Negative, "{negative}");
        }
    }

    #[test]
    fn picks_highest_class_and_rounds() {
        let result = scorer(vec![("NEGATIVE", 0.012_345), ("POSITIVE", 0.987_655)])
            .score("anything")
            .unwrap();
        assert_eq!(result.label, SentimentLabel::Positive);
        assert!((result.score - 0.9877).abs() < 1e-6);
    }

    #[test]
    fn unknown_winning_label_is_negative() {
        let result = scorer(vec![("LABEL_0", 0.2), ("LABEL_1", 0.1), ("LABEL_2", 0.7)])
            .score("meh")
            .unwrap();
        assert_eq!(result.label, SentimentLabel::Negative);
        assert!((result.score - 0.7).abs() < 1e-6);
    }

    #[test]
    fn empty_output_is_an_inference_error() {
        let err = scorer(vec![]).score("x").unwrap_err();
        assert!(matches!(err, SentimentError::Inference(_)));
    }

    #[test]
    fn nan_scores_are_an_inference_error() {
        let err = scorer(vec![("POSITIVE", f32::NAN)]).score("x").unwrap_err();
        assert!(matches!(err, SentimentError::Inference(_)));
    }

    #[test]
    fn classifier_failure_is_an_inference_error() {
        let err = ModelScorer::new(Arc::new(BrokenClassifier))
            .score("x")
            .unwrap_err();
        assert_eq!(err, SentimentError::Inference("device lost".to_string()));
    }
}
