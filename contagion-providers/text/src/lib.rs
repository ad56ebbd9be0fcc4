//! Lexicon-based zero-shot risk scoring implementing `TextRiskOracle`.
//!
//! Each word of a message is fuzzily matched against per-label cue lists.
//! Matched similarity accumulates as label evidence, a softmax turns evidence
//! into a label distribution, and the risk score is the largest probability
//! among the risky labels.

mod labels;

use contagion_core::{CollaboratorError, TextRiskOracle};
use tracing::{debug, instrument};

pub use labels::RiskLabel;

/// Minimum normalised Levenshtein similarity for a token to match a cue.
pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.85;

/// Logit multiplier applied to accumulated evidence.
const SHARPNESS: f64 = 1.5;

/// Logit bias for neutral conversation, so evidence-free text leans neutral.
const NEUTRAL_PRIOR: f64 = 1.0;

/// Probability assigned to one label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelScore {
    /// The candidate label.
    pub label: RiskLabel,
    /// Softmax probability in `[0, 1]`.
    pub score: f64,
}

/// Deterministic zero-shot labeller over built-in or extended lexicons.
///
/// # Examples
/// ```
/// use contagion_providers_text::LexiconRiskScorer;
///
/// let scorer = LexiconRiskScorer::default();
/// let scam = scorer.risk("URGENT: claim your free bitcoin giveaway at http://x.io");
/// let news = scorer.risk("The government published a research report today");
/// assert!(scam > news);
/// ```
#[derive(Debug, Clone)]
pub struct LexiconRiskScorer {
    cues: [Vec<String>; 5],
    threshold: f64,
}

impl Default for LexiconRiskScorer {
    fn default() -> Self {
        Self {
            cues: RiskLabel::ALL.map(|label| {
                label
                    .default_cues()
                    .iter()
                    .map(|&cue| cue.to_owned())
                    .collect()
            }),
            threshold: DEFAULT_MATCH_THRESHOLD,
        }
    }
}

impl LexiconRiskScorer {
    /// Scorer with the built-in lexicons.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the token similarity threshold, clamped to `[0, 1]`.
    #[must_use]
    pub const fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = if threshold.is_nan() {
            DEFAULT_MATCH_THRESHOLD
        } else {
            threshold.clamp(0.0, 1.0)
        };
        self
    }

    /// Adds cues to `label`'s lexicon. Cues are lowercased.
    #[must_use]
    pub fn with_cues<I, S>(mut self, label: RiskLabel, cues: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if let Some(lexicon) = self.cues.get_mut(label.index()) {
            lexicon.extend(cues.into_iter().map(|cue| cue.as_ref().to_lowercase()));
        }
        self
    }

    /// Label distribution for `text`, most probable first.
    ///
    /// Ties keep [`RiskLabel::ALL`] order.
    #[must_use]
    pub fn classify(&self, text: &str) -> Vec<LabelScore> {
        let evidence = self.evidence(text);
        let logits: Vec<f64> = RiskLabel::ALL
            .iter()
            .zip(evidence)
            .map(|(&label, weight)| {
                let prior = if label == RiskLabel::NeutralConversation {
                    NEUTRAL_PRIOR
                } else {
                    0.0
                };
                prior + SHARPNESS * weight
            })
            .collect();
        let mut scores: Vec<LabelScore> = RiskLabel::ALL
            .iter()
            .zip(softmax(&logits))
            .map(|(&label, score)| LabelScore { label, score })
            .collect();
        scores.sort_by(|left, right| right.score.total_cmp(&left.score));
        scores
    }

    /// Risk in `[0, 1]`: the top risky-label probability, two decimals.
    #[must_use]
    pub fn risk(&self, text: &str) -> f64 {
        let top = self
            .classify(text)
            .into_iter()
            .filter(|entry| entry.label.is_risky())
            .map(|entry| entry.score)
            .fold(0.0, f64::max);
        (top * 100.0).round() / 100.0
    }

    fn evidence(&self, text: &str) -> [f64; 5] {
        let mut evidence = [0.0; 5];
        for word in text.split_whitespace() {
            if looks_like_url(word) {
                if let Some(slot) = evidence.get_mut(RiskLabel::SuspiciousLink.index()) {
                    *slot += 1.0;
                }
                continue;
            }
            for token in tokens(word) {
                for (slot, lexicon) in evidence.iter_mut().zip(&self.cues) {
                    let best = lexicon
                        .iter()
                        .map(|cue| strsim::normalized_levenshtein(&token, cue))
                        .fold(0.0, f64::max);
                    if best >= self.threshold {
                        *slot += best;
                    }
                }
            }
        }
        evidence
    }
}

fn looks_like_url(word: &str) -> bool {
    let lower = word.to_lowercase();
    lower.contains("://") || lower.starts_with("www.") || lower.contains(".ly/")
}

fn tokens(word: &str) -> impl Iterator<Item = String> + '_ {
    word.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
}

fn softmax(logits: &[f64]) -> Vec<f64> {
    let peak = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = logits.iter().map(|logit| (logit - peak).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.into_iter().map(|value| value / total).collect()
}

impl TextRiskOracle for LexiconRiskScorer {
    fn name(&self) -> &str {
        "lexicon"
    }

    #[instrument(name = "text.score", skip_all, fields(chars = text.chars().count()))]
    fn score(&self, text: &str) -> Result<f64, CollaboratorError> {
        let risk = self.risk(text);
        debug!(risk, "content risk scored");
        Ok(risk)
    }
}
