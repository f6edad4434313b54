use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::shared::embedding::Embedding;

/// Decides whether two embeddings belong to the same person.
pub trait IdentityMatcher: Send + Sync {
    /// `Some(score)` when `a` and `b` are the same person, `None` otherwise.
    /// Higher scores are better matches.
    fn score(&self, a: &Embedding, b: &Embedding) -> Option<f64>;
}

/// Matches only bit-identical embeddings.
///
/// Two detections of the same face almost never produce identical vectors,
/// so this mostly deduplicates repeated crops of the very same pixels.
pub struct ExactMatcher;

impl IdentityMatcher for ExactMatcher {
    fn score(&self, a: &Embedding, b: &Embedding) -> Option<f64> {
        a.exactly_equals(b).then_some(1.0)
    }
}

/// Matches embeddings whose cosine similarity reaches a threshold.
pub struct CosineMatcher {
    threshold: f64,
}

impl CosineMatcher {
    pub fn new(threshold: f64) -> Result<Self, String> {
        if !(-1.0..=1.0).contains(&threshold) {
            return Err(format!(
                "Similarity threshold must be between -1.0 and 1.0, got {threshold}"
            ));
        }
        Ok(Self { threshold })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}

impl IdentityMatcher for CosineMatcher {
    fn score(&self, a: &Embedding, b: &Embedding) -> Option<f64> {
        let sim = a.cosine_similarity(b);
        (sim >= self.threshold).then_some(sim)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    Exact,
    Cosine,
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchMode::Exact => write!(f, "exact"),
            MatchMode::Cosine => write!(f, "cosine"),
        }
    }
}

impl FromStr for MatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "exact" => Ok(MatchMode::Exact),
            "cosine" => Ok(MatchMode::Cosine),
            other => Err(format!("Match mode must be 'exact' or 'cosine', got '{other}'")),
        }
    }
}

pub fn build_matcher(
    mode: MatchMode,
    threshold: f64,
) -> Result<Box<dyn IdentityMatcher>, String> {
    match mode {
        MatchMode::Exact => Ok(Box::new(ExactMatcher)),
        MatchMode::Cosine => Ok(Box::new(CosineMatcher::new(threshold)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn emb(v: &[f32]) -> Embedding {
        Embedding::normalized(v.to_vec())
    }

    #[test]
    fn test_exact_matches_identical() {
        let a = emb(&[0.3, 0.4, 0.5]);
        assert_eq!(ExactMatcher.score(&a, &a.clone()), Some(1.0));
    }

    #[test]
    fn test_exact_rejects_near_identical() {
        let a = Embedding::raw(vec![0.6, 0.8]);
        let b = Embedding::raw(vec![0.6, 0.800_001]);
        assert_eq!(ExactMatcher.score(&a, &b), None);
    }

    #[test]
    fn test_cosine_accepts_similar() {
        let m = CosineMatcher::new(0.4).unwrap();
        let a = emb(&[1.0, 0.1, 0.0]);
        let b = emb(&[0.9, 0.2, 0.05]);
        let score = m.score(&a, &b).unwrap();
        assert!(score > 0.9);
    }

    #[test]
    fn test_cosine_rejects_dissimilar() {
        let m = CosineMatcher::new(0.4).unwrap();
        assert_eq!(m.score(&emb(&[1.0, 0.0]), &emb(&[0.0, 1.0])), None);
    }

    #[test]
    fn test_cosine_threshold_is_inclusive() {
        let m = CosineMatcher::new(0.0).unwrap();
        let score = m.score(&emb(&[1.0, 0.0]), &emb(&[0.0, 1.0])).unwrap();
        assert_relative_eq!(score, 0.0);
    }

    #[rstest]
    #[case(1.5)]
    #[case(-1.01)]
    #[case(f64::NAN)]
    fn test_cosine_invalid_threshold(#[case] threshold: f64) {
        assert!(CosineMatcher::new(threshold).is_err());
    }

    #[rstest]
    #[case("exact", MatchMode::Exact)]
    #[case("cosine", MatchMode::Cosine)]
    #[case("COSINE", MatchMode::Cosine)]
    fn test_match_mode_from_str(#[case] input: &str, #[case] expected: MatchMode) {
        assert_eq!(input.parse::<MatchMode>().unwrap(), expected);
    }

    #[test]
    fn test_match_mode_rejects_unknown() {
        assert!("fuzzy".parse::<MatchMode>().is_err());
    }

    #[test]
    fn test_match_mode_display_roundtrips() {
        for mode in [MatchMode::Exact, MatchMode::Cosine] {
            assert_eq!(mode.to_string().parse::<MatchMode>().unwrap(), mode);
        }
    }

    #[test]
    fn test_build_matcher_validates_threshold() {
        assert!(build_matcher(MatchMode::Cosine, 2.0).is_err());
        // Exact mode ignores the threshold entirely.
        assert!(build_matcher(MatchMode::Exact, 2.0).is_ok());
    }
}
