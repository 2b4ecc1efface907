use crate::error::{Result, SignatureError};
use std::fmt;

pub const DEFAULT_DECISION_THRESHOLD: f64 = 1.15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    Genuine,
    Forged,
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Genuine => f.write_str("Genuine"),
            Label::Forged => f.write_str("Forged"),
        }
    }
}

/// Outcome of verifying one query. Displays as `{score:.4};{label}`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    /// `verification_score / training_score`
    pub score: f64,
    pub label: Label,
}

impl Decision {
    pub fn is_genuine(&self) -> bool {
        self.label == Label::Genuine
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4};{}", self.score, self.label)
    }
}

pub fn validate_threshold(threshold: f64) -> Result<()> {
    if threshold.is_finite() && threshold > 0.0 {
        Ok(())
    } else {
        Err(SignatureError::Configuration(format!(
            "decision threshold must be finite and positive, got {threshold}"
        )))
    }
}

/// Ratio test: `Genuine` iff `verification / training <= threshold`.
///
/// A non-positive training score only admits the perfect match
/// (`verification == 0`), which scores 0.
pub fn decide(verification_score: f64, training_score: f64, threshold: f64) -> Result<Decision> {
    validate_threshold(threshold)?;
    if !verification_score.is_finite() || verification_score < 0.0 {
        return Err(SignatureError::InvalidInput(format!(
            "verification score must be finite and non-negative, got {verification_score}"
        )));
    }

    let score = if training_score.is_finite() && training_score > 0.0 {
        verification_score / training_score
    } else if verification_score == 0.0 {
        0.0
    } else {
        return Err(SignatureError::Configuration(format!(
            "training score {training_score} cannot scale a verification score of {verification_score}"
        )));
    };

    let label = if score <= threshold { Label::Genuine } else { Label::Forged };
    Ok(Decision { score, label })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_is_inclusive() {
        let at = decide(1.15, 1.0, DEFAULT_DECISION_THRESHOLD).unwrap();
        assert_eq!(at.score, DEFAULT_DECISION_THRESHOLD);
        assert_eq!(at.label, Label::Genuine);

        let above = decide(1.1500001, 1.0, DEFAULT_DECISION_THRESHOLD).unwrap();
        assert_eq!(above.label, Label::Forged);
    }

    #[test]
    fn perfect_match_with_zero_baseline() {
        let d = decide(0.0, 0.0, DEFAULT_DECISION_THRESHOLD).unwrap();
        assert_eq!(d, Decision { score: 0.0, label: Label::Genuine });
    }

    #[test]
    fn zero_or_negative_baseline_is_rejected() {
        assert!(matches!(decide(0.3, 0.0, 1.15), Err(SignatureError::Configuration(_))));
        assert!(matches!(decide(0.3, -1.0, 1.15), Err(SignatureError::Configuration(_))));
    }

    #[test]
    fn bad_threshold_and_scores() {
        assert!(matches!(decide(1.0, 1.0, 0.0), Err(SignatureError::Configuration(_))));
        assert!(matches!(decide(1.0, 1.0, f64::NAN), Err(SignatureError::Configuration(_))));
        assert!(matches!(decide(-1.0, 1.0, 1.15), Err(SignatureError::InvalidInput(_))));
    }

    #[test]
    fn report_line_format() {
        let d = decide(2.5, 2.0, 1.15).unwrap();
        assert_eq!(d.to_string(), "1.2500;Forged");
        let g = decide(0.9, 1.0, 1.15).unwrap();
        assert_eq!(g.to_string(), "0.9000;Genuine");
    }
}
