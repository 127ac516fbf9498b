//! Deobfs engine: scoring primitives.
//!
//! Every score is a ratio in [0, 1] until it is scaled to a percent at the
//! very end. Sums of exact 1.0 scores stay exact, so a perfect comparison
//! always lands on exactly `PERFECT_CONFIDENCE`.

/// Confidence of a perfect match, in percent.
pub const PERFECT_CONFIDENCE: f64 = 100.0;

/// Minimum confidence for a general (non-strict) structural match.
pub const MATCH_THRESHOLD: f64 = 80.0;

/// `part / whole`, or 0 when `whole` is 0.
pub fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 / whole as f64
}

/// Count similarity: `1 - |a - b| / max(a, b)`.
/// Two empty collections are identical.
pub fn count_similarity(a: usize, b: usize) -> f64 {
    let larger = a.max(b);
    if larger == 0 {
        return 1.0;
    }
    1.0 - ratio(a.abs_diff(b), larger)
}

/// Accumulates per-check scores into a percent confidence.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScoreCard {
    total: f64,
    checks: u32,
}

impl ScoreCard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, score: f64) {
        self.total += score;
        self.checks += 1;
    }

    pub fn checks(&self) -> u32 {
        self.checks
    }

    /// Mean of recorded scores scaled to percent; 0 with no checks.
    pub fn confidence(&self) -> f64 {
        if self.checks == 0 {
            return 0.0;
        }
        clamp_confidence(self.total / f64::from(self.checks) * 100.0)
    }
}

/// Arithmetic mean of confidences, 0 for an empty input.
pub fn average_confidence<I>(confidences: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let mut total = 0.0;
    let mut count = 0usize;
    for c in confidences {
        total += c;
        count += 1;
    }
    if count == 0 {
        return 0.0;
    }
    clamp_confidence(total / count as f64)
}

pub fn clamp_confidence(value: f64) -> f64 {
    value.clamp(0.0, PERFECT_CONFIDENCE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_handles_zero_whole() {
        assert_eq!(ratio(0, 0), 0.0);
        assert_eq!(ratio(1, 4), 0.25);
    }

    #[test]
    fn test_count_similarity() {
        assert_eq!(count_similarity(3, 3), 1.0);
        assert_eq!(count_similarity(2, 4), 0.5);
        assert_eq!(count_similarity(4, 2), 0.5);
        assert_eq!(count_similarity(0, 5), 0.0);
        assert_eq!(count_similarity(0, 0), 1.0);
    }

    #[test]
    fn test_scorecard_perfect_is_exact() {
        let mut card = ScoreCard::new();
        for _ in 0..7 {
            card.record(1.0);
        }
        assert_eq!(card.checks(), 7);
        assert_eq!(card.confidence(), PERFECT_CONFIDENCE);
    }

    #[test]
    fn test_scorecard_mean() {
        let mut card = ScoreCard::new();
        card.record(1.0);
        card.record(0.5);
        assert_eq!(card.confidence(), 75.0);
        assert_eq!(ScoreCard::new().confidence(), 0.0);
    }

    #[test]
    fn test_average_confidence() {
        assert_eq!(average_confidence([100.0, 50.0]), 75.0);
        assert_eq!(average_confidence(Vec::<f64>::new()), 0.0);
    }
}
