use serde::Serialize;
use std::collections::HashMap;

use crate::types::{pattern_key, Forecast, ModelKind, Outcome, TransitionStat};

/// Minimum sequence length before pattern statistics are built or used
pub const MIN_PATTERN_HISTORY: usize = 3;

/// Transition statistics keyed by the pattern that preceded each outcome.
/// Entries keep the order in which patterns were first seen.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PatternStats {
    entries: Vec<(String, TransitionStat)>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl PatternStats {
    pub fn get(&self, key: &str) -> Option<&TransitionStat> {
        self.index.get(key).map(|&i| &self.entries[i].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TransitionStat)> {
        self.entries.iter().map(|(k, s)| (k.as_str(), s))
    }

    fn record(&mut self, key: String, next: Outcome) {
        let idx = match self.index.get(&key) {
            Some(&idx) => idx,
            None => {
                self.entries.push((key.clone(), TransitionStat::default()));
                self.index.insert(key, self.entries.len() - 1);
                self.entries.len() - 1
            }
        };
        self.entries[idx].1.record(next);
    }

    /// Significant patterns ordered by (best probability, samples), highest first.
    pub fn ranked(&self, threshold: u32) -> Vec<(&str, &TransitionStat)> {
        let mut ranked: Vec<_> = self
            .iter()
            .filter(|(_, stat)| stat.is_significant(threshold))
            .collect();
        ranked.sort_by(|a, b| {
            b.1.best_probability()
                .total_cmp(&a.1.best_probability())
                .then(b.1.total.cmp(&a.1.total))
        });
        ranked
    }

    /// The single strongest significant pattern, scanned in first-seen order.
    pub fn best_pattern(&self, threshold: u32) -> Option<(&str, &TransitionStat)> {
        let mut best: Option<(&str, &TransitionStat)> = None;
        let mut best_prob = 0.0;
        let mut best_samples = 0;

        for (key, stat) in self.iter() {
            if !stat.is_significant(threshold) {
                continue;
            }
            let prob = stat.best_probability();
            if prob > best_prob || (prob == best_prob && stat.total > best_samples) {
                best_prob = prob;
                best_samples = stat.total;
                best = Some((key, stat));
            }
        }

        best
    }
}

/// Rebuilds pattern statistics from scratch.
///
/// For every length `1..=min(max_len, n - 1)` each outcome is counted under
/// the pattern of that length immediately preceding it.
pub fn analyze(sequence: &[Outcome], max_len: usize) -> PatternStats {
    let mut stats = PatternStats::default();
    let n = sequence.len();
    if n < MIN_PATTERN_HISTORY {
        return stats;
    }

    for len in 1..=max_len.min(n - 1) {
        for i in len..n {
            stats.record(pattern_key(&sequence[i - len..i]), sequence[i]);
        }
    }

    stats
}

/// Looks up the current suffix at every length, longest first, and keeps the
/// strongest significant one. A later (shorter) pattern replaces the current
/// best only with a higher probability, or the same probability and more samples.
pub fn predict(
    sequence: &[Outcome],
    stats: &PatternStats,
    max_len: usize,
    threshold: u32,
) -> Option<Forecast> {
    if sequence.len() < MIN_PATTERN_HISTORY || stats.is_empty() {
        return None;
    }

    let mut best = None;
    let mut max_prob = 0.0;
    let mut max_samples = 0;

    for len in (1..=max_len.min(sequence.len())).rev() {
        let key = pattern_key(&sequence[sequence.len() - len..]);
        let Some(stat) = stats.get(&key) else {
            continue;
        };
        if !stat.is_significant(threshold) {
            continue;
        }

        let prob = stat.best_probability();
        if prob > max_prob || (prob == max_prob && stat.total > max_samples) {
            max_prob = prob;
            max_samples = stat.total;
            best = Some(Forecast::new(
                ModelKind::Pattern,
                stat.favoured(),
                prob,
                key,
                stat.total,
            ));
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OutcomeSequence;

    fn seq(text: &str) -> Vec<Outcome> {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        OutcomeSequence::from_tokens(&tokens).unwrap().as_slice().to_vec()
    }

    #[test]
    fn test_too_short_yields_empty_stats() {
        assert!(analyze(&seq("W L"), 5).is_empty());
    }

    #[test]
    fn test_counts_every_follower() {
        let stats = analyze(&seq("W W L W"), 5);

        let w = stats.get("W").unwrap();
        assert_eq!((w.win_count, w.loss_count), (1, 1));
        let l = stats.get("L").unwrap();
        assert_eq!((l.win_count, l.loss_count), (1, 0));
        assert_eq!(stats.get("WW").unwrap().loss_count, 1);
        assert_eq!(stats.get("WL").unwrap().win_count, 1);
        assert_eq!(stats.get("WWL").unwrap().win_count, 1);
        // pattern length never reaches n
        assert!(stats.get("WWLW").is_none());

        let order: Vec<&str> = stats.iter().map(|(k, _)| k).collect();
        assert_eq!(order, vec!["W", "L", "WW", "WL", "WWL"]);
    }

    #[test]
    fn test_max_length_limits_keys() {
        let stats = analyze(&seq("W L W L W L W L W L"), 3);
        assert!(stats.iter().all(|(k, _)| k.len() <= 3));
        assert!(stats.get("WLW").is_some());
    }

    #[test]
    fn test_probabilities_consistent() {
        let stats = analyze(&seq("W W L W L W L L L L W L W W W L L W"), 7);
        for (_, stat) in stats.iter() {
            assert_eq!(stat.win_count + stat.loss_count, stat.total);
            assert!((stat.win_prob + stat.loss_prob - 100.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_analyze_is_idempotent() {
        let history = seq("W L L W L W W W L L W L");
        assert_eq!(analyze(&history, 5), analyze(&history, 5));
    }

    #[test]
    fn test_predict_prefers_higher_probability() {
        // every suffix of the alternating run predicts W at 100%; the shorter
        // "WL" replaces longer ones because it has more samples
        let history = seq("W L W L W L W L");
        let stats = analyze(&history, 5);
        let forecast = predict(&history, &stats, 5, 1).unwrap();
        assert_eq!(forecast.target, Outcome::Win);
        assert_eq!(forecast.probability, 100.0);
        assert_eq!(forecast.basis_label, "WL");
        assert_eq!(forecast.sample_count, 3);
        assert_eq!(forecast.model, ModelKind::Pattern);
    }

    #[test]
    fn test_predict_respects_threshold() {
        let history = seq("W W L W");
        let stats = analyze(&history, 5);
        assert!(predict(&history, &stats, 5, 3).is_none());

        let forecast = predict(&history, &stats, 5, 2).unwrap();
        assert_eq!(forecast.basis_label, "W");
        assert_eq!(forecast.probability, 50.0);
        assert_eq!(forecast.target, Outcome::Loss);
    }

    #[test]
    fn test_predict_needs_history() {
        let history = seq("W W");
        assert!(predict(&history, &PatternStats::default(), 5, 1).is_none());
    }

    #[test]
    fn test_ranked_and_best_pattern() {
        let history = seq("W L W L W L W L W");
        let stats = analyze(&history, 3);
        let ranked = stats.ranked(2);
        assert!(!ranked.is_empty());
        for pair in ranked.windows(2) {
            assert!(pair[0].1.best_probability() >= pair[1].1.best_probability());
        }
        let (key, stat) = stats.best_pattern(2).unwrap();
        assert_eq!(stat.best_probability(), 100.0);
        // "W", "L" and "WL" all have 4 samples; first-seen order wins the tie
        assert_eq!(key, "W");
        assert!(stats.best_pattern(100).is_none());
    }
}
