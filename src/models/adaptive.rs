use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

use super::pattern::PatternStats;
use crate::types::{pattern_key, Forecast, ModelKind, Outcome, TransitionStat};

/// Window sizes pooled into the adaptive statistics, in visiting order
pub const TREND_WINDOWS: [usize; 3] = [10, 20, 50];
/// Majority share that classifies a historical window as trending
pub const TREND_SHARE: f64 = 0.6;
/// Ratio one symbol must exceed the other by for the immediate trend
pub const IMMEDIATE_TREND_RATIO: f64 = 1.5;

pub const MIN_ADAPTIVE_HISTORY: usize = 20;
pub const MIN_ADAPTIVE_PREDICT_HISTORY: usize = 5;
const IMMEDIATE_WINDOW: usize = 50;

const TREND_WEIGHT: f64 = 0.3;
const SHORT_PATTERN_WEIGHT: f64 = 0.4;
const LONG_PATTERN_WEIGHT: f64 = 0.3;
const SHORT_PATTERN_LEN: usize = 3;
const LONG_PATTERN_LEN: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Trend {
    Rising,
    Falling,
    Balanced,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Rising => "Rising",
            Trend::Falling => "Falling",
            Trend::Balanced => "Balanced",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn counts(window: &[Outcome]) -> (usize, usize) {
    let wins = window.iter().filter(|o| o.is_win()).count();
    (wins, window.len() - wins)
}

/// Majority-share classification used for the historical windows.
pub fn classify_window(window: &[Outcome], share: f64) -> Trend {
    if window.is_empty() {
        return Trend::Balanced;
    }
    let (wins, losses) = counts(window);
    let size = window.len() as f64;
    if wins as f64 / size >= share {
        Trend::Rising
    } else if losses as f64 / size >= share {
        Trend::Falling
    } else {
        Trend::Balanced
    }
}

/// Trend of every full window of `size`, oldest window first.
pub fn classify_windows(sequence: &[Outcome], size: usize) -> Vec<Trend> {
    if size == 0 || sequence.len() < size {
        return Vec::new();
    }
    sequence
        .windows(size)
        .map(|w| classify_window(w, TREND_SHARE))
        .collect()
}

/// Ratio rule used for the trend the predictor acts on.
pub fn immediate_trend(window: &[Outcome]) -> Trend {
    let (wins, losses) = counts(window);
    if wins as f64 > losses as f64 * IMMEDIATE_TREND_RATIO {
        Trend::Rising
    } else if losses as f64 > wins as f64 * IMMEDIATE_TREND_RATIO {
        Trend::Falling
    } else {
        Trend::Balanced
    }
}

/// Immediate trend over the last `window` outcomes, if that many exist.
pub fn current_trend(sequence: &[Outcome], window: usize) -> Option<Trend> {
    if sequence.len() < window {
        return None;
    }
    Some(immediate_trend(&sequence[sequence.len() - window..]))
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendStat {
    /// Window size the statistic was taken from
    pub window: usize,
    pub stat: TransitionStat,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AdaptiveStats {
    entries: HashMap<Trend, TrendStat>,
}

impl AdaptiveStats {
    pub fn get(&self, trend: Trend) -> Option<&TrendStat> {
        self.entries.get(&trend)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Entries in Rising, Falling, Balanced order
    pub fn iter(&self) -> impl Iterator<Item = (Trend, &TrendStat)> {
        [Trend::Rising, Trend::Falling, Trend::Balanced]
            .into_iter()
            .filter_map(|t| self.entries.get(&t).map(|s| (t, s)))
    }
}

/// Counts the outcome following every window of each size under the
/// window's trend, then folds the buckets into one entry per trend.
///
/// Buckets below `threshold` are dropped; among the rest a larger window
/// size overwrites a smaller one for the same trend.
pub fn analyze(sequence: &[Outcome], threshold: u32) -> AdaptiveStats {
    let mut stats = AdaptiveStats::default();
    let n = sequence.len();
    if n < MIN_ADAPTIVE_HISTORY {
        return stats;
    }

    let mut buckets: Vec<((usize, Trend), TransitionStat)> = Vec::new();

    for size in TREND_WINDOWS {
        if n < size {
            continue;
        }
        for end in size..=n {
            let trend = classify_window(&sequence[end - size..end], TREND_SHARE);
            let idx = match buckets.iter().position(|(key, _)| *key == (size, trend)) {
                Some(idx) => idx,
                None => {
                    buckets.push(((size, trend), TransitionStat::default()));
                    buckets.len() - 1
                }
            };
            if end < n {
                buckets[idx].1.record(sequence[end]);
            }
        }
    }

    for ((window, trend), stat) in buckets {
        if stat.is_significant(threshold) {
            stats.entries.insert(trend, TrendStat { window, stat });
        }
    }

    stats
}

/// Blends the trend statistic with the last-3 and last-7 pattern statistics.
///
/// The reported sample count is the trend's alone (0 when the trend has no
/// entry), even when pattern evidence contributed.
pub fn predict(
    sequence: &[Outcome],
    pattern_stats: &PatternStats,
    adaptive_stats: &AdaptiveStats,
    threshold: u32,
) -> Option<Forecast> {
    let n = sequence.len();
    if n < MIN_ADAPTIVE_PREDICT_HISTORY || adaptive_stats.is_empty() {
        return None;
    }

    let trend = immediate_trend(&sequence[n - n.min(IMMEDIATE_WINDOW)..]);

    let mut win = 0.0;
    let mut loss = 0.0;
    let mut blend = |stat: &TransitionStat, weight: f64| {
        if stat.is_significant(threshold) {
            win += stat.win_prob * weight;
            loss += stat.loss_prob * weight;
        }
    };

    let trend_stat = adaptive_stats.get(trend);
    if let Some(entry) = trend_stat {
        blend(&entry.stat, TREND_WEIGHT);
    }

    if let Some(stat) = pattern_stats.get(&pattern_key(&sequence[n - SHORT_PATTERN_LEN..])) {
        blend(stat, SHORT_PATTERN_WEIGHT);
    }

    if n >= LONG_PATTERN_LEN {
        if let Some(stat) = pattern_stats.get(&pattern_key(&sequence[n - LONG_PATTERN_LEN..])) {
            blend(stat, LONG_PATTERN_WEIGHT);
        }
    }

    let score = win.max(loss);
    if score <= 50.0 {
        return None;
    }

    Some(Forecast::new(
        ModelKind::Adaptive,
        if win > loss { Outcome::Win } else { Outcome::Loss },
        score,
        format!("{} + last pattern", trend),
        trend_stat.map(|e| e.stat.total).unwrap_or(0),
    ))
}
