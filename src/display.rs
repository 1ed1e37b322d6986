//! Plain-text rendering of engine state for the terminal.

use crate::accuracy::tracker::LOSS_STREAK_LOG_MIN;
use crate::accuracy::LossStreakEntry;
use crate::engine::{PatternEngine, SessionSummary};
use crate::models::adaptive::current_trend;
use crate::models::{AdaptiveStats, MatrixStats, PatternStats};
use crate::types::{Forecast, Outcome};

const WIDTH: usize = 60;
const RECENT_COUNT: usize = 20;
const PER_ROW: usize = 10;
const TREND_DISPLAY_WINDOW: usize = 10;
const MISS_STREAK_ROWS: usize = 10;

fn heavy_rule() -> String {
    "=".repeat(WIDTH)
}

fn light_rule() -> String {
    "-".repeat(WIDTH)
}

fn rows(outcomes: &[Outcome]) -> Vec<String> {
    outcomes
        .chunks(PER_ROW)
        .map(|chunk| {
            chunk
                .iter()
                .map(Outcome::as_str)
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}

pub fn render_summary(summary: &SessionSummary) -> String {
    let state = &summary.accuracy_state;
    [
        heavy_rule(),
        "                    SESSION STATISTICS".to_string(),
        heavy_rule(),
        "RESULTS".to_string(),
        format!("  Total:              {}", summary.total),
        format!("  Wins:               {} ({:.1}%)", summary.wins, summary.win_rate),
        format!("  Losses:             {}", summary.losses),
        format!("  Current Streak:     {}", summary.current_streak_label()),
        format!("  Max Win Run:        {}", summary.max_win_run),
        format!("  Max Loss Run:       {}", summary.max_loss_run),
        light_rule(),
        "PREDICTIONS".to_string(),
        format!("  Made:               {}", summary.predictions),
        format!("  Correct:            {} ({:.1}%)", state.correct, summary.accuracy),
        format!("  Incorrect:          {}", state.incorrect),
        format!(
            "  Hit Streak:         {} (max {})",
            state.current_win_streak, state.max_win_streak
        ),
        format!(
            "  Miss Streak:        {} (max {})",
            state.current_loss_streak, state.max_loss_streak
        ),
        format!("  Best Pattern:       {}", summary.best_pattern_label()),
        heavy_rule(),
    ]
    .join("\n")
}

pub fn render_prediction(forecast: Option<&Forecast>) -> String {
    match forecast {
        Some(f) => format!(
            "Next: {} ({:.1}%) from {} [{}] based on {} samples",
            f.target,
            f.probability,
            f.model.display_name(),
            f.basis_label,
            f.sample_count
        ),
        None => "Next: insufficient data for a prediction".to_string(),
    }
}

/// Significant patterns, strongest first
pub fn render_patterns(stats: &PatternStats, threshold: u32) -> String {
    let ranked = stats.ranked(threshold);
    if ranked.is_empty() {
        return format!("No patterns with at least {} samples", threshold);
    }

    let mut lines = vec![
        format!(
            "{:<9} {:>6} {:>6} {:>8} {:>8} {:>6}",
            "Pattern", "W", "L", "W%", "L%", "Next"
        ),
        light_rule(),
    ];
    lines.extend(ranked.into_iter().map(|(key, stat)| {
        format!(
            "{:<9} {:>6} {:>6} {:>7.1}% {:>7.1}% {:>6}",
            key,
            stat.win_count,
            stat.loss_count,
            stat.win_prob,
            stat.loss_prob,
            stat.favoured()
        )
    }));
    lines.join("\n")
}

pub fn render_matrix(stats: &MatrixStats) -> String {
    let Some(grid) = stats.grid() else {
        return "Matrix needs at least 25 results".to_string();
    };

    let mut lines = vec!["      V1 V2 V3 V4 V5".to_string()];
    lines.extend(grid.iter().enumerate().map(|(r, row)| {
        let cells: Vec<&str> = row
            .iter()
            .map(|cell| cell.as_ref().map(Outcome::as_str).unwrap_or("."))
            .collect();
        format!("H{}    {}", r + 1, cells.join("  "))
    }));
    lines.push(light_rule());
    lines.extend(stats.axes().iter().map(|axis| {
        let stat = axis.composition();
        format!(
            "{:<4} {}  W {:>5.1}%  L {:>5.1}%",
            axis.label,
            axis.pattern_str(),
            stat.win_prob,
            stat.loss_prob
        )
    }));
    lines.join("\n")
}

pub fn render_adaptive(stats: &AdaptiveStats, sequence: &[Outcome]) -> String {
    let trend = current_trend(sequence, TREND_DISPLAY_WINDOW)
        .map(|t| t.to_string())
        .unwrap_or_else(|| "-".to_string());
    let mut lines = vec![format!("Current trend: {}", trend)];

    if stats.is_empty() {
        lines.push("No trend statistics yet".to_string());
    } else {
        lines.extend(stats.iter().map(|(trend, entry)| {
            format!(
                "{:<9} window {:>2}  W {:>5.1}%  L {:>5.1}%  ({} samples)",
                trend, entry.window, entry.stat.win_prob, entry.stat.loss_prob, entry.stat.total
            )
        }));
    }
    lines.join("\n")
}

/// Latest misses logged while the prediction miss streak was long
pub fn render_loss_streaks(entries: &[LossStreakEntry]) -> String {
    if entries.is_empty() {
        return format!("No miss streaks of {} or more", LOSS_STREAK_LOG_MIN);
    }
    let start = entries.len().saturating_sub(MISS_STREAK_ROWS);
    entries[start..]
        .iter()
        .map(|entry| {
            format!(
                "{:>3} misses  {:<18} [{}] at {:.1}%",
                entry.loss_streak,
                entry.model.display_name(),
                entry.basis_label,
                entry.probability
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// The most recent results, ten per row
pub fn render_recent(outcomes: &[Outcome]) -> String {
    let start = outcomes.len().saturating_sub(RECENT_COUNT);
    let recent = rows(&outcomes[start..]);
    if recent.is_empty() {
        return "No results yet".to_string();
    }
    format!("Recent: {}", recent.join("\n        "))
}

/// Full numbered history, ten results per line
pub fn render_history(outcomes: &[Outcome]) -> String {
    if outcomes.is_empty() {
        return "No results yet".to_string();
    }
    rows(outcomes)
        .into_iter()
        .enumerate()
        .map(|(i, line)| format!("{:>5}: {}", i * PER_ROW + 1, line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Everything `analyze` prints, in order
pub fn render_report(engine: &PatternEngine) -> String {
    let threshold = engine.settings().significance_threshold;
    let sections = [
        render_summary(&engine.get_stats()),
        render_prediction(engine.prediction().as_ref()),
        render_recent(engine.sequence().as_slice()),
        format!("PATTERNS\n{}", render_patterns(engine.pattern_stats(), threshold)),
        format!("MATRIX\n{}", render_matrix(engine.matrix_stats())),
        format!(
            "ADAPTIVE\n{}",
            render_adaptive(engine.adaptive_stats(), engine.sequence().as_slice())
        ),
        format!("MISS STREAKS\n{}", render_loss_streaks(engine.loss_streaks())),
    ];
    sections.join("\n\n")
}
