use serde::Serialize;

use crate::types::{pattern_key, Forecast, ModelKind, Outcome, TransitionStat};

pub const MATRIX_ROWS: usize = 5;
pub const MATRIX_COLS: usize = 5;
pub const MATRIX_CELLS: usize = MATRIX_ROWS * MATRIX_COLS;

/// Minimum sequence length before a matrix forecast is attempted
pub const MIN_MATRIX_PREDICT_HISTORY: usize = 10;

pub type MatrixGrid = [[Option<Outcome>; MATRIX_COLS]; MATRIX_ROWS];

/// One fully-populated row (`H1..H5`) or column (`V1..V5`) of the grid
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatrixAxis {
    pub label: String,
    pub pattern: Vec<Outcome>,
    /// Share of W and L along the axis. Descriptive, not a transition.
    pub stat: TransitionStat,
}

impl MatrixAxis {
    fn new(label: String, pattern: Vec<Outcome>) -> Self {
        let stat = TransitionStat::composition(&pattern);
        Self { label, pattern, stat }
    }

    pub fn pattern_str(&self) -> String {
        pattern_key(&self.pattern)
    }

    /// Composition stat, rebuilt from the pattern when the cached one is stale.
    pub fn composition(&self) -> TransitionStat {
        if self.stat.total as usize == self.pattern.len() {
            self.stat
        } else {
            TransitionStat::composition(&self.pattern)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MatrixStats {
    grid: Option<MatrixGrid>,
    axes: Vec<MatrixAxis>,
}

impl MatrixStats {
    /// True when fewer than 25 outcomes were available.
    pub fn is_insufficient(&self) -> bool {
        self.grid.is_none()
    }

    pub fn grid(&self) -> Option<&MatrixGrid> {
        self.grid.as_ref()
    }

    /// Rows H1..H5 first, then columns V1..V5
    pub fn axes(&self) -> &[MatrixAxis] {
        &self.axes
    }

    pub fn get(&self, label: &str) -> Option<&MatrixAxis> {
        self.axes.iter().find(|a| a.label == label)
    }

    pub fn is_empty(&self) -> bool {
        self.axes.is_empty()
    }
}

/// Lays the most recent 25 outcomes into a 5x5 grid, newest first and
/// column-major: the i-th most recent outcome lands at `(i % 5, i / 5)`.
pub fn build_grid(sequence: &[Outcome]) -> MatrixGrid {
    let mut grid: MatrixGrid = [[None; MATRIX_COLS]; MATRIX_ROWS];
    for (i, outcome) in sequence.iter().rev().take(MATRIX_CELLS).enumerate() {
        grid[i % MATRIX_ROWS][i / MATRIX_ROWS] = Some(*outcome);
    }
    grid
}

pub fn analyze(sequence: &[Outcome]) -> MatrixStats {
    if sequence.len() < MATRIX_CELLS {
        return MatrixStats::default();
    }

    let grid = build_grid(sequence);
    let mut axes = Vec::with_capacity(MATRIX_ROWS + MATRIX_COLS);

    for (r, row) in grid.iter().enumerate() {
        let cells: Option<Vec<Outcome>> = row.iter().copied().collect();
        if let Some(pattern) = cells {
            axes.push(MatrixAxis::new(format!("H{}", r + 1), pattern));
        }
    }

    for c in 0..MATRIX_COLS {
        let cells: Option<Vec<Outcome>> = grid.iter().map(|row| row[c]).collect();
        if let Some(pattern) = cells {
            axes.push(MatrixAxis::new(format!("V{}", c + 1), pattern));
        }
    }

    MatrixStats {
        grid: Some(grid),
        axes,
    }
}

/// Picks the axis with the highest composition share among those meeting
/// the threshold. Ties keep the earlier axis.
pub fn predict(sequence: &[Outcome], stats: &MatrixStats, threshold: u32) -> Option<Forecast> {
    if sequence.len() < MIN_MATRIX_PREDICT_HISTORY || stats.is_empty() {
        return None;
    }

    let mut best = None;
    let mut max_prob = 0.0;

    for axis in stats.axes() {
        let stat = axis.composition();
        if !stat.is_significant(threshold) {
            continue;
        }
        let prob = stat.best_probability();
        if prob > max_prob {
            max_prob = prob;
            best = Some(Forecast::new(
                ModelKind::Matrix,
                stat.favoured(),
                prob,
                format!("{}:{}", axis.label, axis.pattern_str()),
                stat.total,
            ));
        }
    }

    best
}
