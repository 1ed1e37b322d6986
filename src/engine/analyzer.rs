use tracing::{debug, info, warn};

use super::summary::SessionSummary;
use crate::accuracy::{AccuracyState, AccuracyTracker, LossStreakEntry, PredictionRecord};
use crate::config::EngineSettings;
use crate::error::{EngineError, EngineResult};
use crate::models::{predict_next, AdaptiveStats, MatrixStats, ModelStats, PatternStats};
use crate::storage::{self, io_error, ResultStore};
use crate::types::{Forecast, ModelKind, Outcome, OutcomeSequence};

/// Owns the outcome sequence, the derived model statistics and the
/// prediction accuracy. Every mutation goes through this type and ends with
/// a full re-analysis of the sequence.
#[derive(Debug, Clone)]
pub struct PatternEngine {
    settings: EngineSettings,
    sequence: OutcomeSequence,
    stats: ModelStats,
    tracker: AccuracyTracker,
}

impl Default for PatternEngine {
    fn default() -> Self {
        Self {
            settings: EngineSettings::default(),
            sequence: OutcomeSequence::new(),
            stats: ModelStats::default(),
            tracker: AccuracyTracker::new(),
        }
    }
}

impl PatternEngine {
    pub fn new(settings: EngineSettings) -> EngineResult<Self> {
        settings.validate().map_err(EngineError::InvalidSettings)?;
        Ok(Self {
            settings,
            ..Self::default()
        })
    }

    // ---- mutations -------------------------------------------------------

    pub fn add_result(&mut self, outcome: Outcome) {
        self.push_outcome(outcome);
        debug!("Added {}. Total results: {}", outcome, self.sequence.len());
    }

    /// Scores the forecast for the current sequence against `outcome`, then
    /// appends it and re-derives all statistics.
    fn push_outcome(&mut self, outcome: Outcome) {
        let index = self.sequence.len();
        if let Some(forecast) = self.prediction() {
            self.tracker.record(index, &forecast, outcome);
        }
        self.sequence.append(outcome);
        self.reanalyze();
    }

    pub fn delete_last(&mut self) -> EngineResult<Outcome> {
        let deleted = match self.sequence.remove_last() {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("No results to delete");
                return Err(e);
            }
        };
        self.tracker.rollback(self.sequence.len());
        self.reanalyze();
        info!("Deleted last result ({})", deleted);
        Ok(deleted)
    }

    pub fn clear_all(&mut self) {
        self.sequence.clear();
        self.tracker.reset();
        self.stats = ModelStats::default();
        info!("All results cleared");
    }

    /// Adds a batch of `W`/`L` tokens in order. Nothing is added if any
    /// token is invalid.
    pub fn bulk_add<S: AsRef<str>>(&mut self, tokens: &[S]) -> EngineResult<usize> {
        self.bulk_add_with_progress(tokens, |_, _| {})
    }

    /// Like [`bulk_add`](Self::bulk_add), calling `progress(done, total)`
    /// between appends for batches above the configured size.
    pub fn bulk_add_with_progress<S, F>(&mut self, tokens: &[S], progress: F) -> EngineResult<usize>
    where
        S: AsRef<str>,
        F: FnMut(usize, usize),
    {
        let outcomes = match OutcomeSequence::parse_tokens(tokens) {
            Ok(outcomes) => outcomes,
            Err(e) => {
                warn!("Bulk add rejected: {}", e);
                return Err(e);
            }
        };
        let count = self.append_all(&outcomes, progress);
        info!("Added {} results. Total: {}", count, self.sequence.len());
        Ok(count)
    }

    fn append_all<F: FnMut(usize, usize)>(&mut self, outcomes: &[Outcome], mut progress: F) -> usize {
        let total = outcomes.len();
        let batch = self.settings.progress_batch_threshold;
        let step = if total > batch { (total / batch).max(1) } else { 0 };

        for (i, outcome) in outcomes.iter().enumerate() {
            self.push_outcome(*outcome);
            let done = i + 1;
            if step > 0 && (done % step == 0 || done == total) {
                progress(done, total);
            }
        }

        total
    }

    // ---- persistence -----------------------------------------------------

    pub fn serialize(&self) -> String {
        storage::serialize(self.sequence.as_slice())
    }

    /// Replaces the session with the outcomes read from `store`. On any error
    /// the engine is left untouched.
    pub fn load(&mut self, store: &dyn ResultStore) -> EngineResult<usize> {
        let text = store.read_text().map_err(|e| io_error(store, e))?;
        let count = self.load_text(&text)?;
        info!("Loaded {} results from {}", count, store.location());
        Ok(count)
    }

    pub fn load_text(&mut self, text: &str) -> EngineResult<usize> {
        let outcomes = storage::deserialize(text)?;
        self.clear_all();
        Ok(self.append_all(&outcomes, |_, _| {}))
    }

    /// Like [`load`](Self::load), except that a blank store restores an
    /// empty session instead of failing.
    pub fn restore(&mut self, store: &dyn ResultStore) -> EngineResult<usize> {
        let text = store.read_text().map_err(|e| io_error(store, e))?;
        if text.trim().is_empty() {
            self.clear_all();
            debug!("{} holds no results", store.location());
            return Ok(0);
        }
        let count = self.load_text(&text)?;
        info!("Loaded {} results from {}", count, store.location());
        Ok(count)
    }

    /// Writes the session back to `store`, leaving it blank when there are no
    /// results.
    pub fn persist(&self, store: &dyn ResultStore) -> EngineResult<usize> {
        if self.sequence.is_empty() {
            store.write_text("").map_err(|e| io_error(store, e))?;
            info!("Cleared {}", store.location());
            return Ok(0);
        }
        self.save(store)
    }

    pub fn save(&self, store: &dyn ResultStore) -> EngineResult<usize> {
        if self.sequence.is_empty() {
            warn!("No results to save");
            return Err(EngineError::EmptySequence);
        }
        store
            .write_text(&self.serialize())
            .map_err(|e| io_error(store, e))?;
        info!("Saved {} results to {}", self.sequence.len(), store.location());
        Ok(self.sequence.len())
    }

    // ---- settings --------------------------------------------------------

    /// Validates and applies new settings; on rejection the previous ones stay.
    pub fn update_settings(&mut self, settings: EngineSettings) -> EngineResult<()> {
        if let Err(errors) = settings.validate() {
            warn!("Settings rejected: {}", errors.join(", "));
            return Err(EngineError::InvalidSettings(errors));
        }
        self.settings = settings;
        self.reanalyze();
        info!(
            "Settings updated: threshold={}, max_pattern_length={}, model={}",
            self.settings.significance_threshold,
            self.settings.max_pattern_length,
            self.settings.active_model
        );
        Ok(())
    }

    pub fn set_significance_threshold(&mut self, threshold: u32) -> EngineResult<()> {
        self.update_settings(EngineSettings {
            significance_threshold: threshold,
            ..self.settings.clone()
        })
    }

    pub fn set_max_pattern_length(&mut self, length: usize) -> EngineResult<()> {
        self.update_settings(EngineSettings {
            max_pattern_length: length,
            ..self.settings.clone()
        })
    }

    pub fn set_active_model(&mut self, model: ModelKind) {
        self.settings.active_model = model;
        info!("Model changed to: {}", model.display_name());
    }

    fn reanalyze(&mut self) {
        self.stats = ModelStats::analyze(self.sequence.as_slice(), &self.settings);
    }

    // ---- queries ---------------------------------------------------------

    pub fn get_prediction(&self, model: ModelKind) -> Option<Forecast> {
        predict_next(self.sequence.as_slice(), &self.stats, &self.settings, model)
    }

    /// Forecast from the active model
    pub fn prediction(&self) -> Option<Forecast> {
        self.get_prediction(self.settings.active_model)
    }

    pub fn get_stats(&self) -> SessionSummary {
        SessionSummary::build(
            &self.sequence,
            &self.stats.pattern,
            self.tracker.state(),
            self.settings.significance_threshold,
        )
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn sequence(&self) -> &OutcomeSequence {
        &self.sequence
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    pub fn pattern_stats(&self) -> &PatternStats {
        &self.stats.pattern
    }

    pub fn matrix_stats(&self) -> &MatrixStats {
        &self.stats.matrix
    }

    pub fn adaptive_stats(&self) -> &AdaptiveStats {
        &self.stats.adaptive
    }

    pub fn accuracy(&self) -> &AccuracyState {
        self.tracker.state()
    }

    pub fn prediction_records(&self) -> &[PredictionRecord] {
        self.tracker.records()
    }

    pub fn loss_streaks(&self) -> &[LossStreakEntry] {
        self.tracker.loss_streaks()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MockResultStore;
    use std::io;

    fn engine_with_threshold(threshold: u32) -> PatternEngine {
        PatternEngine::new(EngineSettings {
            significance_threshold: threshold,
            ..EngineSettings::default()
        })
        .unwrap()
    }

    fn tokens(text: &str) -> Vec<&str> {
        text.split_whitespace().collect()
    }

    #[test]
    fn test_invalid_settings_rejected_on_construction() {
        let result = PatternEngine::new(EngineSettings {
            max_pattern_length: 2,
            ..EngineSettings::default()
        });
        assert!(matches!(result, Err(EngineError::InvalidSettings(_))));
    }

    #[test]
    fn test_scenario_one_at_a_time() {
        let mut engine = engine_with_threshold(1);
        let mut first_forecast = None;

        for (i, token) in tokens("W W L W L W L L L L").iter().enumerate() {
            engine.add_result(Outcome::from_token(token).unwrap());
            if i + 1 >= 3 && first_forecast.is_none() {
                first_forecast = engine.get_prediction(ModelKind::Pattern);
            }
        }

        let forecast = first_forecast.unwrap();
        assert!(forecast.sample_count >= 1);
        assert!(forecast.basis_label.len() <= 2);
        // first forecast after "W W L W": the lone "W" pattern, 2 samples
        assert_eq!(forecast.basis_label, "W");
        assert_eq!(forecast.sample_count, 2);
    }

    #[test]
    fn test_prediction_records_are_made_before_append() {
        let mut engine = engine_with_threshold(1);
        engine.bulk_add(&tokens("W W L W")).unwrap();
        assert!(engine.prediction_records().is_empty());

        let forecast = engine.prediction().unwrap();
        engine.add_result(Outcome::Win);

        let records = engine.prediction_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].outcome_index, 4);
        assert_eq!(records[0].predicted, forecast.target);
        assert_eq!(records[0].realized, Outcome::Win);
        assert_eq!(engine.accuracy().total_predictions, 1);
    }

    #[test]
    fn test_undo_restores_sequence_and_replays_accuracy() {
        let mut engine = engine_with_threshold(1);
        engine
            .bulk_add(&tokens("W W L W L W L L L L W W L W L W W L"))
            .unwrap();
        let before_seq = engine.sequence().clone();
        let before_records = engine.prediction_records().to_vec();

        engine.add_result(Outcome::Loss);
        assert_eq!(engine.delete_last().unwrap(), Outcome::Loss);

        assert_eq!(engine.sequence(), &before_seq);
        assert_eq!(engine.prediction_records(), before_records.as_slice());
        let replayed = AccuracyTracker::replay(before_records);
        assert_eq!(engine.accuracy(), replayed.state());
    }

    #[test]
    fn test_undo_without_prediction_keeps_records() {
        let mut engine = engine_with_threshold(1);
        engine.bulk_add(&tokens("W W L W W")).unwrap();
        let records = engine.prediction_records().len();
        assert!(records > 0);

        // with an impossible threshold no forecast is made for the next outcome
        engine.set_significance_threshold(100).unwrap();
        engine.add_result(Outcome::Loss);
        assert_eq!(engine.prediction_records().len(), records);

        engine.delete_last().unwrap();
        assert_eq!(engine.prediction_records().len(), records);
    }

    #[test]
    fn test_undo_current_streak_is_trailing_hits() {
        let mut engine = engine_with_threshold(1);
        engine
            .bulk_add(&tokens("W L W L W L W L W L W L W L"))
            .unwrap();
        engine.delete_last().unwrap();

        let trailing_hits = engine
            .prediction_records()
            .iter()
            .rev()
            .take_while(|r| r.is_correct())
            .count() as u32;
        assert_eq!(engine.accuracy().current_win_streak, trailing_hits);
    }

    #[test]
    fn test_delete_on_empty() {
        let mut engine = PatternEngine::default();
        assert!(matches!(engine.delete_last(), Err(EngineError::EmptySequence)));
        assert!(engine.is_empty());
    }

    #[test]
    fn test_bulk_add_atomicity() {
        let mut engine = PatternEngine::default();
        engine.bulk_add(&tokens("W L")).unwrap();

        let err = engine.bulk_add(&["W", "Q", "L"]).unwrap_err();
        assert!(matches!(err, EngineError::InvalidToken { ref tokens } if tokens == &["Q"]));
        assert_eq!(engine.serialize(), "W L");
    }

    #[test]
    fn test_bulk_add_matches_one_at_a_time() {
        let text = "W W L W L W L L L L W L W W W L L W L W W W L L L W";
        let mut bulk = engine_with_threshold(2);
        assert_eq!(bulk.bulk_add(&tokens(text)).unwrap(), 26);

        let mut single = engine_with_threshold(2);
        for token in tokens(text) {
            single.add_result(Outcome::from_token(token).unwrap());
        }

        assert_eq!(bulk.prediction_records(), single.prediction_records());
        assert_eq!(bulk.accuracy(), single.accuracy());
        assert_eq!(bulk.pattern_stats(), single.pattern_stats());
    }

    #[test]
    fn test_progress_callbacks() {
        let mut engine = PatternEngine::default();
        let batch: Vec<&str> = (0..120).map(|i| if i % 3 == 0 { "L" } else { "W" }).collect();
        let mut calls = Vec::new();
        engine
            .bulk_add_with_progress(&batch, |done, total| calls.push((done, total)))
            .unwrap();

        assert!(!calls.is_empty());
        assert!(calls.windows(2).all(|w| w[0].0 < w[1].0));
        assert_eq!(*calls.last().unwrap(), (120, 120));

        let mut small = Vec::new();
        engine
            .bulk_add_with_progress(&["W", "L"], |done, total| small.push((done, total)))
            .unwrap();
        assert!(small.is_empty());
    }

    #[test]
    fn test_clear_all_resets_everything() {
        let mut engine = engine_with_threshold(1);
        engine
            .bulk_add(&tokens("W L W L W L W L W L W L W L W L W L W L W L W L W L"))
            .unwrap();
        assert!(!engine.matrix_stats().is_empty());

        engine.clear_all();
        assert!(engine.is_empty());
        assert!(engine.pattern_stats().is_empty());
        assert!(engine.matrix_stats().is_insufficient());
        assert!(engine.adaptive_stats().is_empty());
        assert_eq!(*engine.accuracy(), AccuracyState::default());
        assert!(engine.prediction().is_none());
    }

    #[test]
    fn test_matrix_stats_cleared_below_25() {
        let mut engine = PatternEngine::default();
        let batch: Vec<&str> = (0..25).map(|i| if i % 2 == 0 { "W" } else { "L" }).collect();
        engine.bulk_add(&batch).unwrap();
        assert_eq!(engine.matrix_stats().axes().len(), 10);

        engine.delete_last().unwrap();
        assert!(engine.matrix_stats().is_insufficient());
    }

    #[test]
    fn test_settings_update_reanalyzes() {
        let mut engine = PatternEngine::default();
        engine.bulk_add(&tokens("W L W L W L W L W L")).unwrap();
        assert!(engine.pattern_stats().iter().any(|(k, _)| k.len() == 5));

        engine.set_max_pattern_length(3).unwrap();
        assert!(engine.pattern_stats().iter().all(|(k, _)| k.len() <= 3));

        let before = engine.settings().clone();
        assert!(engine.set_max_pattern_length(9).is_err());
        assert!(engine.set_significance_threshold(0).is_err());
        assert_eq!(engine.settings(), &before);

        engine.set_active_model(ModelKind::Combined);
        assert_eq!(engine.settings().active_model, ModelKind::Combined);
    }

    #[test]
    fn test_get_stats() {
        let mut engine = engine_with_threshold(1);
        engine.bulk_add(&tokens("W W L W L W L L L L")).unwrap();
        let stats = engine.get_stats();
        assert_eq!(stats.total, 10);
        assert!((stats.win_rate - 40.0).abs() < 1e-9);
        assert_eq!(stats.current_streak_label(), "4L");
        assert_eq!(stats.predictions, engine.accuracy().total_predictions);
        assert!(stats.best_pattern.is_some());
    }

    #[test]
    fn test_load_replaces_session() {
        let mut engine = PatternEngine::default();
        engine.bulk_add(&tokens("L L L")).unwrap();

        let mut store = MockResultStore::new();
        store
            .expect_read_text()
            .returning(|| Ok("w l x w\nW".to_string()));
        store.expect_location().returning(|| "mock".to_string());

        assert_eq!(engine.load(&store).unwrap(), 4);
        assert_eq!(engine.serialize(), "W L W W");
    }

    #[test]
    fn test_load_io_failure_leaves_state() {
        let mut engine = PatternEngine::default();
        engine.bulk_add(&tokens("W L W")).unwrap();

        let mut store = MockResultStore::new();
        store
            .expect_read_text()
            .returning(|| Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied")));
        store.expect_location().returning(|| "results.txt".to_string());

        let err = engine.load(&store).unwrap_err();
        assert!(matches!(err, EngineError::Io { ref location, .. } if location == "results.txt"));
        assert_eq!(engine.serialize(), "W L W");
    }

    #[test]
    fn test_load_without_tokens_leaves_state() {
        let mut engine = PatternEngine::default();
        engine.bulk_add(&tokens("W L W")).unwrap();

        let mut store = MockResultStore::new();
        store.expect_read_text().returning(|| Ok("nothing here".to_string()));
        store.expect_location().returning(|| "mock".to_string());

        assert!(matches!(engine.load(&store), Err(EngineError::NoValidTokens)));
        assert_eq!(engine.serialize(), "W L W");
    }

    fn blank_store(text: &'static str) -> MockResultStore {
        let mut store = MockResultStore::new();
        store.expect_read_text().returning(move || Ok(text.to_string()));
        store.expect_location().returning(|| "results.txt".to_string());
        store
    }

    #[test]
    fn test_restore_blank_store_gives_empty_session() {
        let mut engine = PatternEngine::default();
        engine.bulk_add(&tokens("W L W W")).unwrap();

        assert_eq!(engine.restore(&blank_store(" \n ")).unwrap(), 0);
        assert!(engine.is_empty());
        assert!(engine.prediction().is_none());
        assert!(engine.get_prediction(ModelKind::Combined).is_none());
        assert!(matches!(engine.delete_last(), Err(EngineError::EmptySequence)));
    }

    #[test]
    fn test_restore_still_rejects_garbage() {
        let mut engine = PatternEngine::default();
        engine.bulk_add(&tokens("W L")).unwrap();
        assert!(matches!(
            engine.restore(&blank_store("x y z")),
            Err(EngineError::NoValidTokens)
        ));
        assert_eq!(engine.serialize(), "W L");

        assert_eq!(engine.restore(&blank_store("l l w")).unwrap(), 3);
        assert_eq!(engine.serialize(), "L L W");
    }

    #[test]
    fn test_persist_blanks_store_when_empty() {
        let mut engine = PatternEngine::default();
        engine.bulk_add(&tokens("W")).unwrap();
        engine.delete_last().unwrap();

        let mut store = MockResultStore::new();
        store
            .expect_write_text()
            .withf(|text| text.is_empty())
            .times(1)
            .returning(|_| Ok(()));
        store.expect_location().returning(|| "mock".to_string());
        assert_eq!(engine.persist(&store).unwrap(), 0);

        engine.add_result(Outcome::Loss);
        let mut store = MockResultStore::new();
        store
            .expect_write_text()
            .withf(|text| text.to_string() == "L")
            .times(1)
            .returning(|_| Ok(()));
        store.expect_location().returning(|| "mock".to_string());
        assert_eq!(engine.persist(&store).unwrap(), 1);
    }

    #[test]
    fn test_save() {
        let engine = PatternEngine::default();
        let store = MockResultStore::new();
        assert!(matches!(engine.save(&store), Err(EngineError::EmptySequence)));

        let mut engine = PatternEngine::default();
        engine.bulk_add(&tokens("W L L")).unwrap();
        let mut store = MockResultStore::new();
        store
            .expect_write_text()
            .withf(|text| text.to_string() == "W L L")
            .times(1)
            .returning(|_| Ok(()));
        store.expect_location().returning(|| "mock".to_string());
        assert_eq!(engine.save(&store).unwrap(), 3);
    }

    #[test]
    fn test_serialize_round_trip_through_engine() {
        let mut engine = PatternEngine::default();
        engine
            .bulk_add(&tokens("W W L W L L W L W W W L"))
            .unwrap();
        let text = engine.serialize();

        let mut reloaded = PatternEngine::default();
        reloaded.load_text(&text).unwrap();
        assert_eq!(reloaded.sequence(), engine.sequence());
        assert_eq!(reloaded.accuracy(), engine.accuracy());
    }
}
