use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{EngineError, EngineResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    #[serde(rename = "W")]
    Win,
    #[serde(rename = "L")]
    Loss,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Win => "W",
            Outcome::Loss => "L",
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            Outcome::Win => 'W',
            Outcome::Loss => 'L',
        }
    }

    /// Parses a single `W`/`L` token, ignoring case and surrounding whitespace.
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_uppercase().as_str() {
            "W" => Some(Outcome::Win),
            "L" => Some(Outcome::Loss),
            _ => None,
        }
    }

    pub fn is_win(&self) -> bool {
        matches!(self, Outcome::Win)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Joins outcomes into a pattern key such as `"WWL"`.
pub fn pattern_key(outcomes: &[Outcome]) -> String {
    outcomes.iter().map(Outcome::as_char).collect()
}

/// Chronological log of outcomes. Index 0 is the earliest result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeSequence {
    outcomes: Vec<Outcome>,
}

impl OutcomeSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_outcomes(outcomes: Vec<Outcome>) -> Self {
        Self { outcomes }
    }

    /// Builds a sequence from tokens, rejecting the whole batch on any bad token.
    pub fn from_tokens<S: AsRef<str>>(tokens: &[S]) -> EngineResult<Self> {
        Ok(Self::from_outcomes(Self::parse_tokens(tokens)?))
    }

    /// Validates every token before returning any outcome. The error carries
    /// each distinct offending token once, in order of first appearance.
    pub fn parse_tokens<S: AsRef<str>>(tokens: &[S]) -> EngineResult<Vec<Outcome>> {
        let mut parsed = Vec::with_capacity(tokens.len());
        let mut invalid: Vec<String> = Vec::new();

        for token in tokens {
            let token = token.as_ref();
            match Outcome::from_token(token) {
                Some(outcome) => parsed.push(outcome),
                None => {
                    if !invalid.iter().any(|t| t == token) {
                        invalid.push(token.to_string());
                    }
                }
            }
        }

        if invalid.is_empty() {
            Ok(parsed)
        } else {
            Err(EngineError::InvalidToken { tokens: invalid })
        }
    }

    pub fn append(&mut self, outcome: Outcome) {
        self.outcomes.push(outcome);
    }

    pub fn remove_last(&mut self) -> EngineResult<Outcome> {
        self.outcomes.pop().ok_or(EngineError::EmptySequence)
    }

    pub fn clear(&mut self) {
        self.outcomes.clear();
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn as_slice(&self) -> &[Outcome] {
        &self.outcomes
    }

    pub fn last(&self) -> Option<Outcome> {
        self.outcomes.last().copied()
    }

    pub fn last_n(&self, n: usize) -> &[Outcome] {
        let len = self.outcomes.len();
        if n >= len {
            &self.outcomes[..]
        } else {
            &self.outcomes[len - n..]
        }
    }

    pub fn wins(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_win()).count()
    }

    pub fn losses(&self) -> usize {
        self.outcomes.len() - self.wins()
    }

    /// Trailing run of identical outcomes, e.g. `(Win, 3)` for `...L W W W`.
    pub fn current_run(&self) -> Option<(Outcome, usize)> {
        let last = self.last()?;
        let run = self
            .outcomes
            .iter()
            .rev()
            .take_while(|o| **o == last)
            .count();
        Some((last, run))
    }

    /// Longest runs of consecutive wins and losses: `(max_win_run, max_loss_run)`.
    pub fn max_runs(&self) -> (usize, usize) {
        let mut max_win = 0;
        let mut max_loss = 0;
        let mut win_run = 0;
        let mut loss_run = 0;

        for outcome in &self.outcomes {
            if outcome.is_win() {
                win_run += 1;
                loss_run = 0;
                max_win = max_win.max(win_run);
            } else {
                loss_run += 1;
                win_run = 0;
                max_loss = max_loss.max(loss_run);
            }
        }

        (max_win, max_loss)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_parsing_is_case_insensitive() {
        assert_eq!(Outcome::from_token("w"), Some(Outcome::Win));
        assert_eq!(Outcome::from_token(" L "), Some(Outcome::Loss));
        assert_eq!(Outcome::from_token("Q"), None);
        assert_eq!(Outcome::from_token(""), None);
    }

    #[test]
    fn test_parse_tokens_rejects_whole_batch() {
        let err = OutcomeSequence::parse_tokens(&["W", "Q", "L", "Q", "X"]).unwrap_err();
        match err {
            EngineError::InvalidToken { tokens } => assert_eq!(tokens, vec!["Q", "X"]),
            other => panic!("unexpected error: {other:?}"),
        }

        let parsed = OutcomeSequence::parse_tokens(&["l", "w"]).unwrap();
        assert_eq!(pattern_key(&parsed), "LW");
        assert!(OutcomeSequence::from_tokens(&["W", "?"]).is_err());
    }

    #[test]
    fn test_remove_last_on_empty() {
        let mut seq = OutcomeSequence::new();
        assert!(matches!(seq.remove_last(), Err(EngineError::EmptySequence)));

        seq.append(Outcome::Win);
        assert_eq!(seq.remove_last().unwrap(), Outcome::Win);
        assert!(seq.is_empty());
    }

    #[test]
    fn test_runs() {
        let seq = OutcomeSequence::from_tokens(&["W", "W", "W", "L", "L", "W", "L", "L"]).unwrap();
        assert_eq!(seq.current_run(), Some((Outcome::Loss, 2)));
        assert_eq!(seq.max_runs(), (3, 2));
        assert_eq!(seq.wins(), 4);
        assert_eq!(seq.losses(), 4);
        assert_eq!(pattern_key(seq.last_n(3)), "WLL");
        assert_eq!(seq.last_n(50).len(), 8);
        assert_eq!(OutcomeSequence::new().current_run(), None);
    }
}
