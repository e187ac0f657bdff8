use crate::question::{QuestionBank, QuestionEntry};
use crate::round::Round;
use crate::session::SessionConfig;
use rand::seq::SliceRandom;
use std::collections::VecDeque;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SupplierError {
    #[error("question bank '{0}' is exhausted")]
    Exhausted(String),
    #[error("failed to fetch next round: {0}")]
    Fetch(String),
}

/// Source of rounds for a session. `history` carries the prompts already
/// served this session so implementations can avoid immediate repeats.
///
/// The trait is synchronous; a remote source should prefetch into a
/// [`QueuedSupplier`] rather than block the tick-driven state machine.
pub trait QuestionSupplier {
    fn next_round(
        &mut self,
        config: &SessionConfig,
        history: &[String],
    ) -> Result<Round, SupplierError>;
}

/// Picks random entries from an embedded question bank, skipping prompts
/// served within the last `repeat_window` rounds.
pub struct BankSupplier {
    bank: QuestionBank,
    repeat_window: usize,
}

impl BankSupplier {
    pub fn new(bank: QuestionBank) -> Self {
        // Window smaller than the bank so endless sessions never starve
        let repeat_window = bank.questions.len().saturating_sub(1).min(8);
        Self {
            bank,
            repeat_window,
        }
    }

    pub fn with_repeat_window(mut self, window: usize) -> Self {
        self.repeat_window = window.min(self.bank.questions.len().saturating_sub(1));
        self
    }

    fn pick(&self, history: &[String]) -> Option<&QuestionEntry> {
        let window = history.len().min(self.repeat_window);
        let recent = &history[history.len() - window..];

        let mut rng = rand::thread_rng();
        let candidates: Vec<&QuestionEntry> = self
            .bank
            .questions
            .iter()
            .filter(|q| !recent.contains(&q.prompt))
            .collect();

        if candidates.is_empty() {
            self.bank.questions.choose(&mut rng)
        } else {
            candidates.choose(&mut rng).copied()
        }
    }
}

impl QuestionSupplier for BankSupplier {
    fn next_round(
        &mut self,
        config: &SessionConfig,
        history: &[String],
    ) -> Result<Round, SupplierError> {
        let entry = self
            .pick(history)
            .ok_or_else(|| SupplierError::Exhausted(self.bank.name.clone()))?
            .clone();

        Ok(entry.to_round(config.time_limit_ms, &mut rand::thread_rng()))
    }
}

/// FIFO of pre-built rounds. Used by tests and as the landing buffer for
/// asynchronous fetch adapters.
#[derive(Default)]
pub struct QueuedSupplier {
    rounds: VecDeque<Round>,
}

impl QueuedSupplier {
    pub fn new(rounds: impl IntoIterator<Item = Round>) -> Self {
        Self {
            rounds: rounds.into_iter().collect(),
        }
    }

    pub fn push(&mut self, round: Round) {
        self.rounds.push_back(round);
    }

    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }
}

impl QuestionSupplier for QueuedSupplier {
    fn next_round(
        &mut self,
        _config: &SessionConfig,
        _history: &[String],
    ) -> Result<Round, SupplierError> {
        self.rounds
            .pop_front()
            .ok_or_else(|| SupplierError::Exhausted("queue".to_string()))
    }
}
