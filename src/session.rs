use crate::round::{Answer, Round};
use crate::scoring::ScoringStrategy;
use crate::supplier::{QuestionSupplier, SupplierError};
use crate::util;
use chrono::{DateTime, Local};
use thiserror::Error;

/// Session lifecycle status.
///
/// `Errored` is terminal like `Finished` but signals a failed question
/// fetch; the UI offers retry/home instead of a results screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Idle,
    AwaitingAnswer,
    Resolved,
    Finished,
    Errored,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoundOutcome {
    Correct,
    Wrong,
    Timeout,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("{op} is not valid while the session is {status:?}")]
    InvalidState { op: &'static str, status: Status },
    #[error(transparent)]
    Supplier(#[from] SupplierError),
}

#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Identifier recorded with the final summary (category/mode label).
    pub game_id: String,
    /// None means endless: the session only ends via lives or reset.
    pub total_rounds: Option<u32>,
    pub time_limit_ms: u64,
    /// 0 disables lives tracking; >0 enables survival mode.
    pub starting_lives: u32,
    pub scoring: ScoringStrategy,
    /// How long the resolved outcome stays on screen before the next round.
    pub resolve_delay_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            game_id: "quiz".to_string(),
            total_rounds: Some(10),
            time_limit_ms: 10_000,
            starting_lives: 0,
            scoring: ScoringStrategy::default(),
            resolve_delay_ms: 1_200,
        }
    }
}

/// Mutable state owned exclusively by the session; the presentation layer
/// only ever reads a borrowed snapshot.
#[derive(Clone, Debug)]
pub struct SessionState {
    pub status: Status,
    /// 0-based index of the round in progress (or last resolved).
    pub round_index: u32,
    pub score: i64,
    pub streak: u32,
    pub best_streak: u32,
    pub correct_count: u32,
    /// None when lives tracking is disabled.
    pub lives: Option<u32>,
    pub time_remaining_ms: u64,
    /// Set while resolved, cleared when the next round starts.
    pub last_outcome: Option<RoundOutcome>,
    /// Per-round answer latency, timeouts counted at the full limit.
    pub response_times_ms: Vec<u64>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            status: Status::Idle,
            round_index: 0,
            score: 0,
            streak: 0,
            best_streak: 0,
            correct_count: 0,
            lives: None,
            time_remaining_ms: 0,
            last_outcome: None,
            response_times_ms: Vec::new(),
        }
    }
}

/// Final figures computed once when the session finishes.
#[derive(Clone, Debug, PartialEq)]
pub struct Summary {
    pub game_id: String,
    pub total_score: i64,
    pub correct_count: u32,
    pub rounds_played: u32,
    pub best_streak: u32,
    pub avg_response_ms: f64,
    pub timestamp: DateTime<Local>,
}

/// Discrete side-effect notifications (audio cues, haptics, analytics).
/// All methods default to no-ops; the session never consumes a return value.
pub trait SessionHooks {
    fn on_correct(&mut self, _streak: u32) {}
    fn on_wrong(&mut self) {}
    fn on_timeout(&mut self) {}
    fn on_level_up(&mut self, _streak: u32) {}
    fn on_finished(&mut self, _summary: &Summary) {}
}

/// Best-effort destination for the final summary. Failures are swallowed
/// at this boundary; a lost write never blocks the Finished transition.
pub trait ResultSink {
    fn submit_result(&mut self, summary: &Summary) -> Result<(), Box<dyn std::error::Error>>;
}

/// Drives one timed question/round loop from start to completion,
/// independent of question content.
///
/// The session is single-threaded and tick-driven: the host calls
/// [`Session::tick`] at a fixed cadence and forwards player intents via
/// [`Session::submit_answer`]. At most one round is outstanding at a time
/// and duplicate submissions within a round are ignored.
pub struct Session {
    config: SessionConfig,
    state: SessionState,
    round: Option<Round>,
    answered: bool,
    resolve_elapsed_ms: u64,
    served_prompts: Vec<String>,
    supplier: Box<dyn QuestionSupplier>,
    hooks: Vec<Box<dyn SessionHooks>>,
    sink: Option<Box<dyn ResultSink>>,
    summary: Option<Summary>,
    last_error: Option<String>,
}

impl Session {
    pub fn new(supplier: Box<dyn QuestionSupplier>) -> Self {
        Self {
            config: SessionConfig::default(),
            state: SessionState::default(),
            round: None,
            answered: false,
            resolve_elapsed_ms: 0,
            served_prompts: Vec::new(),
            supplier,
            hooks: Vec::new(),
            sink: None,
            summary: None,
            last_error: None,
        }
    }

    pub fn with_sink(mut self, sink: Box<dyn ResultSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn add_hook(&mut self, hook: Box<dyn SessionHooks>) {
        self.hooks.push(hook);
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn current_round(&self) -> Option<&Round> {
        self.round.as_ref()
    }

    pub fn summary(&self) -> Option<&Summary> {
        self.summary.as_ref()
    }

    /// Description of the supplier failure that parked the session in
    /// `Errored`, if any.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Begin a fresh session and issue round 0.
    ///
    /// Errors with `InvalidState` while a round is in flight (`reset` first);
    /// restarting from `Idle`, `Finished`, or `Errored` is fine. A supplier
    /// failure leaves the session `Errored`.
    pub fn start(&mut self, config: SessionConfig) -> Result<(), SessionError> {
        match self.state.status {
            Status::AwaitingAnswer | Status::Resolved => {
                return Err(SessionError::InvalidState {
                    op: "start",
                    status: self.state.status,
                })
            }
            Status::Idle | Status::Finished | Status::Errored => {}
        }

        self.state = SessionState {
            lives: (config.starting_lives > 0).then_some(config.starting_lives),
            ..SessionState::default()
        };
        self.round = None;
        self.answered = false;
        self.resolve_elapsed_ms = 0;
        self.served_prompts.clear();
        self.summary = None;
        self.last_error = None;
        self.config = config;

        self.issue_round()
    }

    /// Record the player's answer for the active round.
    ///
    /// A no-op when no round is awaiting an answer or when an answer was
    /// already recorded this round; duplicate UI events (double clicks)
    /// must not double-score.
    pub fn submit_answer(&mut self, answer: &Answer) {
        if self.state.status != Status::AwaitingAnswer || self.answered {
            return;
        }
        let correct = match &self.round {
            Some(round) => round.is_correct(answer),
            None => return,
        };
        let outcome = if correct {
            RoundOutcome::Correct
        } else {
            RoundOutcome::Wrong
        };
        self.resolve(outcome);
    }

    /// Advance the countdown and the resolved-display delay.
    ///
    /// Expected at a fixed cadence from the host's scheduler; the session
    /// itself never blocks on a timer.
    pub fn tick(&mut self, elapsed_ms: u64) {
        match self.state.status {
            Status::AwaitingAnswer => {
                self.state.time_remaining_ms =
                    self.state.time_remaining_ms.saturating_sub(elapsed_ms);
                if self.state.time_remaining_ms == 0 {
                    self.timeout();
                }
            }
            Status::Resolved => {
                self.resolve_elapsed_ms += elapsed_ms;
                if self.resolve_elapsed_ms >= self.config.resolve_delay_ms {
                    self.advance();
                }
            }
            Status::Idle | Status::Finished | Status::Errored => {}
        }
    }

    /// Resolve the active round as unanswered. Equivalent in every
    /// downstream effect to a wrong answer, with `Timeout` as the outcome.
    pub fn timeout(&mut self) {
        if self.state.status != Status::AwaitingAnswer || self.answered {
            return;
        }
        self.resolve(RoundOutcome::Timeout);
    }

    /// Abandon the session and return to `Idle`, discarding the in-flight
    /// round and any pending advance delay. Safe from any status.
    pub fn reset(&mut self) {
        self.state = SessionState::default();
        self.round = None;
        self.answered = false;
        self.resolve_elapsed_ms = 0;
        self.served_prompts.clear();
        self.summary = None;
        self.last_error = None;
    }

    fn issue_round(&mut self) -> Result<(), SessionError> {
        match self.supplier.next_round(&self.config, &self.served_prompts) {
            Ok(round) => {
                self.served_prompts.push(round.prompt.clone());
                self.state.time_remaining_ms = round.time_limit_ms;
                self.state.last_outcome = None;
                self.state.status = Status::AwaitingAnswer;
                self.answered = false;
                self.resolve_elapsed_ms = 0;
                self.round = Some(round);
                Ok(())
            }
            Err(e) => {
                // Never stall in AwaitingAnswer with no round loaded
                self.round = None;
                self.state.status = Status::Errored;
                self.last_error = Some(e.to_string());
                Err(SessionError::Supplier(e))
            }
        }
    }

    fn resolve(&mut self, outcome: RoundOutcome) {
        let (time_limit_ms, remaining_ms) = match &self.round {
            Some(round) => (round.time_limit_ms, self.state.time_remaining_ms),
            None => return,
        };
        self.answered = true;
        self.state
            .response_times_ms
            .push(time_limit_ms.saturating_sub(remaining_ms));

        let correct = outcome == RoundOutcome::Correct;
        if correct {
            self.state.streak += 1;
            self.state.best_streak = self.state.best_streak.max(self.state.streak);
            self.state.correct_count += 1;
        } else {
            self.state.streak = 0;
            if let Some(lives) = self.state.lives.as_mut() {
                *lives = lives.saturating_sub(1);
            }
        }

        let delta =
            self.config
                .scoring
                .score_delta(correct, remaining_ms, time_limit_ms, self.state.streak);
        self.state.score = (self.state.score + delta).max(0);

        self.state.last_outcome = Some(outcome);
        self.state.status = Status::Resolved;
        self.resolve_elapsed_ms = 0;

        let streak = self.state.streak;
        for hook in &mut self.hooks {
            match outcome {
                RoundOutcome::Correct => hook.on_correct(streak),
                RoundOutcome::Wrong => hook.on_wrong(),
                RoundOutcome::Timeout => hook.on_timeout(),
            }
        }
        if let Some(threshold) = self.config.scoring.level_threshold() {
            if streak == threshold + 1 {
                for hook in &mut self.hooks {
                    hook.on_level_up(streak);
                }
            }
        }
    }

    /// Post-resolve transition: finish if a termination condition holds,
    /// otherwise issue the next round. Checked in order: bounded rounds
    /// exhausted first, then lives spent.
    fn advance(&mut self) {
        debug_assert_eq!(self.state.status, Status::Resolved);

        let rounds_exhausted = self
            .config
            .total_rounds
            .is_some_and(|total| self.state.round_index + 1 >= total);
        let lives_spent = self.state.lives == Some(0);

        if rounds_exhausted || lives_spent {
            self.finish();
            return;
        }

        self.state.round_index += 1;
        // A failed fetch here parks the session in Errored; the UI surfaces
        // retry/home from that state.
        let _ = self.issue_round();
    }

    fn finish(&mut self) {
        self.state.status = Status::Finished;
        self.round = None;

        let times: Vec<f64> = self
            .state
            .response_times_ms
            .iter()
            .map(|&t| t as f64)
            .collect();
        let summary = Summary {
            game_id: self.config.game_id.clone(),
            total_score: self.state.score,
            correct_count: self.state.correct_count,
            rounds_played: self.state.round_index + 1,
            best_streak: self.state.best_streak,
            avg_response_ms: util::mean(&times).unwrap_or(0.0),
            timestamp: Local::now(),
        };

        for hook in &mut self.hooks {
            hook.on_finished(&summary);
        }
        if let Some(sink) = self.sink.as_mut() {
            // Best effort; a failed save never corrupts the session
            let _ = sink.submit_result(&summary);
        }
        self.summary = Some(summary);
    }
}
