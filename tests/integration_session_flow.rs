// End-to-end session scenarios driven through the public library surface,
// without a terminal.

use std::cell::RefCell;
use std::rc::Rc;

use quizbuzz::question::Category;
use quizbuzz::round::{Answer, Round};
use quizbuzz::scoring::ScoringStrategy;
use quizbuzz::session::{
    ResultSink, RoundOutcome, Session, SessionConfig, SessionHooks, Status, Summary,
};
use quizbuzz::supplier::{BankSupplier, QueuedSupplier, QuestionSupplier, SupplierError};

const TICK_MS: u64 = 100;

fn mc_rounds(n: usize, time_limit_ms: u64) -> Vec<Round> {
    (0..n)
        .map(|i| {
            Round::multiple_choice(
                format!("q{i}"),
                vec!["right".to_string(), "wrong".to_string()],
                0,
                time_limit_ms,
            )
        })
        .collect()
}

fn config(rounds: u32, scoring: ScoringStrategy) -> SessionConfig {
    SessionConfig {
        total_rounds: Some(rounds),
        time_limit_ms: 1_000,
        scoring,
        resolve_delay_ms: 100,
        ..SessionConfig::default()
    }
}

/// Answers the live round and ticks through the resolve delay.
fn play_round(session: &mut Session, answer: &Answer) {
    assert_eq!(session.state().status, Status::AwaitingAnswer);
    session.submit_answer(answer);
    while session.state().status == Status::Resolved {
        session.tick(TICK_MS);
    }
}

#[test]
fn full_session_all_correct_time_weighted() {
    let mut session = Session::new(Box::new(QueuedSupplier::new(mc_rounds(5, 1_000))));
    session
        .start(config(5, ScoringStrategy::time_weighted(100)))
        .unwrap();

    for _ in 0..5 {
        // Answering with the full countdown remaining doubles the base
        play_round(&mut session, &Answer::Choice(0));
    }

    let summary = session.summary().unwrap();
    assert_eq!(summary.total_score, 1_000);
    assert_eq!(summary.correct_count, 5);
    assert_eq!(summary.best_streak, 5);
    assert_eq!(summary.avg_response_ms, 0.0);
}

#[test]
fn slower_answers_score_less_under_time_weighting() {
    let mut fast = Session::new(Box::new(QueuedSupplier::new(mc_rounds(3, 1_000))));
    fast.start(config(3, ScoringStrategy::time_weighted(100)))
        .unwrap();
    for _ in 0..3 {
        play_round(&mut fast, &Answer::Choice(0));
    }

    let mut slow = Session::new(Box::new(QueuedSupplier::new(mc_rounds(3, 1_000))));
    slow.start(config(3, ScoringStrategy::time_weighted(100)))
        .unwrap();
    for _ in 0..3 {
        // burn most of the countdown before answering
        for _ in 0..8 {
            slow.tick(TICK_MS);
        }
        play_round(&mut slow, &Answer::Choice(0));
    }

    let fast_score = fast.summary().unwrap().total_score;
    let slow_score = slow.summary().unwrap().total_score;
    assert!(fast_score > slow_score, "{fast_score} vs {slow_score}");
    assert_eq!(slow.summary().unwrap().avg_response_ms, 800.0);
}

#[test]
fn survival_session_ends_when_lives_run_out() {
    let mut session = Session::new(Box::new(QueuedSupplier::new(mc_rounds(20, 1_000))));
    session
        .start(SessionConfig {
            total_rounds: Some(20),
            starting_lives: 2,
            ..config(20, ScoringStrategy::flat(100))
        })
        .unwrap();

    play_round(&mut session, &Answer::Choice(0)); // correct
    play_round(&mut session, &Answer::Choice(1)); // miss, 1 life left
    play_round(&mut session, &Answer::Choice(1)); // miss, out of lives

    assert_eq!(session.state().status, Status::Finished);
    let summary = session.summary().unwrap();
    assert_eq!(summary.rounds_played, 3);
    assert_eq!(summary.correct_count, 1);
}

#[test]
fn endless_session_only_ends_via_lives() {
    let mut session = Session::new(Box::new(QueuedSupplier::new(mc_rounds(30, 1_000))));
    session
        .start(SessionConfig {
            total_rounds: None,
            starting_lives: 1,
            ..config(0, ScoringStrategy::flat(100))
        })
        .unwrap();

    for _ in 0..15 {
        play_round(&mut session, &Answer::Choice(0));
    }
    assert_eq!(session.state().status, Status::AwaitingAnswer);
    assert_eq!(session.state().round_index, 15);

    play_round(&mut session, &Answer::Choice(1));
    assert_eq!(session.state().status, Status::Finished);
    assert_eq!(session.summary().unwrap().rounds_played, 16);
}

#[test]
fn penalty_scoring_never_goes_negative_across_a_session() {
    let mut session = Session::new(Box::new(QueuedSupplier::new(mc_rounds(4, 1_000))));
    session
        .start(config(4, ScoringStrategy::penalty(100, 75)))
        .unwrap();

    play_round(&mut session, &Answer::Choice(1)); // -75 floored to 0
    assert_eq!(session.state().score, 0);
    play_round(&mut session, &Answer::Choice(0)); // +100
    play_round(&mut session, &Answer::Choice(1)); // -75
    play_round(&mut session, &Answer::Choice(1)); // -75 floored again

    assert_eq!(session.summary().unwrap().total_score, 0);
}

#[test]
fn bank_supplier_avoids_recent_repeats_within_a_session() {
    let mut session = Session::new(Box::new(BankSupplier::new(Category::Science.as_bank())));
    session
        .start(config(8, ScoringStrategy::flat(100)))
        .unwrap();

    let mut prompts = Vec::new();
    for _ in 0..8 {
        let round = session.current_round().unwrap().clone();
        prompts.push(round.prompt.clone());
        // the round's own key is always a correct submission
        play_round(&mut session, &round.answer);
    }

    assert_eq!(session.state().status, Status::Finished);
    let unique: std::collections::HashSet<&String> = prompts.iter().collect();
    assert_eq!(unique.len(), prompts.len(), "prompts repeated: {prompts:?}");
}

struct FailingSupplier;

impl QuestionSupplier for FailingSupplier {
    fn next_round(
        &mut self,
        _config: &SessionConfig,
        _history: &[String],
    ) -> Result<Round, SupplierError> {
        Err(SupplierError::Fetch("network down".to_string()))
    }
}

#[test]
fn supplier_failure_parks_session_in_errored_and_allows_restart() {
    let mut session = Session::new(Box::new(FailingSupplier));
    let err = session
        .start(config(5, ScoringStrategy::flat(100)))
        .unwrap_err();

    assert_eq!(session.state().status, Status::Errored);
    assert!(err.to_string().contains("network down"));
    assert!(session.last_error().unwrap().contains("network down"));

    // Ticks and answers are inert while errored
    session.tick(TICK_MS);
    session.submit_answer(&Answer::Choice(0));
    assert_eq!(session.state().status, Status::Errored);

    // Restarting from errored is allowed; a healthy supplier via reset+start
    // isn't possible here, but the state transition itself must be
    session.reset();
    assert_eq!(session.state().status, Status::Idle);
}

#[derive(Default)]
struct EventLog(Rc<RefCell<Vec<String>>>);

impl SessionHooks for EventLog {
    fn on_correct(&mut self, streak: u32) {
        self.0.borrow_mut().push(format!("correct:{streak}"));
    }
    fn on_wrong(&mut self) {
        self.0.borrow_mut().push("wrong".to_string());
    }
    fn on_timeout(&mut self) {
        self.0.borrow_mut().push("timeout".to_string());
    }
    fn on_level_up(&mut self, streak: u32) {
        self.0.borrow_mut().push(format!("levelup:{streak}"));
    }
    fn on_finished(&mut self, summary: &Summary) {
        self.0
            .borrow_mut()
            .push(format!("finished:{}", summary.total_score));
    }
}

#[derive(Default)]
struct CapturingSink(Rc<RefCell<Vec<Summary>>>);

impl ResultSink for CapturingSink {
    fn submit_result(&mut self, summary: &Summary) -> Result<(), Box<dyn std::error::Error>> {
        self.0.borrow_mut().push(summary.clone());
        Ok(())
    }
}

#[test]
fn hooks_and_sink_observe_a_full_session() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let captured = Rc::new(RefCell::new(Vec::new()));

    let mut session = Session::new(Box::new(QueuedSupplier::new(mc_rounds(3, 1_000))))
        .with_sink(Box::new(CapturingSink(Rc::clone(&captured))));
    session.add_hook(Box::new(EventLog(Rc::clone(&log))));
    session
        .start(config(3, ScoringStrategy::flat(100)))
        .unwrap();

    play_round(&mut session, &Answer::Choice(0));
    play_round(&mut session, &Answer::Choice(1));
    // let the last round time out instead of answering
    for _ in 0..20 {
        session.tick(TICK_MS);
        if session.state().status == Status::Finished {
            break;
        }
    }

    assert_eq!(
        *log.borrow(),
        vec!["correct:1", "wrong", "timeout", "finished:100"]
    );
    assert_eq!(session.state().last_outcome, Some(RoundOutcome::Timeout));

    let summaries = captured.borrow();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].total_score, 100);
    assert_eq!(summaries[0].rounds_played, 3);
}

#[test]
fn replaying_after_finish_starts_clean() {
    let mut session = Session::new(Box::new(QueuedSupplier::new(mc_rounds(4, 1_000))));
    session
        .start(config(2, ScoringStrategy::flat(100)))
        .unwrap();
    play_round(&mut session, &Answer::Choice(0));
    play_round(&mut session, &Answer::Choice(0));
    assert_eq!(session.state().status, Status::Finished);

    // start() directly from Finished reuses the remaining queue
    session
        .start(config(2, ScoringStrategy::flat(100)))
        .unwrap();
    assert_eq!(session.state().status, Status::AwaitingAnswer);
    assert_eq!(session.state().score, 0);
    assert_eq!(session.state().round_index, 0);
    assert!(session.summary().is_none());

    play_round(&mut session, &Answer::Choice(0));
    play_round(&mut session, &Answer::Choice(0));
    assert_eq!(session.summary().unwrap().total_score, 200);
}
