use std::sync::mpsc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use quizbuzz::round::{Answer, Round};
use quizbuzz::runtime::{AppEvent, FixedTicker, Runner, TestEventSource};
use quizbuzz::scoring::ScoringStrategy;
use quizbuzz::session::{Session, SessionConfig, Status};
use quizbuzz::supplier::QueuedSupplier;

const TICK_MS: u64 = 50;

fn quick_config(total_rounds: u32) -> SessionConfig {
    SessionConfig {
        total_rounds: Some(total_rounds),
        time_limit_ms: 2_000,
        scoring: ScoringStrategy::flat(100),
        resolve_delay_ms: 100,
        ..SessionConfig::default()
    }
}

// Headless integration using the internal runtime + Session without a TTY.
// Verifies that a minimal quiz flow completes via Runner/TestEventSource.
#[test]
fn headless_quiz_flow_completes() {
    let rounds = vec![
        Round::multiple_choice("1+1?", vec!["2".into(), "3".into()], 0, 2_000),
        Round::multiple_choice("2+2?", vec!["5".into(), "4".into()], 1, 2_000),
    ];
    let mut session = Session::new(Box::new(QueuedSupplier::new(rounds)));
    session.start(quick_config(2)).unwrap();

    let (tx, rx) = mpsc::channel();
    let es = TestEventSource::new(rx);
    let ticker = FixedTicker::new(Duration::from_millis(5));
    let runner = Runner::new(es, ticker);

    // Feed the right answer for whichever round is live; sending ahead of
    // time would land while resolved and be ignored.
    let answers = ['1', '2'];
    let mut answered_round = None;

    for _ in 0..200u32 {
        let state = session.state();
        if state.status == Status::AwaitingAnswer && answered_round != Some(state.round_index) {
            answered_round = Some(state.round_index);
            tx.send(AppEvent::Key(KeyEvent::new(
                KeyCode::Char(answers[state.round_index as usize]),
                KeyModifiers::NONE,
            )))
            .unwrap();
        }

        match runner.step() {
            AppEvent::Tick => session.tick(TICK_MS),
            AppEvent::Resize => {}
            AppEvent::Key(key) => {
                if let KeyCode::Char(c @ '1'..='9') = key.code {
                    let index = (c as usize) - ('1' as usize);
                    session.submit_answer(&Answer::Choice(index));
                }
            }
        }
        if session.state().status == Status::Finished {
            break;
        }
    }

    assert_eq!(session.state().status, Status::Finished);
    let summary = session.summary().expect("finished session has a summary");
    assert_eq!(summary.total_score, 200);
    assert_eq!(summary.correct_count, 2);
    assert_eq!(summary.rounds_played, 2);
}

#[test]
fn headless_session_finishes_by_timeout_alone() {
    let rounds = vec![Round::multiple_choice(
        "?",
        vec!["a".into(), "b".into()],
        0,
        200,
    )];
    let mut session = Session::new(Box::new(QueuedSupplier::new(rounds)));
    session.start(quick_config(1)).unwrap();

    let (_tx, rx) = mpsc::channel();
    let es = TestEventSource::new(rx);
    let ticker = FixedTicker::new(Duration::from_millis(5));
    let runner = Runner::new(es, ticker);

    // No keys at all; ticks must time the round out and then finish
    for _ in 0..100u32 {
        if let AppEvent::Tick = runner.step() {
            session.tick(TICK_MS);
        }
        if session.state().status == Status::Finished {
            break;
        }
    }

    assert_eq!(session.state().status, Status::Finished);
    let summary = session.summary().unwrap();
    assert_eq!(summary.correct_count, 0);
    assert_eq!(summary.total_score, 0);
}

#[test]
fn headless_free_text_round_flow() {
    let rounds = vec![Round::free_text("Type ok", "ok", 2_000)];
    let mut session = Session::new(Box::new(QueuedSupplier::new(rounds)));
    session.start(quick_config(1)).unwrap();

    assert!(session.current_round().unwrap().is_free_text());
    session.submit_answer(&Answer::Text("  OK ".to_string()));
    assert_eq!(session.state().status, Status::Resolved);

    session.tick(100);
    assert_eq!(session.state().status, Status::Finished);
    assert_eq!(session.summary().unwrap().correct_count, 1);
}
