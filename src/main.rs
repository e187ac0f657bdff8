pub mod app_dirs;
pub mod config;
pub mod history;
pub mod question;
pub mod round;
pub mod runtime;
pub mod scoring;
pub mod session;
pub mod supplier;
pub mod ui;
pub mod util;

use crate::{
    config::{Config, ConfigStore, FileConfigStore},
    history::{HistoryDb, HistoryEntry},
    question::Category,
    round::Answer,
    runtime::{AppEvent, CrosstermEventSource, FixedTicker, Runner},
    scoring::ScoringStrategy,
    session::{Session, SessionConfig, Status, Summary},
    supplier::BankSupplier,
};
use clap::{error::ErrorKind, CommandFactory, Parser, ValueEnum};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    time::Duration,
};
use webbrowser::Browser;

const TICK_RATE_MS: u64 = 100;
const HISTORY_PAGE: usize = 50;

/// terminal trivia with streaks, lives, and score history
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A terminal trivia quiz with timed rounds, streak and survival scoring presets, and persistent score history. Flags override your saved preferences."
)]
pub struct Cli {
    /// number of rounds per session
    #[clap(short = 'r', long)]
    rounds: Option<u32>,

    /// seconds allowed per question
    #[clap(short = 's', long)]
    secs: Option<u32>,

    /// lives before the session ends early (0 disables lives)
    #[clap(short = 'l', long)]
    lives: Option<u32>,

    /// scoring preset to use
    #[clap(long, value_enum)]
    scoring: Option<ScoringPreset>,

    /// question category to draw from
    #[clap(short = 'c', long, value_enum)]
    category: Option<Category>,

    /// keep playing until out of lives (or forever with lives disabled)
    #[clap(long)]
    endless: bool,

    /// print recent session history and exit
    #[clap(long)]
    history: bool,

    /// export the full session history as CSV to the given path and exit
    #[clap(long, value_name = "PATH")]
    export: Option<PathBuf>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum, strum_macros::Display)]
pub enum ScoringPreset {
    /// fixed points per correct answer
    Flat,
    /// faster answers earn more
    Time,
    /// consecutive correct answers earn a growing bonus
    Streak,
    /// wrong answers cost points (score never drops below zero)
    Penalty,
}

impl ScoringPreset {
    fn from_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "flat" => ScoringPreset::Flat,
            "streak" => ScoringPreset::Streak,
            "penalty" => ScoringPreset::Penalty,
            _ => ScoringPreset::Time,
        }
    }

    fn as_strategy(&self) -> ScoringStrategy {
        match self {
            ScoringPreset::Flat => ScoringStrategy::flat(100),
            ScoringPreset::Time => ScoringStrategy::time_weighted(100),
            ScoringPreset::Streak => ScoringStrategy::streak_bonus(100, 2, 50),
            ScoringPreset::Penalty => ScoringStrategy::penalty(100, 50),
        }
    }
}

fn category_from_name(name: &str) -> Category {
    match name.to_lowercase().as_str() {
        "science" => Category::Science,
        "geography" => Category::Geography,
        _ => Category::General,
    }
}

/// Effective settings after merging CLI flags over the stored config.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub rounds: u32,
    pub secs: u32,
    pub lives: u32,
    pub scoring: ScoringPreset,
    pub category: Category,
    pub endless: bool,
}

impl Settings {
    fn from_cli(cli: &Cli, stored: &Config) -> Self {
        Self {
            rounds: cli.rounds.unwrap_or(stored.rounds).max(1),
            secs: cli.secs.unwrap_or(stored.secs_per_round).max(1),
            lives: cli.lives.unwrap_or(stored.lives),
            scoring: cli
                .scoring
                .unwrap_or_else(|| ScoringPreset::from_name(&stored.scoring)),
            category: cli
                .category
                .unwrap_or_else(|| category_from_name(&stored.category)),
            endless: cli.endless || stored.endless,
        }
    }

    fn session_config(&self) -> SessionConfig {
        SessionConfig {
            game_id: self.category.to_string().to_lowercase(),
            total_rounds: if self.endless { None } else { Some(self.rounds) },
            time_limit_ms: u64::from(self.secs) * 1_000,
            starting_lives: self.lives,
            scoring: self.scoring.as_strategy(),
            ..SessionConfig::default()
        }
    }

    fn to_config(&self) -> Config {
        Config {
            rounds: self.rounds,
            secs_per_round: self.secs,
            lives: self.lives,
            scoring: self.scoring.to_string().to_lowercase(),
            category: self.category.to_string().to_lowercase(),
            endless: self.endless,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppState {
    Playing,
    Results,
    History,
    Errored,
}

pub struct App {
    pub cli: Option<Cli>,
    pub settings: Settings,
    pub session: Session,
    pub state: AppState,
    /// Free-text answer buffer for the round in progress.
    pub input: String,
    /// The answer given this round, kept for the resolved display.
    pub submitted: Option<Answer>,
    /// Round the buffers were last cleared for.
    seen_round: u32,
    /// Best recorded score for this category before this session started.
    pub best_score: Option<i64>,
    pub history_entries: Vec<HistoryEntry>,
}

impl App {
    pub fn new(cli: Cli) -> Self {
        let stored = FileConfigStore::new().load();
        let settings = Settings::from_cli(&cli, &stored);
        Self::from_settings(Some(cli), settings)
    }

    fn from_settings(cli: Option<Cli>, settings: Settings) -> Self {
        let supplier = BankSupplier::new(settings.category.as_bank());
        let mut session = Session::new(Box::new(supplier));
        let mut best_score = None;
        if let Ok(db) = HistoryDb::new() {
            best_score = db.best_score(&settings.category.to_string().to_lowercase()).ok().flatten();
            session = session.with_sink(Box::new(db));
        }

        let state = match session.start(settings.session_config()) {
            Ok(()) => AppState::Playing,
            Err(_) => AppState::Errored,
        };

        Self {
            cli,
            settings,
            session,
            state,
            input: String::new(),
            submitted: None,
            seen_round: 0,
            best_score,
            history_entries: Vec::new(),
        }
    }

    /// Start over with the same settings.
    pub fn reset(&mut self) {
        *self = Self::from_settings(self.cli.clone(), self.settings.clone());
    }

    fn on_tick(&mut self) {
        if self.state != AppState::Playing {
            return;
        }
        self.session.tick(TICK_RATE_MS);
        self.sync_state();
    }

    /// Mirror terminal session statuses into screen changes, and clear the
    /// per-round buffers once the next round is live.
    fn sync_state(&mut self) {
        match self.session.state().status {
            Status::Finished => self.state = AppState::Results,
            Status::Errored => self.state = AppState::Errored,
            Status::AwaitingAnswer => {
                // A round can end by timeout as well as by submission, so key
                // the clear off the round counter rather than the answer.
                let round = self.session.state().round_index;
                if round != self.seen_round {
                    self.seen_round = round;
                    self.submitted = None;
                    self.input.clear();
                }
            }
            Status::Idle | Status::Resolved => {}
        }
    }

    fn load_history(&mut self) {
        self.history_entries = HistoryDb::new()
            .and_then(|db| db.recent(HISTORY_PAGE))
            .unwrap_or_default();
    }

    fn submit_choice(&mut self, index: usize) {
        let in_range = self
            .session
            .current_round()
            .is_some_and(|r| !r.is_free_text() && index < r.choices.len());
        if !in_range {
            return;
        }
        let answer = Answer::Choice(index);
        self.session.submit_answer(&answer);
        self.submitted = Some(answer);
    }

    fn submit_text(&mut self) {
        if self.input.trim().is_empty() {
            return;
        }
        let answer = Answer::Text(self.input.trim().to_string());
        self.session.submit_answer(&answer);
        self.submitted = Some(answer);
    }
}

fn share_url(summary: &Summary) -> String {
    format!(
        "https://twitter.com/intent/tweet?text={}%20pts%20%2F%20{}%2F{}%20correct%20%2F%20best%20streak%20{}%20in%20quizbuzz",
        summary.total_score, summary.correct_count, summary.rounds_played, summary.best_streak
    )
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if let Some(path) = &cli.export {
        let db = HistoryDb::new()?;
        db.export_csv(path)?;
        println!("exported {} sessions to {}", db.count()?, path.display());
        return Ok(());
    }

    if cli.history {
        let db = HistoryDb::new()?;
        let entries = db.recent(20)?;
        if entries.is_empty() {
            println!("no sessions recorded yet");
        } else {
            for e in entries {
                println!(
                    "{}  {:<10} {:>6} pts  {:>2}/{:<2} correct  streak {}",
                    e.timestamp.format("%Y-%m-%d %H:%M"),
                    e.game_id,
                    e.total_score,
                    e.correct_count,
                    e.rounds_played,
                    e.best_streak,
                );
            }
        }
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(cli);

    // Remember the effective settings for next time
    let _ = FileConfigStore::new().save(&app.settings.to_config());

    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );
    let result = start_tui(&mut terminal, &mut app, &runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

#[derive(Debug)]
enum ExitType {
    Restart,
    New,
    Quit,
}

fn start_tui<B: Backend, E, T>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<E, T>,
) -> Result<(), Box<dyn Error>>
where
    E: crate::runtime::EventSource,
    T: crate::runtime::Ticker,
{
    loop {
        let mut exit_type = ExitType::Quit;
        terminal.draw(|f| ui(app, f))?;

        loop {
            match runner.step() {
                AppEvent::Tick => {
                    let before = app.state.clone();
                    app.on_tick();
                    // Redraw while the countdown is live or on a screen change
                    if app.state == AppState::Playing || app.state != before {
                        terminal.draw(|f| ui(app, f))?;
                    }
                }
                AppEvent::Resize => {
                    terminal.draw(|f| ui(app, f))?;
                }
                AppEvent::Key(key) => {
                    match handle_key(app, key) {
                        KeyOutcome::Continue => {}
                        KeyOutcome::Exit(e) => {
                            exit_type = e;
                            break;
                        }
                    }
                    terminal.draw(|f| ui(app, f))?;
                }
            }
        }

        match exit_type {
            ExitType::Restart => app.reset(),
            ExitType::New => {
                // Re-read the stored config so edits on disk take effect
                match app.cli.clone() {
                    Some(cli) => *app = App::new(cli),
                    None => app.reset(),
                }
            }
            ExitType::Quit => break,
        }
    }

    Ok(())
}

enum KeyOutcome {
    Continue,
    Exit(ExitType),
}

fn handle_key(app: &mut App, key: KeyEvent) -> KeyOutcome {
    if key.code == KeyCode::Esc
        || (key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c'))
    {
        return KeyOutcome::Exit(ExitType::Quit);
    }

    match app.state {
        AppState::Playing => {
            let free_text = app
                .session
                .current_round()
                .is_some_and(|r| r.is_free_text());
            let awaiting = app.session.state().status == Status::AwaitingAnswer;

            if awaiting && free_text {
                match key.code {
                    KeyCode::Enter => app.submit_text(),
                    KeyCode::Backspace => {
                        app.input.pop();
                    }
                    KeyCode::Char(c) => app.input.push(c),
                    _ => {}
                }
            } else if awaiting {
                if let KeyCode::Char(c @ '1'..='9') = key.code {
                    app.submit_choice((c as usize) - ('1' as usize));
                }
            }
        }
        AppState::Results => match key.code {
            KeyCode::Char('r') => return KeyOutcome::Exit(ExitType::Restart),
            KeyCode::Char('n') => return KeyOutcome::Exit(ExitType::New),
            KeyCode::Char('h') => {
                app.load_history();
                app.state = AppState::History;
            }
            KeyCode::Char('t') => {
                if let Some(summary) = app.session.summary() {
                    if Browser::is_available() {
                        webbrowser::open(&share_url(summary)).unwrap_or_default();
                    }
                }
            }
            _ => {}
        },
        AppState::History => match key.code {
            KeyCode::Char('b') | KeyCode::Backspace => {
                if app.session.summary().is_some() {
                    app.state = AppState::Results;
                }
            }
            KeyCode::Char('n') => return KeyOutcome::Exit(ExitType::New),
            _ => {}
        },
        AppState::Errored => {
            if key.code == KeyCode::Char('r') {
                return KeyOutcome::Exit(ExitType::Restart);
            }
        }
    }

    KeyOutcome::Continue
}

fn ui(app: &mut App, f: &mut Frame) {
    match app.state {
        AppState::Playing => {
            ui::render_play(f, &app.session, app.submitted.as_ref(), &app.input);
        }
        AppState::Results => {
            if let Some(summary) = app.session.summary() {
                ui::render_results(f, &app.session, summary, app.best_score);
            }
        }
        AppState::History => {
            ui::render_history(f, &app.history_entries);
        }
        AppState::Errored => {
            let message = app
                .session
                .last_error()
                .unwrap_or("question source unavailable");
            ui::render_errored(f, message);
        }
    }
}
