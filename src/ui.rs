use crate::history::HistoryEntry;
use crate::round::Answer;
use crate::session::{RoundOutcome, Session, Status, Summary};
use crate::util;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Gauge, List, ListItem, Paragraph, Row, Table, Wrap},
    Frame,
};
use time_humanize::{Accuracy, HumanTime, Tense};
use unicode_width::UnicodeWidthStr;

const GREEN: Color = Color::Green;
const RED: Color = Color::Red;
const DIM: Color = Color::Gray;

/// Playing screen: prompt, choices (or the typed buffer), countdown, status line.
///
/// `submitted` is the answer the player gave this round, used to mark their
/// pick on the resolved display; `input` is the free-text buffer in progress.
pub fn render_play(f: &mut Frame, session: &Session, submitted: Option<&Answer>, input: &str) {
    let area = f.area();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3), // status line
            Constraint::Length(3), // countdown gauge
            Constraint::Min(6),    // prompt + choices
            Constraint::Length(3), // outcome / hint line
        ])
        .split(area);

    render_status_line(f, session, chunks[0]);
    render_countdown(f, session, chunks[1]);

    let round = match session.current_round() {
        Some(r) => r,
        None => return,
    };

    let body = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(2)])
        .split(chunks[2]);

    let prompt = Paragraph::new(round.prompt.clone())
        .block(Block::default().borders(Borders::ALL).title(format!(
            "Round {}",
            session.state().round_index + 1
        )))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(prompt, body[0]);

    if round.is_free_text() {
        let typed = Paragraph::new(format!("> {input}_"))
            .block(Block::default().borders(Borders::ALL).title("Your answer"))
            .alignment(Alignment::Left);
        f.render_widget(typed, body[1]);
    } else {
        let resolved = session.state().status == Status::Resolved;
        let items: Vec<ListItem> = round
            .choices
            .iter()
            .enumerate()
            .map(|(i, choice)| {
                let label = format!("{}. {}", i + 1, choice);
                let style = choice_style(i, round, submitted, resolved);
                ListItem::new(Line::from(Span::styled(label, style)))
            })
            .collect();
        let list =
            List::new(items).block(Block::default().borders(Borders::ALL).title("Choices"));
        f.render_widget(list, body[1]);
    }

    render_outcome_line(f, session, chunks[3]);
}

fn choice_style(
    index: usize,
    round: &crate::round::Round,
    submitted: Option<&Answer>,
    resolved: bool,
) -> Style {
    if !resolved {
        return Style::default();
    }
    let is_correct_choice = matches!(round.answer, Answer::Choice(c) if c == index);
    let is_picked = matches!(submitted, Some(Answer::Choice(p)) if *p == index);
    if is_correct_choice {
        Style::default().fg(GREEN).add_modifier(Modifier::BOLD)
    } else if is_picked {
        Style::default().fg(RED).add_modifier(Modifier::CROSSED_OUT)
    } else {
        Style::default().fg(DIM)
    }
}

fn render_status_line(f: &mut Frame, session: &Session, area: Rect) {
    let state = session.state();
    let total = session
        .config()
        .total_rounds
        .map_or("∞".to_string(), |t| t.to_string());

    let mut spans = vec![
        Span::styled(
            format!(" score {} ", state.score),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!("| round {}/{} ", state.round_index + 1, total)),
        Span::raw(format!("| streak {} ", state.streak)),
    ];
    if let Some(lives) = state.lives {
        spans.push(Span::styled(
            format!("| {} ", "♥".repeat(lives as usize)),
            Style::default().fg(RED),
        ));
    }

    let line = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).title("Quiz Buzz"));
    f.render_widget(line, area);
}

fn render_countdown(f: &mut Frame, session: &Session, area: Rect) {
    let limit = session
        .current_round()
        .map_or(session.config().time_limit_ms, |r| r.time_limit_ms);
    let remaining = session.state().time_remaining_ms;
    let ratio = if limit == 0 {
        0.0
    } else {
        (remaining as f64 / limit as f64).clamp(0.0, 1.0)
    };

    let color = if ratio > 0.5 {
        GREEN
    } else if ratio > 0.2 {
        Color::Yellow
    } else {
        RED
    };

    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title("Time"))
        .gauge_style(Style::default().fg(color))
        .ratio(ratio)
        .label(format!("{:.1}s", remaining as f64 / 1000.0));
    f.render_widget(gauge, area);
}

fn render_outcome_line(f: &mut Frame, session: &Session, area: Rect) {
    let (text, color) = match session.state().last_outcome {
        Some(RoundOutcome::Correct) => ("Correct!".to_string(), GREEN),
        Some(RoundOutcome::Wrong) => {
            let answer = session
                .current_round()
                .map_or(String::new(), |r| r.correct_display().to_string());
            (format!("Wrong! The answer was: {answer}"), RED)
        }
        Some(RoundOutcome::Timeout) => {
            let answer = session
                .current_round()
                .map_or(String::new(), |r| r.correct_display().to_string());
            (format!("Time's up! The answer was: {answer}"), Color::Yellow)
        }
        None => (
            "(1-9) pick · type + Enter for text rounds · (esc) quit".to_string(),
            DIM,
        ),
    };

    let line = Paragraph::new(text)
        .style(Style::default().fg(color))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(line, area);
}

/// Results screen: final summary plus response-time stats and best score.
pub fn render_results(
    f: &mut Frame,
    session: &Session,
    summary: &Summary,
    best_score: Option<i64>,
) {
    let area = f.area();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(3),
        ])
        .split(area);

    let new_best = best_score.map_or(true, |b| summary.total_score >= b);
    let title = if new_best {
        format!("{} (new best!)", summary.total_score)
    } else {
        format!(
            "{} (best {})",
            summary.total_score,
            best_score.unwrap_or(0)
        )
    };
    let header = Paragraph::new(title)
        .block(Block::default().borders(Borders::ALL).title("Final score"))
        .style(Style::default().fg(GREEN).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center);
    f.render_widget(header, chunks[0]);

    let times: Vec<f64> = session
        .state()
        .response_times_ms
        .iter()
        .map(|&t| t as f64)
        .collect();
    let avg_s = util::mean(&times).unwrap_or(0.0) / 1000.0;
    let median_s = util::median(&times).unwrap_or(0.0) / 1000.0;
    let sd_s = util::std_dev(&times).unwrap_or(0.0) / 1000.0;

    let accuracy = if summary.rounds_played > 0 {
        (summary.correct_count as f64 / summary.rounds_played as f64) * 100.0
    } else {
        0.0
    };

    let lines = vec![
        stat_line("game", summary.game_id.clone()),
        stat_line(
            "correct",
            format!("{}/{}", summary.correct_count, summary.rounds_played),
        ),
        stat_line("accuracy", format!("{accuracy:.0}%")),
        stat_line("best streak", summary.best_streak.to_string()),
        stat_line("avg answer", format!("{avg_s:.1}s")),
        stat_line("median answer", format!("{median_s:.1}s")),
        stat_line("answer sd", format!("{sd_s:.1}s")),
    ];
    let stats = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Session"))
        .alignment(Alignment::Center);
    f.render_widget(stats, chunks[1]);

    let footer =
        Paragraph::new("(r)eplay · (n)ew session · (h)istory · (t) share · (esc) quit")
            .style(Style::default().fg(DIM).add_modifier(Modifier::ITALIC))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
    f.render_widget(footer, chunks[2]);
}

fn stat_line(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            format!("{label:>12}  "),
            Style::default().fg(DIM),
        ),
        Span::raw(value),
    ])
}

/// History screen: recent sessions with humanized ages.
pub fn render_history(f: &mut Frame, entries: &[HistoryEntry]) {
    let area = f.area();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([Constraint::Min(4), Constraint::Length(3)])
        .split(area);

    if entries.is_empty() {
        let empty = Paragraph::new("No sessions recorded yet.\nFinish a quiz to see it here!")
            .block(Block::default().borders(Borders::ALL).title("History"))
            .style(Style::default().fg(DIM))
            .alignment(Alignment::Center);
        f.render_widget(empty, chunks[0]);
    } else {
        let header = Row::new(vec![
            Cell::from("when"),
            Cell::from("game"),
            Cell::from("score"),
            Cell::from("correct"),
            Cell::from("streak"),
        ])
        .style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

        let rows: Vec<Row> = entries
            .iter()
            .map(|e| {
                Row::new(vec![
                    Cell::from(humanize_age(e)),
                    Cell::from(e.game_id.clone()),
                    Cell::from(e.total_score.to_string()),
                    Cell::from(format!("{}/{}", e.correct_count, e.rounds_played)),
                    Cell::from(e.best_streak.to_string()),
                ])
            })
            .collect();

        let table = Table::new(
            rows,
            &[
                Constraint::Length(20),
                Constraint::Length(12),
                Constraint::Length(8),
                Constraint::Length(9),
                Constraint::Length(7),
            ],
        )
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("History ({} sessions)", entries.len())),
        );
        f.render_widget(table, chunks[0]);
    }

    let footer = Paragraph::new("(b)ack · (n)ew session · (esc) quit")
        .style(Style::default().fg(DIM).add_modifier(Modifier::ITALIC))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(footer, chunks[1]);
}

fn humanize_age(entry: &HistoryEntry) -> String {
    let elapsed = (chrono::Local::now() - entry.timestamp)
        .to_std()
        .unwrap_or_default();
    HumanTime::from(elapsed).to_text_en(Accuracy::Rough, Tense::Past)
}

/// Errored screen: supplier failure with a retry/home prompt.
pub fn render_errored(f: &mut Frame, message: &str) {
    let area = f.area();
    let text = format!("Could not load the next question:\n{message}");
    let width = text
        .lines()
        .map(UnicodeWidthStr::width)
        .max()
        .unwrap_or(0) as u16;

    let block = Paragraph::new(format!("{text}\n\n(r)etry · (esc) quit"))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Something went wrong"),
        )
        .style(Style::default().fg(RED))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });

    // Keep the box comfortably wider than the message where the frame allows
    let target = (width + 8).clamp(30, area.width.max(30));
    let boxed = centered_rect(target, 8, area);
    f.render_widget(block, boxed);
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    Rect {
        x: area.x + (area.width.saturating_sub(w)) / 2,
        y: area.y + (area.height.saturating_sub(h)) / 2,
        width: w,
        height: h,
    }
}
