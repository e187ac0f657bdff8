/// An answer submitted by the player or held by a round as its key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Answer {
    /// Index into the round's choice list (multiple-choice rounds)
    Choice(usize),
    /// Free-text answer (typing rounds)
    Text(String),
}

/// One question/challenge instance served to the player within a session.
///
/// Immutable once issued; the session discards it when the round ends.
#[derive(Clone, Debug, PartialEq)]
pub struct Round {
    pub prompt: String,
    /// Wrong choices plus the correct one, already shuffled by the supplier.
    /// Empty for free-text rounds.
    pub choices: Vec<String>,
    pub answer: Answer,
    pub time_limit_ms: u64,
}

impl Round {
    pub fn multiple_choice(
        prompt: impl Into<String>,
        choices: Vec<String>,
        answer_index: usize,
        time_limit_ms: u64,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            choices,
            answer: Answer::Choice(answer_index),
            time_limit_ms,
        }
    }

    pub fn free_text(
        prompt: impl Into<String>,
        answer: impl Into<String>,
        time_limit_ms: u64,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            choices: Vec::new(),
            answer: Answer::Text(answer.into()),
            time_limit_ms,
        }
    }

    pub fn is_free_text(&self) -> bool {
        self.choices.is_empty()
    }

    /// Compare a submission against this round's key.
    ///
    /// Choice answers use strict index equality. Free-text answers are
    /// trimmed and compared case-insensitively; several game variants share
    /// this normalization so it must stay consistent.
    pub fn is_correct(&self, submitted: &Answer) -> bool {
        match (&self.answer, submitted) {
            (Answer::Choice(expected), Answer::Choice(got)) => expected == got,
            (Answer::Text(expected), Answer::Text(got)) => {
                normalize_text(expected) == normalize_text(got)
            }
            _ => false,
        }
    }

    /// Text of the correct choice, for display on the resolved screen.
    pub fn correct_display(&self) -> &str {
        match &self.answer {
            Answer::Choice(i) => self.choices.get(*i).map(String::as_str).unwrap_or(""),
            Answer::Text(t) => t.as_str(),
        }
    }
}

/// Normalization applied to both sides of a free-text comparison.
pub fn normalize_text(s: &str) -> String {
    s.trim().to_lowercase()
}
