use crate::round::Round;
use include_dir::{include_dir, Dir};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;
use serde_json::from_str;
use std::error::Error;

static TRIVIA_DIR: Dir = include_dir!("src/trivia");

/// Question category selectable from the CLI.
#[derive(Debug, Copy, Clone, PartialEq, clap::ValueEnum, strum_macros::Display)]
pub enum Category {
    General,
    Science,
    Geography,
}

impl Category {
    pub fn as_bank(&self) -> QuestionBank {
        QuestionBank::new(self.to_string().to_lowercase())
    }
}

/// One authored question. Entries without distractors are free-text
/// (typing) rounds; the rest are multiple choice.
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct QuestionEntry {
    pub prompt: String,
    pub answer: String,
    #[serde(default)]
    pub distractors: Vec<String>,
}

impl QuestionEntry {
    /// Build a playable round, shuffling choice order for multiple-choice
    /// entries so the correct answer's position varies between sessions.
    pub fn to_round<R: Rng>(&self, time_limit_ms: u64, rng: &mut R) -> Round {
        if self.distractors.is_empty() {
            return Round::free_text(self.prompt.clone(), self.answer.clone(), time_limit_ms);
        }

        let mut choices: Vec<String> = Vec::with_capacity(self.distractors.len() + 1);
        choices.push(self.answer.clone());
        choices.extend(self.distractors.iter().cloned());
        choices.shuffle(rng);

        let answer_index = choices
            .iter()
            .position(|c| c == &self.answer)
            .unwrap_or(0);

        Round::multiple_choice(self.prompt.clone(), choices, answer_index, time_limit_ms)
    }
}

#[allow(dead_code)]
#[derive(Deserialize, Clone, Debug)]
pub struct QuestionBank {
    pub name: String,
    pub size: u32,
    pub questions: Vec<QuestionEntry>,
}

impl QuestionBank {
    pub fn new(file_name: String) -> Self {
        read_bank_from_file(format!("{file_name}.json")).unwrap()
    }
}

fn read_bank_from_file(file_name: String) -> Result<QuestionBank, Box<dyn Error>> {
    let file = TRIVIA_DIR
        .get_file(file_name)
        .expect("Question bank file not found");

    let file_as_str = file
        .contents_utf8()
        .expect("Unable to interpret file as a string");

    let bank = from_str(file_as_str).expect("Unable to deserialize question bank json");

    Ok(bank)
}
