//! Quiz question parsing
//!
//! Generated quiz text is loosely structured: one field per line, usually
//! with a label such as `English:` or `Incorrect Ukrainian:`. Parsing turns it
//! into a validated [`QuizQuestion`] or an [`Error::Parse`].

use std::sync::LazyLock;

use rand::seq::SliceRandom;
use regex::Regex;

use crate::{Error, Result};

/// Answer options shown per question
pub const OPTION_COUNT: usize = 4;

/// Lines a usable quiz needs: sentence, correct answer and three distractors
const REQUIRED_FIELDS: usize = OPTION_COUNT + 1;

/// Leading list markers and field labels that are not part of the content
static LABEL_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(?:\d+\s*[.)]\s*|[-*•]\s*)?(?:\*\*)?(?:english|ukrainian|german|correct|incorrect|wrong|sentence|translation|distractor|option|answer|quiz|question)\b[^:\n]{0,40}:(?:\*\*)?\s*",
    )
    .expect("valid regex")
});

/// Bare list markers left when a line has no label
static LIST_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:\d+\s*[.)]|[-*•])\s+").expect("valid regex"));

/// A translation question with one correct option
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizQuestion {
    prompt_sentence: String,
    correct_answer: String,
    options: [String; OPTION_COUNT],
}

impl QuizQuestion {
    /// Build a question, shuffling the correct answer in among the distractors
    ///
    /// # Errors
    ///
    /// Returns `Error::Parse` if a field is empty or a distractor matches the
    /// correct answer after normalization
    pub fn new(
        prompt_sentence: impl Into<String>,
        correct_answer: impl Into<String>,
        distractors: [String; OPTION_COUNT - 1],
    ) -> Result<Self> {
        let prompt_sentence = prompt_sentence.into().trim().to_string();
        let correct_answer = correct_answer.into().trim().to_string();

        if prompt_sentence.is_empty() || correct_answer.is_empty() {
            return Err(Error::Parse("quiz sentence and answer must not be empty".to_string()));
        }

        let normalized_correct = normalize_answer(&correct_answer);
        for distractor in &distractors {
            if distractor.trim().is_empty() {
                return Err(Error::Parse("quiz distractor must not be empty".to_string()));
            }
            if normalize_answer(distractor) == normalized_correct {
                return Err(Error::Parse(
                    "quiz distractor duplicates the correct answer".to_string(),
                ));
            }
        }

        let [d1, d2, d3] = distractors;
        let mut options = [
            correct_answer.clone(),
            d1.trim().to_string(),
            d2.trim().to_string(),
            d3.trim().to_string(),
        ];
        options.shuffle(&mut rand::thread_rng());

        Ok(Self {
            prompt_sentence,
            correct_answer,
            options,
        })
    }

    /// Sentence to translate
    #[must_use]
    pub fn prompt_sentence(&self) -> &str {
        &self.prompt_sentence
    }

    #[must_use]
    pub fn correct_answer(&self) -> &str {
        &self.correct_answer
    }

    /// All options in display order
    #[must_use]
    pub const fn options(&self) -> &[String; OPTION_COUNT] {
        &self.options
    }

    /// Whether `answer` matches the correct answer (trimmed, case-insensitive)
    #[must_use]
    pub fn is_correct(&self, answer: &str) -> bool {
        normalize_answer(answer) == normalize_answer(&self.correct_answer)
    }

    /// Numbered option list for display
    #[must_use]
    pub fn options_text(&self) -> String {
        self.options
            .iter()
            .enumerate()
            .map(|(i, option)| format!("{}. {option}", i + 1))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Normalize an answer for comparison
#[must_use]
pub fn normalize_answer(answer: &str) -> String {
    answer.trim().to_lowercase()
}

/// Strip list markers, labels and wrapping quotes from one line
fn clean_line(line: &str) -> &str {
    let without_label = match LABEL_PREFIX.find(line) {
        Some(m) => &line[m.end()..],
        None => match LIST_MARKER.find(line) {
            Some(m) => &line[m.end()..],
            None => line,
        },
    };

    let trimmed = without_label.trim();
    trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .map_or(trimmed, str::trim)
}

/// Parse generated text into a question
///
/// The first five usable lines are taken in order as sentence, correct
/// answer and three distractors. Extra lines are ignored.
///
/// # Errors
///
/// Returns `Error::Parse` when fewer than five usable lines are present or
/// the fields fail validation
pub fn parse_quiz(raw: &str) -> Result<QuizQuestion> {
    let fields: Vec<&str> = raw
        .lines()
        .map(clean_line)
        .filter(|line| !line.is_empty())
        .take(REQUIRED_FIELDS)
        .collect();

    let [sentence, correct, d1, d2, d3] = fields[..] else {
        return Err(Error::Parse(format!(
            "expected {REQUIRED_FIELDS} quiz lines, found {}",
            fields.len()
        )));
    };

    QuizQuestion::new(
        sentence,
        correct,
        [d1.to_string(), d2.to_string(), d3.to_string()],
    )
}
