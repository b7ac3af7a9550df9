//! Prompt text sent to the text backend

use crate::backends::ChatMessage;
use crate::language::LanguageProfile;

/// System prompt for general tutoring replies
pub const TUTOR_SYSTEM: &str =
    "You are a helpful assistant that specializes in English language tutoring.";

/// System prompt for `/grammar_check`
pub const GRAMMAR_SYSTEM: &str = "You are an expert English grammar checker. Correct the \
     following text and return the corrected version. If there are no errors, return 'No \
     corrections needed.' followed by the original text.";

/// Temperature for grammar correction
pub const GRAMMAR_TEMPERATURE: f32 = 0.3;

/// A tutoring conversation for a single user prompt
#[must_use]
pub fn tutor(prompt: impl Into<String>) -> [ChatMessage; 2] {
    [ChatMessage::system(TUTOR_SYSTEM), ChatMessage::user(prompt)]
}

/// Grammar correction conversation
#[must_use]
pub fn grammar(text: &str) -> [ChatMessage; 2] {
    [ChatMessage::system(GRAMMAR_SYSTEM), ChatMessage::user(text)]
}

/// Translation request
#[must_use]
pub fn translate(text: &str, target: &LanguageProfile) -> [ChatMessage; 1] {
    [ChatMessage::user(format!(
        "Translate the following text to {}: '{text}'.",
        target.name
    ))]
}

/// Definition and example sentence prompts for a vocabulary word
#[must_use]
pub fn vocabulary(word: &str, language: &LanguageProfile) -> (String, String) {
    if language == LanguageProfile::english() {
        (
            format!("Define '{word}' in one sentence:"),
            format!("Generate a sentence using '{word}'"),
        )
    } else {
        let name = language.name;
        (
            format!("Define '{word}' in {name} in one sentence:"),
            format!("Generate a {name} sentence using '{word}'"),
        )
    }
}

/// `/meaning` prompt
#[must_use]
pub fn meaning(word: &str) -> String {
    format!(
        "Please provide the meaning/definition and a usage example for the German or English \
         word '{word}' in the following format:\n\
         Word: [insert word]\n\
         Definition: [insert definition]\n\
         Use-Case: [insert sentence example]"
    )
}

/// `/pronounce` prompt
#[must_use]
pub fn pronounce(text: &str) -> String {
    format!("Teach me how to pronounce '{text}'. Explain it in simple English in 2-3 lines.")
}

/// `/ticket` prompt
#[must_use]
pub fn ticket(issue: &str) -> String {
    format!("Explain the user's problem in clear technical language:\n\nUser Message: {issue}")
}

/// Speech practice feedback prompt for a transcript
#[must_use]
pub fn speech_practice(transcript: &str) -> String {
    format!(
        "You are an experienced English tutor helping a student improve their speaking skills. \
         The student has just said: '{transcript}'. Provide constructive feedback on their \
         pronunciation, grammar, and vocabulary usage. Encourage them to elaborate on their \
         thoughts or ask a follow-up question to continue the conversation."
    )
}

/// Writing commands that wrap the user's text in a fixed template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WritingTask {
    Email,
    Letter,
    Essay,
    Summarise,
    Compose,
    Rewrite,
}

impl WritingTask {
    /// Fill the template with the user's input
    #[must_use]
    pub fn prompt(self, info: &str) -> String {
        match self {
            Self::Email => {
                format!("Please write an email on the following information/context: {info}")
            }
            Self::Letter => format!(
                "Please write a letter on the following information/context in 50 words: {info}"
            ),
            Self::Essay => format!(
                "Please write me an essay on '{info}' in 4000 symbols. Use high-quality \
                 vocabulary and maintain simple language. Also, mention the approximate word \
                 count."
            ),
            Self::Summarise => {
                format!("Please write a summary of the following information/paragraph: {info}")
            }
            Self::Compose => format!(
                "Compose a {info} using high-quality English or German vocabulary with no \
                 grammatical errors. Make it sound original."
            ),
            Self::Rewrite => format!(
                "Rewrite the following text using high-quality English or German vocabulary \
                 with no grammatical errors. Make it sound original:\n\n{info}"
            ),
        }
    }
}
