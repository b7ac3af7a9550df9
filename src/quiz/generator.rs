//! Quiz question generation through the text backend

use std::sync::Arc;

use super::parser::{QuizQuestion, parse_quiz};
use crate::backends::{ChatMessage, GenerativeTextBackend};
use crate::error::BackendKind;
use crate::language::LanguageProfile;
use crate::{Error, Result};

/// Sampling temperature for quiz generation
const QUIZ_TEMPERATURE: f32 = 0.5;

/// Asks the text backend for translation quizzes
pub struct QuizGenerator {
    backend: Arc<dyn GenerativeTextBackend>,
    prompt_language: &'static LanguageProfile,
    target_language: &'static LanguageProfile,
}

impl QuizGenerator {
    /// Quizzes show a sentence in `prompt_language` and ask for `target_language`
    #[must_use]
    pub fn new(
        backend: Arc<dyn GenerativeTextBackend>,
        prompt_language: &'static LanguageProfile,
        target_language: &'static LanguageProfile,
    ) -> Self {
        Self {
            backend,
            prompt_language,
            target_language,
        }
    }

    /// Language the prompt sentence is spoken in
    #[must_use]
    pub const fn prompt_language(&self) -> &'static LanguageProfile {
        self.prompt_language
    }

    /// Language the answer is expected in
    #[must_use]
    pub const fn target_language(&self) -> &'static LanguageProfile {
        self.target_language
    }

    fn messages(&self) -> [ChatMessage; 2] {
        let source = self.prompt_language.display_name();
        let target = self.target_language.display_name();

        [
            ChatMessage::system(format!(
                "Generate a short {source} sentence (5-10 words) and provide its {target} \
                 translation. Also, provide three incorrect {target} translations.\n\
                 Answer with exactly five lines and nothing else:\n\
                 {source}: <sentence>\n\
                 Correct {target}: <translation>\n\
                 Incorrect {target}: <wrong translation>\n\
                 Incorrect {target}: <wrong translation>\n\
                 Incorrect {target}: <wrong translation>"
            )),
            ChatMessage::user("Generate a quiz question."),
        ]
    }

    /// Generate and parse one question
    ///
    /// # Errors
    ///
    /// Returns `Error::Backend` if generation fails, or `Error::Parse` if the
    /// reply is not a usable quiz
    pub async fn generate(&self) -> Result<QuizQuestion> {
        let raw = self
            .backend
            .complete(&self.messages(), QUIZ_TEMPERATURE)
            .await
            .map_err(|e| match e {
                Error::Backend { .. } => e,
                other => Error::backend(BackendKind::Generation, None, other.to_string()),
            })?;

        parse_quiz(&raw).inspect_err(|e| {
            tracing::warn!(error = %e, "generated quiz was unusable");
        })
    }
}
