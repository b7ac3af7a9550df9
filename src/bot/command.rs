//! Slash command parsing

use std::fmt;
use std::str::FromStr;

use crate::channels::BotCommand;

/// Commands the bot understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Start,
    Help,
    Quiz,
    Cancel,
    SubscribeQuiz,
    UnsubscribeQuiz,
    SetLanguage,
    SendVocab,
    Meaning,
    Translate,
    GrammarCheck,
    Email,
    Letter,
    Essay,
    Summarise,
    Compose,
    Rewrite,
    Pronounce,
    StartSpeechPractice,
    StopSpeechPractice,
    Ticket,
    Ping,
    Stats,
    Dev,
    Broadcast,
    Subscribers,
}

impl Command {
    /// Every command, in help order
    pub const ALL: [Self; 26] = [
        Self::Start,
        Self::Help,
        Self::Quiz,
        Self::Cancel,
        Self::SubscribeQuiz,
        Self::UnsubscribeQuiz,
        Self::SetLanguage,
        Self::SendVocab,
        Self::Meaning,
        Self::Translate,
        Self::GrammarCheck,
        Self::Email,
        Self::Letter,
        Self::Essay,
        Self::Summarise,
        Self::Compose,
        Self::Rewrite,
        Self::Pronounce,
        Self::StartSpeechPractice,
        Self::StopSpeechPractice,
        Self::Ticket,
        Self::Ping,
        Self::Stats,
        Self::Dev,
        Self::Broadcast,
        Self::Subscribers,
    ];

    /// Name without the leading slash
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Help => "help",
            Self::Quiz => "quiz",
            Self::Cancel => "cancel",
            Self::SubscribeQuiz => "subscribe_quiz",
            Self::UnsubscribeQuiz => "unsubscribe_quiz",
            Self::SetLanguage => "set_language",
            Self::SendVocab => "send_vocab",
            Self::Meaning => "meaning",
            Self::Translate => "translate",
            Self::GrammarCheck => "grammar_check",
            Self::Email => "email",
            Self::Letter => "letter",
            Self::Essay => "essay",
            Self::Summarise => "summarise",
            Self::Compose => "compose",
            Self::Rewrite => "rewrite",
            Self::Pronounce => "pronounce",
            Self::StartSpeechPractice => "start_speech_practice",
            Self::StopSpeechPractice => "stop_speech_practice",
            Self::Ticket => "ticket",
            Self::Ping => "ping",
            Self::Stats => "stats",
            Self::Dev => "dev",
            Self::Broadcast => "broadcast",
            Self::Subscribers => "subscribers",
        }
    }

    /// Usage line shown in `/help` and the client's command menu
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Start => "Greeting message",
            Self::Help => "Show this help message",
            Self::Quiz => "Start a translation quiz",
            Self::Cancel => "Cancel the current quiz",
            Self::SubscribeQuiz => "Subscribe to hourly quizzes",
            Self::UnsubscribeQuiz => "Unsubscribe from hourly quizzes",
            Self::SetLanguage => "Set vocabulary language (english or german)",
            Self::SendVocab => "Improve vocabulary with random words",
            Self::Meaning => "Get definition and usage example of a word",
            Self::Translate => "Translate text",
            Self::GrammarCheck => "Check grammar",
            Self::Email => "Compose an email",
            Self::Letter => "Write a letter",
            Self::Essay => "Generate an essay",
            Self::Summarise => "Summarise text",
            Self::Compose => "Compose a text",
            Self::Rewrite => "Rewrite text",
            Self::Pronounce => "Pronounce text",
            Self::StartSpeechPractice => "Start speech practice",
            Self::StopSpeechPractice => "Stop speech practice",
            Self::Ticket => "Create an issue ticket",
            Self::Ping => "Check bot latency",
            Self::Stats => "Show system statistics",
            Self::Dev => "Show developer information",
            Self::Broadcast => "Send a quiz to all subscribers now (admin)",
            Self::Subscribers => "Show subscriber count (admin)",
        }
    }

    /// Only the configured admin may run this command
    #[must_use]
    pub const fn is_admin_only(self) -> bool {
        matches!(self, Self::Broadcast | Self::Subscribers)
    }

    /// Commands advertised to every user
    #[must_use]
    pub fn public_menu() -> Vec<BotCommand> {
        Self::ALL
            .iter()
            .filter(|c| !c.is_admin_only())
            .map(|c| BotCommand::new(c.name(), c.description()))
            .collect()
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.name())
    }
}

/// Unknown command name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCommand(pub String);

impl FromStr for Command {
    type Err = UnknownCommand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.to_ascii_lowercase();
        // "summarize" is accepted alongside the British spelling
        let name = if name == "summarize" { "summarise" } else { name.as_str() };

        Self::ALL
            .into_iter()
            .find(|c| c.name() == name)
            .ok_or_else(|| UnknownCommand(s.to_string()))
    }
}

/// A slash command with its argument text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub command: Command,
    /// Trimmed text after the command; empty if none
    pub args: String,
}

impl ParsedCommand {
    /// Argument text, or `None` if it is empty
    #[must_use]
    pub fn args(&self) -> Option<&str> {
        Some(self.args.as_str()).filter(|a| !a.is_empty())
    }
}

/// What a text message asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextInput {
    /// A known command
    Command(ParsedCommand),
    /// Slash-prefixed text that is not a known command, or is addressed to
    /// another bot
    Unknown(String),
    /// Plain text
    Plain(String),
}

/// Classify a text message
///
/// Accepts `/name`, `/name args` and `/name@bot args`. A `@bot` suffix that
/// names a different bot is treated as unknown.
#[must_use]
pub fn parse_input(text: &str, bot_username: Option<&str>) -> TextInput {
    let trimmed = text.trim();
    let Some(after_slash) = trimmed.strip_prefix('/') else {
        return TextInput::Plain(trimmed.to_string());
    };

    let head_end = after_slash
        .find(char::is_whitespace)
        .unwrap_or(after_slash.len());
    let head = &after_slash[..head_end];
    let args = after_slash[head_end..].trim().to_string();

    let (name, addressee) = match head.split_once('@') {
        Some((name, bot)) => (name, Some(bot)),
        None => (head, None),
    };

    if let (Some(addressee), Some(ours)) = (addressee, bot_username)
        && !addressee.eq_ignore_ascii_case(ours)
    {
        return TextInput::Unknown(head.to_string());
    }

    match name.parse::<Command>() {
        Ok(command) => TextInput::Command(ParsedCommand { command, args }),
        Err(UnknownCommand(name)) => TextInput::Unknown(name),
    }
}

/// Text of the `/help` reply
#[must_use]
pub fn help_text() -> String {
    let mut text = String::from("Available commands:\n");
    for command in Command::ALL.iter().filter(|c| !c.is_admin_only()) {
        text.push_str(&format!("{command} - {}\n", command.description()));
    }
    text
}
