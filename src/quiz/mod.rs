//! Translation quizzes
//!
//! Generation and parsing of questions, per-recipient answer sessions, the
//! subscriber registry and the periodic broadcast.

mod generator;
mod parser;
mod scheduler;
mod session;
mod subscriptions;

pub use generator::QuizGenerator;
pub use parser::{OPTION_COUNT, QuizQuestion, normalize_answer, parse_quiz};
pub use scheduler::{BroadcastScheduler, GENERATION_APOLOGY, QuizDelivery, TickReport};
pub use session::{AnswerOutcome, QuizSession, QuizSessionStore};
pub use subscriptions::{SubscribeOutcome, SubscriptionRegistry, UnsubscribeOutcome};
