pub mod citation_parser;
pub mod grading;
pub mod narration;
pub mod quiz_parser;
pub mod rank;

pub use citation_parser::parse_citation;
pub use grading::{GradingError, GradingState, QuizGradingEngine, QuizOutcome};
pub use narration::{BackgroundAudio, NarrationController, NarrationState, SpeechEngine};
pub use quiz_parser::parse_quiz;
pub use rank::Rank;
