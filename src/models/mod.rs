pub mod citation;
pub mod profile;
pub mod quiz;
pub mod tutor;

pub use citation::Citation;
pub use profile::{AuthSession, HistoryEntry, SignUpOutcome, UserProfile};
pub use quiz::{AnswerLetter, QuizAttempt, QuizQuestion};
pub use tutor::{Language, Mode, ModeToggles, QuizRequest, QuizResponse, TeachRequest, TutorResponse};
