pub use snafu::ResultExt;

pub use crate::ai_generation::config::AiGenerationConfig;
pub use crate::ai_generation::dispatcher::CompletionDispatcher;
pub use crate::ai_generation::quiz_parser::extract_quiz_questions;
pub use crate::ai_generation::quiz_parser::ExtractionOutcome;
pub use crate::ai_generation::service::StudyAidService;
pub use crate::ai_generation::ChatMessage;
pub use crate::ai_generation::CompletionRequest;
pub use crate::ai_generation::StudyAidKind;
pub use crate::error::OrInvalid;
pub use crate::error::OrNotFound;
pub use crate::error::Result;
pub use crate::error::StudyError;
pub use crate::invalid_input;
pub use crate::quiz::Quiz;
pub use crate::quiz::QuizQuestion;
pub use crate::storage::NoteSource;
pub use crate::storage::QuizStore;
