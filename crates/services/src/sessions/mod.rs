mod progress;
mod service;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use progress::SessionProgress;
pub use service::{Advance, AnswerFeedback, CompletionSummary, LessonSession, SessionPhase};
pub use workflow::{
    AdvanceOutcome, LessonPage, LessonSessionLoop, PendingPersistence, PersistenceReport,
};
