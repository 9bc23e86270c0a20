mod catalog;
mod ids;
mod lesson;
pub mod practice;
mod progress;
mod score;
mod user;

pub use catalog::{Course, CourseDetail, LessonSummary, Module};
pub use ids::{
    CourseId, ExerciseGroupId, ExerciseId, HighlightId, LessonId, ModuleId, NoteId, ParseIdError,
    UserId, VideoId,
};
pub use lesson::{
    Exercise, ExerciseDraft, ExerciseGroup, ExerciseGroupDraft, Lesson, LessonDraft,
    LessonValidationError, OptionKey, Video,
};
pub use practice::HighlightError;
pub use progress::{
    FinishLessonRequest, LessonProgress, MessageResponse, ProfileUpdate, StartLessonRequest,
    StudyStatsUpdate, UpdateProgressRequest, UserAchievement, UserGoal, UserProfile,
    UserStudyStats, WatchVideoRequest, newest_first,
};
pub use score::{Score, percent_of};
pub use user::{AuthResponse, LoginRequest, RegisterRequest, User};
