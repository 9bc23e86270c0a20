use std::sync::Arc;

use storage::repository::{LessonProgressRepository, StorageError, StudyStatsRepository};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use toeic_core::model::{FinishLessonRequest, Lesson, LessonId, StudyStatsUpdate, User, UserId};
use toeic_core::{Clock, FetchState};
use tracing::{info, warn};

use super::service::{Advance, AnswerFeedback, CompletionSummary, LessonSession, SessionPhase};
use crate::api::ContentSource;
use crate::error::SessionError;
use crate::notify::Notifier;

pub(crate) const PROGRESS_NOT_SAVED: &str = "progress not saved";
pub(crate) const LOGIN_TO_SAVE: &str = "log in to keep your progress";

/// A lesson view: the loaded content and, once loaded, its quiz session.
#[derive(Debug)]
pub struct LessonPage {
    pub lesson: FetchState<Lesson>,
    pub session: Option<LessonSession>,
}

impl LessonPage {
    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.session
            .as_ref()
            .map_or(SessionPhase::Idle, LessonSession::phase)
    }
}

/// Outcome of advancing through the workflow.
#[derive(Debug)]
pub enum AdvanceOutcome {
    Next { index: usize },
    Completed {
        summary: CompletionSummary,
        persistence: PendingPersistence,
    },
}

/// What happened to the two completion writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PersistenceReport {
    /// False when nobody was signed in and nothing was sent.
    pub attempted: bool,
    pub lesson_saved: bool,
    pub stats_saved: bool,
}

/// Handles to the background completion writes.
///
/// Dropping it leaves the writes running; `wait` is only for callers that want
/// to know how they went before exiting.
#[derive(Debug, Default)]
pub struct PendingPersistence {
    lesson: Option<JoinHandle<bool>>,
    stats: Option<JoinHandle<bool>>,
}

impl PendingPersistence {
    fn skipped() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_attempted(&self) -> bool {
        self.lesson.is_some() || self.stats.is_some()
    }

    pub async fn wait(self) -> PersistenceReport {
        let attempted = self.is_attempted();
        PersistenceReport {
            attempted,
            lesson_saved: join(self.lesson).await,
            stats_saved: join(self.stats).await,
        }
    }
}

async fn join(handle: Option<JoinHandle<bool>>) -> bool {
    match handle {
        Some(handle) => handle.await.unwrap_or(false),
        None => false,
    }
}

/// Loads lessons into sessions and fires the completion writes.
#[derive(Clone)]
pub struct LessonSessionLoop {
    clock: Clock,
    content: Arc<dyn ContentSource>,
    lessons: Arc<dyn LessonProgressRepository>,
    stats: Arc<dyn StudyStatsRepository>,
    notifier: Notifier,
}

impl LessonSessionLoop {
    #[must_use]
    pub fn new(
        clock: Clock,
        content: Arc<dyn ContentSource>,
        lessons: Arc<dyn LessonProgressRepository>,
        stats: Arc<dyn StudyStatsRepository>,
        notifier: Notifier,
    ) -> Self {
        Self {
            clock,
            content,
            lessons,
            stats,
            notifier,
        }
    }

    #[must_use]
    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Load a lesson and its theory, then start a fresh session.
    ///
    /// Load failures end up in `LessonPage::lesson` and the notifier; theory
    /// failures only drop the theory.
    pub async fn open_lesson(&self, lesson_id: LessonId) -> LessonPage {
        let lesson = match self.content.lesson(lesson_id).await {
            Ok(lesson) => lesson,
            Err(err) => {
                warn!(%lesson_id, error = %err, "lesson load failed");
                self.notifier.error(format!("could not load lesson: {err}"));
                return LessonPage {
                    lesson: FetchState::Failed(err),
                    session: None,
                };
            }
        };

        let theory = match self.content.theory(&lesson.title).await {
            Ok(theory) => theory,
            Err(err) => {
                warn!(%lesson_id, error = %err, "theory unavailable");
                None
            }
        };
        let lesson = lesson.with_theory(theory);
        let session = self.start(&lesson);

        LessonPage {
            lesson: FetchState::Ok(lesson),
            session: Some(session),
        }
    }

    /// Fresh session for `lesson`. Earlier completions are never restored.
    #[must_use]
    pub fn start(&self, lesson: &Lesson) -> LessonSession {
        let session = LessonSession::from_lesson(lesson, self.clock.now());
        info!(
            lesson_id = %lesson.id,
            exercises = session.total(),
            phase = %session.phase(),
            "session started"
        );
        session
    }

    /// Check the current answer; a missing choice is reported to the user too.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoSelection` or `SessionError::InvalidState`.
    pub fn submit_answer(
        &self,
        session: &mut LessonSession,
    ) -> Result<AnswerFeedback, SessionError> {
        session.submit_answer().inspect_err(|err| {
            if err.is_validation() {
                self.notifier.info(err.to_string());
            }
        })
    }

    /// Move on; after the last exercise, record the result in the background.
    ///
    /// Persistence never fails this call. With no `user`, nothing is sent and
    /// the visitor is asked to log in instead.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` unless the answer is revealed.
    pub fn advance(
        &self,
        session: &mut LessonSession,
        user: Option<&User>,
    ) -> Result<AdvanceOutcome, SessionError> {
        match session.advance(self.clock.now())? {
            Advance::Next { index } => Ok(AdvanceOutcome::Next { index }),
            Advance::Completed(summary) => {
                let persistence = self.complete(summary, user);
                Ok(AdvanceOutcome::Completed {
                    summary,
                    persistence,
                })
            }
        }
    }

    fn complete(&self, summary: CompletionSummary, user: Option<&User>) -> PendingPersistence {
        let score = summary.score;
        info!(
            lesson_id = %summary.lesson_id,
            correct = score.correct,
            total = score.total,
            percent = score.percent(),
            "lesson completed"
        );
        self.notifier.success(format!(
            "lesson complete: {}/{} correct ({}%)",
            score.correct,
            score.total,
            score.percent()
        ));

        let Some(user) = user else {
            self.notifier.info(LOGIN_TO_SAVE);
            return PendingPersistence::skipped();
        };

        let Ok(handle) = Handle::try_current() else {
            warn!(lesson_id = %summary.lesson_id, "no async runtime for completion writes");
            self.notifier.warning(PROGRESS_NOT_SAVED);
            return PendingPersistence::skipped();
        };

        let lesson = {
            let lessons = Arc::clone(&self.lessons);
            let notifier = self.notifier.clone();
            let user_id = user.id;
            handle.spawn(async move {
                let result = lessons
                    .finish_lesson(
                        user_id,
                        summary.lesson_id,
                        FinishLessonRequest {
                            score: summary.percent(),
                        },
                    )
                    .await
                    .map(|_| ());
                report("finish lesson", summary.lesson_id, result, &notifier)
            })
        };

        let stats = {
            let repo = Arc::clone(&self.stats);
            let notifier = self.notifier.clone();
            let user_id = user.id;
            handle.spawn(async move {
                let result = save_stats(repo.as_ref(), user_id, summary.study_hours()).await;
                report("study stats", summary.lesson_id, result, &notifier)
            })
        };

        PendingPersistence {
            lesson: Some(lesson),
            stats: Some(stats),
        }
    }
}

async fn save_stats(
    repo: &dyn StudyStatsRepository,
    user_id: UserId,
    study_hours: f64,
) -> Result<(), StorageError> {
    let current = repo.get_stats(user_id).await?;
    let update = StudyStatsUpdate::after_completion(current.as_ref(), study_hours);
    repo.save_stats(user_id, update).await
}

fn report(
    what: &'static str,
    lesson_id: LessonId,
    result: Result<(), StorageError>,
    notifier: &Notifier,
) -> bool {
    match result {
        Ok(()) => {
            info!(%lesson_id, what, "completion saved");
            true
        }
        Err(err) => {
            warn!(%lesson_id, what, error = %err, "completion write failed");
            notifier.warning(format!("{PROGRESS_NOT_SAVED}: {err}"));
            false
        }
    }
}
