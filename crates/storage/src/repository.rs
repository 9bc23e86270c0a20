use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use toeic_core::Clock;
use toeic_core::FetchError;
use toeic_core::model::{
    FinishLessonRequest, LessonId, LessonProgress, MessageResponse, StartLessonRequest,
    StudyStatsUpdate, UpdateProgressRequest, User, UserId, UserStudyStats, WatchVideoRequest,
};

/// Errors surfaced by storage adapters, local or remote.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Per-user lesson records held by the progress service.
#[async_trait]
pub trait LessonProgressRepository: Send + Sync {
    /// Create the record on first interaction with a lesson.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    async fn start_lesson(&self, req: &StartLessonRequest)
    -> Result<LessonProgress, StorageError>;

    /// Fetch the record for one lesson, `None` if the user never opened it.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on adapter failures.
    async fn get_lesson_progress(
        &self,
        user_id: UserId,
        lesson_id: LessonId,
    ) -> Result<Option<LessonProgress>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on adapter failures.
    async fn list_lesson_progress(&self, user_id: UserId)
    -> Result<Vec<LessonProgress>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on adapter failures.
    async fn update_progress(
        &self,
        user_id: UserId,
        lesson_id: LessonId,
        req: UpdateProgressRequest,
    ) -> Result<MessageResponse, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on adapter failures.
    async fn record_video_position(
        &self,
        user_id: UserId,
        lesson_id: LessonId,
        req: WatchVideoRequest,
    ) -> Result<MessageResponse, StorageError>;

    /// Mark the lesson completed with its final score percentage.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on adapter failures.
    async fn finish_lesson(
        &self,
        user_id: UserId,
        lesson_id: LessonId,
        req: FinishLessonRequest,
    ) -> Result<MessageResponse, StorageError>;
}

/// Aggregate study counters.
#[async_trait]
pub trait StudyStatsRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` on adapter failures.
    async fn get_stats(&self, user_id: UserId) -> Result<Option<UserStudyStats>, StorageError>;

    /// Overwrite the totals (last write wins).
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on adapter failures.
    async fn save_stats(&self, user_id: UserId, update: StudyStatsUpdate)
    -> Result<(), StorageError>;
}

/// Locally persisted identity of the signed-in user.
#[async_trait]
pub trait AuthStore: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` on adapter failures.
    async fn load_user(&self) -> Result<Option<User>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on adapter failures.
    async fn save_user(&self, user: &User) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on adapter failures.
    async fn clear_user(&self) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    clock: Clock,
    lessons: Arc<Mutex<HashMap<(UserId, LessonId), LessonProgress>>>,
    stats: Arc<Mutex<HashMap<UserId, UserStudyStats>>>,
    user: Arc<Mutex<Option<User>>>,
}

fn poisoned<E: std::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    fn upsert_with<F>(&self, user_id: UserId, lesson_id: LessonId, apply: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut LessonProgress),
    {
        let now = self.clock.now();
        let mut guard = self.lessons.lock().map_err(poisoned)?;
        let entry = guard
            .entry((user_id, lesson_id))
            .or_insert_with(|| LessonProgress {
                user_id,
                lesson_id,
                progress_percent: 0,
                is_completed: false,
                score: None,
                last_watched_second: None,
                last_access: now,
            });
        apply(entry);
        entry.last_access = now;
        Ok(())
    }
}

fn ok_message(message: &str) -> MessageResponse {
    MessageResponse {
        message: message.to_owned(),
    }
}

#[async_trait]
impl LessonProgressRepository for InMemoryRepository {
    async fn start_lesson(
        &self,
        req: &StartLessonRequest,
    ) -> Result<LessonProgress, StorageError> {
        self.upsert_with(req.user_id, req.lesson_id, |p| {
            if let Some(percent) = req.progress_percent {
                p.progress_percent = percent;
            }
            if let Some(done) = req.is_completed {
                p.is_completed = done;
            }
            if req.score.is_some() {
                p.score = req.score;
            }
            if req.last_watched_second.is_some() {
                p.last_watched_second = req.last_watched_second;
            }
        })?;
        self.get_lesson_progress(req.user_id, req.lesson_id)
            .await?
            .ok_or(StorageError::NotFound)
    }

    async fn get_lesson_progress(
        &self,
        user_id: UserId,
        lesson_id: LessonId,
    ) -> Result<Option<LessonProgress>, StorageError> {
        let guard = self.lessons.lock().map_err(poisoned)?;
        Ok(guard.get(&(user_id, lesson_id)).cloned())
    }

    async fn list_lesson_progress(
        &self,
        user_id: UserId,
    ) -> Result<Vec<LessonProgress>, StorageError> {
        let guard = self.lessons.lock().map_err(poisoned)?;
        let mut out: Vec<_> = guard
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();
        out.sort_by_key(|p| p.lesson_id);
        Ok(out)
    }

    async fn update_progress(
        &self,
        user_id: UserId,
        lesson_id: LessonId,
        req: UpdateProgressRequest,
    ) -> Result<MessageResponse, StorageError> {
        self.upsert_with(user_id, lesson_id, |p| {
            p.progress_percent = req.progress_percent.min(100);
        })?;
        Ok(ok_message("progress updated"))
    }

    async fn record_video_position(
        &self,
        user_id: UserId,
        lesson_id: LessonId,
        req: WatchVideoRequest,
    ) -> Result<MessageResponse, StorageError> {
        self.upsert_with(user_id, lesson_id, |p| {
            p.last_watched_second = Some(req.last_watched_second);
        })?;
        Ok(ok_message("video position saved"))
    }

    async fn finish_lesson(
        &self,
        user_id: UserId,
        lesson_id: LessonId,
        req: FinishLessonRequest,
    ) -> Result<MessageResponse, StorageError> {
        self.upsert_with(user_id, lesson_id, |p| {
            p.is_completed = true;
            p.progress_percent = 100;
            p.score = Some(req.score);
        })?;
        Ok(ok_message("lesson finished"))
    }
}

#[async_trait]
impl StudyStatsRepository for InMemoryRepository {
    async fn get_stats(&self, user_id: UserId) -> Result<Option<UserStudyStats>, StorageError> {
        let guard = self.stats.lock().map_err(poisoned)?;
        Ok(guard.get(&user_id).cloned())
    }

    async fn save_stats(
        &self,
        user_id: UserId,
        update: StudyStatsUpdate,
    ) -> Result<(), StorageError> {
        let mut guard = self.stats.lock().map_err(poisoned)?;
        let current = guard.remove(&user_id).unwrap_or_default();
        guard.insert(user_id, current.with_update(update));
        Ok(())
    }
}

#[async_trait]
impl AuthStore for InMemoryRepository {
    async fn load_user(&self) -> Result<Option<User>, StorageError> {
        Ok(self.user.lock().map_err(poisoned)?.clone())
    }

    async fn save_user(&self, user: &User) -> Result<(), StorageError> {
        *self.user.lock().map_err(poisoned)? = Some(user.clone());
        Ok(())
    }

    async fn clear_user(&self) -> Result<(), StorageError> {
        *self.user.lock().map_err(poisoned)? = None;
        Ok(())
    }
}
