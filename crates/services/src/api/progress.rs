use async_trait::async_trait;
use reqwest::Method;
use storage::repository::{LessonProgressRepository, StorageError, StudyStatsRepository};
use toeic_core::model::{
    FinishLessonRequest, LessonId, LessonProgress, MessageResponse, StartLessonRequest,
    StudyStatsUpdate, UpdateProgressRequest, UserId, UserStudyStats, WatchVideoRequest,
};

use super::ApiClient;

/// Progress service adapter: user-lesson records and study stats over HTTP.
#[derive(Clone, Debug)]
pub struct HttpProgressRepository {
    api: ApiClient,
}

impl HttpProgressRepository {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    fn lesson_path(user_id: UserId, lesson_id: LessonId, action: &str) -> String {
        format!("user-lessons/{user_id}/{lesson_id}/{action}")
    }
}

#[async_trait]
impl LessonProgressRepository for HttpProgressRepository {
    async fn start_lesson(
        &self,
        req: &StartLessonRequest,
    ) -> Result<LessonProgress, StorageError> {
        Ok(self
            .api
            .send_json(Method::POST, "user-lessons/start", req)
            .await?)
    }

    async fn get_lesson_progress(
        &self,
        user_id: UserId,
        lesson_id: LessonId,
    ) -> Result<Option<LessonProgress>, StorageError> {
        match self
            .api
            .get_json(&format!("user-lessons/{user_id}/{lesson_id}"))
            .await
        {
            Ok(progress) => Ok(Some(progress)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn list_lesson_progress(
        &self,
        user_id: UserId,
    ) -> Result<Vec<LessonProgress>, StorageError> {
        Ok(self.api.get_json(&format!("user-lessons/{user_id}")).await?)
    }

    async fn update_progress(
        &self,
        user_id: UserId,
        lesson_id: LessonId,
        req: UpdateProgressRequest,
    ) -> Result<MessageResponse, StorageError> {
        let path = Self::lesson_path(user_id, lesson_id, "progress");
        Ok(self.api.send_json(Method::PUT, &path, &req).await?)
    }

    async fn record_video_position(
        &self,
        user_id: UserId,
        lesson_id: LessonId,
        req: WatchVideoRequest,
    ) -> Result<MessageResponse, StorageError> {
        let path = Self::lesson_path(user_id, lesson_id, "watch");
        Ok(self.api.send_json(Method::PUT, &path, &req).await?)
    }

    async fn finish_lesson(
        &self,
        user_id: UserId,
        lesson_id: LessonId,
        req: FinishLessonRequest,
    ) -> Result<MessageResponse, StorageError> {
        let path = Self::lesson_path(user_id, lesson_id, "finish");
        Ok(self.api.send_json(Method::PUT, &path, &req).await?)
    }
}

#[async_trait]
impl StudyStatsRepository for HttpProgressRepository {
    async fn get_stats(&self, user_id: UserId) -> Result<Option<UserStudyStats>, StorageError> {
        match self
            .api
            .get_json(&format!("user-study-stats/{user_id}"))
            .await
        {
            Ok(stats) => Ok(Some(stats)),
            // No row until the first completed lesson.
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn save_stats(
        &self,
        user_id: UserId,
        update: StudyStatsUpdate,
    ) -> Result<(), StorageError> {
        self.api
            .send_json_discard(Method::PUT, &format!("user-study-stats/{user_id}"), &update)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lesson_paths_follow_user_then_lesson() {
        assert_eq!(
            HttpProgressRepository::lesson_path(UserId::new(4), LessonId::new(9), "finish"),
            "user-lessons/4/9/finish"
        );
    }
}
