use async_trait::async_trait;
use serde::Deserialize;
use toeic_core::FetchError;
use toeic_core::model::{Course, CourseDetail, CourseId, Lesson, LessonDraft, LessonId};
use tracing::debug;

use super::{ApiClient, Body, decode};

/// Read-only course content: catalog, lesson detail and generated theory.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// # Errors
    ///
    /// Returns `FetchError` if the request fails.
    async fn courses(&self) -> Result<Vec<Course>, FetchError>;

    /// # Errors
    ///
    /// Returns `FetchError` if the request fails.
    async fn course_detail(&self, id: CourseId) -> Result<CourseDetail, FetchError>;

    /// Lesson detail, validated before it reaches a session.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Decode` for malformed or invalid payloads.
    async fn lesson(&self, id: LessonId) -> Result<Lesson, FetchError>;

    /// Theory text for a lesson title, `None` if the service had nothing.
    ///
    /// # Errors
    ///
    /// Returns `FetchError` if the request fails.
    async fn theory(&self, lesson_title: &str) -> Result<Option<String>, FetchError>;
}

#[derive(Debug, Deserialize)]
struct TheoryPayload {
    #[serde(default)]
    theory: Option<String>,
}

/// HTTP client for the content and theory services.
#[derive(Clone, Debug)]
pub struct CourseApi {
    content: ApiClient,
    theory: ApiClient,
}

impl CourseApi {
    #[must_use]
    pub fn new(content: ApiClient, theory: ApiClient) -> Self {
        Self { content, theory }
    }
}

#[async_trait]
impl ContentSource for CourseApi {
    async fn courses(&self) -> Result<Vec<Course>, FetchError> {
        self.content.get_json("courses").await
    }

    async fn course_detail(&self, id: CourseId) -> Result<CourseDetail, FetchError> {
        self.content.get_json(&format!("courses/{id}")).await
    }

    async fn lesson(&self, id: LessonId) -> Result<Lesson, FetchError> {
        let draft: LessonDraft = self.content.get_json(&format!("lessons/{id}")).await?;
        let lesson = draft
            .validate()
            .map_err(|e| FetchError::Decode(e.to_string()))?;
        debug!(lesson_id = %id, exercises = lesson.exercise_count(), "lesson loaded");
        Ok(lesson)
    }

    async fn theory(&self, lesson_title: &str) -> Result<Option<String>, FetchError> {
        let body = self
            .theory
            .get_body("grammar/generate", &[("titleLesson", lesson_title)])
            .await?;
        theory_from_body(&body)
    }
}

fn theory_from_body(body: &Body) -> Result<Option<String>, FetchError> {
    let text = match body {
        Body::Json(_) => decode::<TheoryPayload>(body)?.theory,
        Body::Text(text) => Some(text.clone()),
    };
    Ok(text.filter(|t| !t.trim().is_empty()))
}
