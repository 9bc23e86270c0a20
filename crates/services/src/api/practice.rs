use reqwest::Method;
use toeic_core::FetchError;
use toeic_core::model::practice::{
    AddHighlightRequest, AddNoteRequest, DashboardStats, Dictation, FlashcardMasterRequest,
    GrammarExercise, HighlightResponse, ListeningPractice, NoteResponse, PracticeKind,
    PracticeSubmission, ReadingContent, UpdateHighlightRequest, UpdateNoteRequest, UserHighlight,
    UserNote, Vocabulary,
};
use toeic_core::model::{HighlightId, LessonId, MessageResponse, NoteId, UserId};

use super::ApiClient;

/// Pass-through client for the practice service: lesson drills, notes,
/// highlights, dashboard counters and practice progress.
#[derive(Clone, Debug)]
pub struct PracticeApi {
    api: ApiClient,
}

#[allow(clippy::missing_errors_doc)]
impl PracticeApi {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn vocabulary(&self, lesson_id: LessonId) -> Result<Vec<Vocabulary>, FetchError> {
        self.api.get_json(&format!("vocabulary/{lesson_id}")).await
    }

    pub async fn grammar(&self, lesson_id: LessonId) -> Result<Vec<GrammarExercise>, FetchError> {
        self.api.get_json(&format!("grammar/{lesson_id}")).await
    }

    pub async fn listening(
        &self,
        lesson_id: LessonId,
    ) -> Result<Vec<ListeningPractice>, FetchError> {
        self.api.get_json(&format!("listening/{lesson_id}")).await
    }

    pub async fn dictation(&self, lesson_id: LessonId) -> Result<Vec<Dictation>, FetchError> {
        self.api.get_json(&format!("dictation/{lesson_id}")).await
    }

    pub async fn reading(&self, lesson_id: LessonId) -> Result<ReadingContent, FetchError> {
        self.api.get_json(&format!("reading/{lesson_id}")).await
    }

    // ─── notes ────────────────────────────────────────────────────────────

    pub async fn notes(
        &self,
        user_id: UserId,
        lesson_id: LessonId,
    ) -> Result<Vec<UserNote>, FetchError> {
        self.api
            .get_json(&format!("user-notes/{user_id}/{lesson_id}"))
            .await
    }

    pub async fn add_note(&self, req: &AddNoteRequest) -> Result<NoteResponse, FetchError> {
        self.api.send_json(Method::POST, "user-notes/add", req).await
    }

    pub async fn update_note(
        &self,
        id: NoteId,
        req: &UpdateNoteRequest,
    ) -> Result<NoteResponse, FetchError> {
        self.api
            .send_json(Method::PUT, &format!("user-notes/update/{id}"), req)
            .await
    }

    pub async fn delete_note(&self, id: NoteId) -> Result<MessageResponse, FetchError> {
        self.api.delete_json(&format!("user-notes/delete/{id}")).await
    }

    // ─── highlights ───────────────────────────────────────────────────────

    pub async fn highlights(
        &self,
        user_id: UserId,
        lesson_id: LessonId,
    ) -> Result<Vec<UserHighlight>, FetchError> {
        self.api
            .get_json(&format!("user-highlights/{user_id}/{lesson_id}"))
            .await
    }

    pub async fn add_highlight(
        &self,
        req: &AddHighlightRequest,
    ) -> Result<HighlightResponse, FetchError> {
        self.api
            .send_json(Method::POST, "user-highlights/add", req)
            .await
    }

    pub async fn update_highlight(
        &self,
        id: HighlightId,
        req: &UpdateHighlightRequest,
    ) -> Result<HighlightResponse, FetchError> {
        self.api
            .send_json(Method::PUT, &format!("user-highlights/update/{id}"), req)
            .await
    }

    pub async fn delete_highlight(&self, id: HighlightId) -> Result<MessageResponse, FetchError> {
        self.api
            .delete_json(&format!("user-highlights/delete/{id}"))
            .await
    }

    // ─── dashboard & progress ─────────────────────────────────────────────

    pub async fn dashboard_stats(&self, user_id: UserId) -> Result<DashboardStats, FetchError> {
        self.api
            .get_json(&format!("dashboard-stats/summary/{user_id}"))
            .await
    }

    pub async fn submit_practice(&self, submission: &PracticeSubmission) -> Result<(), FetchError> {
        let path = format!("user-progress/{}/submit", submission.kind.path_segment());
        self.api
            .send_json_discard(Method::POST, &path, &submission.to_body())
            .await
    }

    pub async fn master_flashcard(&self, req: &FlashcardMasterRequest) -> Result<(), FetchError> {
        self.api
            .send_json_discard(Method::POST, "user-progress/flashcard/master", req)
            .await
    }

    /// Number of items of `kind` the user has finished.
    pub async fn completed_count(
        &self,
        kind: PracticeKind,
        user_id: UserId,
    ) -> Result<u32, FetchError> {
        self.api
            .get_json(&format!(
                "user-progress/{}/completed/{user_id}",
                kind.path_segment()
            ))
            .await
    }

    pub async fn mastered_flashcards(&self, user_id: UserId) -> Result<u32, FetchError> {
        self.api
            .get_json(&format!("user-progress/flashcard/mastered/{user_id}"))
            .await
    }
}
