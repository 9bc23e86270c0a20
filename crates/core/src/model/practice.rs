use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{HighlightId, LessonId, NoteId, UserId};

//
// ─── PRACTICE CONTENT ──────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vocabulary {
    pub id: u64,
    pub lesson_id: LessonId,
    pub word: String,
    pub meaning: String,
    #[serde(default)]
    pub example: Option<String>,
    #[serde(default)]
    pub phonetic: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrammarExercise {
    pub id: u64,
    pub lesson_id: LessonId,
    pub question: String,
    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,
    pub correct_answer: String,
    #[serde(default)]
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListeningPractice {
    pub id: u64,
    pub lesson_id: LessonId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub audio_url: Option<String>,
    pub transcript: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingPassage {
    pub id: u64,
    pub lesson_id: LessonId,
    pub title: String,
    pub content_html: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingQuestion {
    pub id: u64,
    pub passage_id: u64,
    pub question: String,
    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,
    pub correct_option: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadingContent {
    pub passage: ReadingPassage,
    #[serde(default)]
    pub questions: Vec<ReadingQuestion>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dictation {
    pub id: u64,
    pub lesson_id: LessonId,
    pub audio_text: String,
    pub correct_text: String,
}

//
// ─── NOTES & HIGHLIGHTS ────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserNote {
    #[serde(default)]
    pub id: Option<NoteId>,
    pub user_id: UserId,
    pub lesson_id: LessonId,
    pub note: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddNoteRequest {
    pub user_id: UserId,
    pub lesson_id: LessonId,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateNoteRequest {
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NoteResponse {
    #[serde(default)]
    pub message: String,
    pub note: UserNote,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum HighlightError {
    #[error("highlight range is empty or reversed ({start}..{end})")]
    InvalidRange { start: u32, end: u32 },
}

/// Character range `[start_index, end_index)` of a lesson text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighlightRange {
    pub start_index: u32,
    pub end_index: u32,
}

impl HighlightRange {
    /// # Errors
    ///
    /// Returns `HighlightError::InvalidRange` unless `start < end`.
    pub fn new(start_index: u32, end_index: u32) -> Result<Self, HighlightError> {
        if start_index >= end_index {
            return Err(HighlightError::InvalidRange {
                start: start_index,
                end: end_index,
            });
        }
        Ok(Self {
            start_index,
            end_index,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserHighlight {
    #[serde(default)]
    pub id: Option<HighlightId>,
    pub user_id: UserId,
    pub lesson_id: LessonId,
    pub start_index: u32,
    pub end_index: u32,
    pub color: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddHighlightRequest {
    pub user_id: UserId,
    pub lesson_id: LessonId,
    #[serde(flatten)]
    pub range: HighlightRange,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateHighlightRequest {
    #[serde(flatten)]
    pub range: HighlightRange,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HighlightResponse {
    #[serde(default)]
    pub message: String,
    pub highlight: UserHighlight,
}

//
// ─── DASHBOARD STATS & PRACTICE PROGRESS ───────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    #[serde(default)]
    pub vocabulary_count: u32,
    #[serde(default)]
    pub notes_count: u32,
    #[serde(default)]
    pub highlights_count: u32,
    #[serde(default)]
    pub grammar_completed: u32,
    #[serde(default)]
    pub reading_completed: u32,
    #[serde(default)]
    pub listening_completed: u32,
    #[serde(default)]
    pub flashcard_mastered: u32,
}

/// Which practice track a submission belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PracticeKind {
    Grammar,
    Reading,
    Listening,
}

impl PracticeKind {
    #[must_use]
    pub fn path_segment(self) -> &'static str {
        match self {
            PracticeKind::Grammar => "grammar",
            PracticeKind::Reading => "reading",
            PracticeKind::Listening => "listening",
        }
    }

    fn item_field(self) -> &'static str {
        match self {
            PracticeKind::Grammar => "grammarExerciseId",
            PracticeKind::Reading => "readingPassageId",
            PracticeKind::Listening => "listeningPracticeId",
        }
    }
}

/// Submission of one finished practice item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PracticeSubmission {
    pub kind: PracticeKind,
    pub user_id: UserId,
    pub item_id: u64,
    pub score: Option<u32>,
}

impl PracticeSubmission {
    /// JSON body in the shape the progress endpoint expects for `kind`.
    #[must_use]
    pub fn to_body(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut body = serde_json::Map::new();
        body.insert("userId".into(), self.user_id.value().into());
        body.insert(self.kind.item_field().into(), self.item_id.into());
        if let Some(score) = self.score {
            body.insert("score".into(), score.into());
        }
        body
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlashcardMasterRequest {
    pub user_id: UserId,
    pub flashcard_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_count: Option<u32>,
}
