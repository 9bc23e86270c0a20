use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::{LessonId, UserId};
use crate::model::score::percent_of;

//
// ─── LESSON PROGRESS ───────────────────────────────────────────────────────────
//

/// Per-user record for one lesson, owned by the progress service.
///
/// Informational only: a new lesson visit never restores answers from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonProgress {
    pub user_id: UserId,
    pub lesson_id: LessonId,
    #[serde(default)]
    pub progress_percent: u32,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub score: Option<u32>,
    #[serde(default)]
    pub last_watched_second: Option<u32>,
    pub last_access: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartLessonRequest {
    pub user_id: UserId,
    pub lesson_id: LessonId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress_percent: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_watched_second: Option<u32>,
}

impl StartLessonRequest {
    #[must_use]
    pub fn new(user_id: UserId, lesson_id: LessonId) -> Self {
        Self {
            user_id,
            lesson_id,
            progress_percent: None,
            is_completed: None,
            score: None,
            last_watched_second: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProgressRequest {
    pub progress_percent: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchVideoRequest {
    pub last_watched_second: u32,
}

/// Body of `PUT .../finish`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinishLessonRequest {
    pub score: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: String,
}

//
// ─── STUDY STATS ───────────────────────────────────────────────────────────────
//

/// Aggregate counters shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct UserStudyStats {
    #[serde(default)]
    pub current_streak: u32,
    #[serde(default)]
    pub longest_streak: u32,
    #[serde(default)]
    pub total_study_hours: f64,
    #[serde(default)]
    pub completed_lessons: u32,
    #[serde(default)]
    pub predicted_score: u32,
    #[serde(default)]
    pub last_study_date: Option<NaiveDate>,
}

/// Body of `PUT user-study-stats/{userId}`.
///
/// Totals are computed client-side; the server stores them as-is.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StudyStatsUpdate {
    pub completed_lessons: u32,
    pub total_study_hours: f64,
}

impl StudyStatsUpdate {
    /// New totals after one more completed lesson that took `study_hours`.
    #[must_use]
    pub fn after_completion(current: Option<&UserStudyStats>, study_hours: f64) -> Self {
        let (completed, hours) = current
            .map_or((0, 0.0), |s| (s.completed_lessons, s.total_study_hours));
        Self {
            completed_lessons: completed.saturating_add(1),
            total_study_hours: hours + study_hours.max(0.0),
        }
    }
}

impl UserStudyStats {
    #[must_use]
    pub fn with_update(mut self, update: StudyStatsUpdate) -> Self {
        self.completed_lessons = update.completed_lessons;
        self.total_study_hours = update.total_study_hours;
        self
    }
}

//
// ─── PROFILE, GOALS & ACHIEVEMENTS ─────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// Body of `PUT profiles/{userId}`; unset fields are left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl ProfileUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.full_name.is_none() && self.avatar_url.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserGoal {
    pub id: u64,
    pub goal_type: String,
    pub target_value: u32,
    #[serde(default)]
    pub current_value: u32,
    #[serde(default)]
    pub completed: bool,
}

impl UserGoal {
    /// Progress towards the target, capped at 100.
    #[must_use]
    pub fn percent(&self) -> u32 {
        percent_of(self.current_value, self.target_value).min(100)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAchievement {
    pub id: u64,
    pub achievement_type: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub earned_at: DateTime<Utc>,
}

/// Sort achievements newest first; ties keep server order.
pub fn newest_first(achievements: &mut [UserAchievement]) {
    achievements.sort_by(|a, b| b.earned_at.cmp(&a.earned_at));
}
