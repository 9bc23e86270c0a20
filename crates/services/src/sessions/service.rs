use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::fmt;
use toeic_core::model::{Exercise, ExerciseId, Lesson, LessonId, OptionKey, Score};
use toeic_core::time::hours_between;

use super::progress::SessionProgress;
use crate::error::SessionError;

//
// ─── PHASE ─────────────────────────────────────────────────────────────────────
//

/// Lifecycle phase of a lesson quiz.
///
/// `Idle` belongs to a lesson page whose content has not loaded yet; a
/// `LessonSession` itself is always in one of the other three.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionPhase {
    Idle,
    InProgress,
    Revealed,
    Completed,
}

impl SessionPhase {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SessionPhase::Idle => "idle",
            SessionPhase::InProgress => "in progress",
            SessionPhase::Revealed => "revealed",
            SessionPhase::Completed => "completed",
        }
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── OUTCOMES ──────────────────────────────────────────────────────────────────
//

/// What the user sees after checking an answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerFeedback {
    pub exercise_id: ExerciseId,
    pub selected: String,
    pub correct_option: OptionKey,
    pub is_correct: bool,
    pub explanation: String,
    /// False when this index had already been scored and the count did not move.
    pub counted: bool,
}

/// Final numbers of a finished lesson.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionSummary {
    pub lesson_id: LessonId,
    pub score: Score,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl CompletionSummary {
    #[must_use]
    pub fn percent(&self) -> u32 {
        self.score.percent()
    }

    /// Wall-clock time between session creation and completion.
    #[must_use]
    pub fn study_hours(&self) -> f64 {
        hours_between(self.started_at, self.completed_at)
    }
}

/// Result of `LessonSession::advance`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Next { index: usize },
    Completed(CompletionSummary),
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// Transient quiz state for one visit of a lesson page.
///
/// Owns the flattened exercise list for its whole life. The current index is
/// `< len` while answering and `== len` once completed; every index is scored
/// at most once.
#[derive(Debug, Clone)]
pub struct LessonSession {
    lesson_id: LessonId,
    exercises: Vec<Exercise>,
    current: usize,
    scored: BTreeSet<usize>,
    correct: u32,
    selection: Option<String>,
    revealed: bool,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl LessonSession {
    /// Start a session over `exercises`. An empty list is completed on the spot.
    #[must_use]
    pub fn new(lesson_id: LessonId, exercises: Vec<Exercise>, started_at: DateTime<Utc>) -> Self {
        let completed_at = exercises.is_empty().then_some(started_at);
        Self {
            lesson_id,
            exercises,
            current: 0,
            scored: BTreeSet::new(),
            correct: 0,
            selection: None,
            revealed: false,
            started_at,
            completed_at,
        }
    }

    /// Fresh session over every exercise of `lesson`, in group order.
    #[must_use]
    pub fn from_lesson(lesson: &Lesson, started_at: DateTime<Utc>) -> Self {
        Self::new(lesson.id, lesson.flattened_exercises(), started_at)
    }

    #[must_use]
    pub fn lesson_id(&self) -> LessonId {
        self.lesson_id
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        if self.completed_at.is_some() {
            SessionPhase::Completed
        } else if self.revealed {
            SessionPhase::Revealed
        } else {
            SessionPhase::InProgress
        }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completed_at.is_some()
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.exercises.len()
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_exercise(&self) -> Option<&Exercise> {
        if self.is_complete() {
            return None;
        }
        self.exercises.get(self.current)
    }

    #[must_use]
    pub fn selection(&self) -> Option<&str> {
        self.selection.as_deref()
    }

    #[must_use]
    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    #[must_use]
    pub fn scored_count(&self) -> usize {
        self.scored.len()
    }

    /// Correct answers so far out of all exercises. Valid in every phase.
    #[must_use]
    pub fn score(&self) -> Score {
        Score::new(
            self.correct,
            u32::try_from(self.exercises.len()).unwrap_or(u32::MAX),
        )
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let answered = self.scored.len();
        SessionProgress {
            total: self.exercises.len(),
            answered,
            remaining: self.exercises.len().saturating_sub(answered),
            is_complete: self.is_complete(),
        }
    }

    /// Set the pending choice for the current exercise.
    ///
    /// Any string is accepted; only an exact match with the correct key scores.
    /// An empty string clears the choice.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` once the session is completed.
    pub fn select_option(&mut self, option: impl Into<String>) -> Result<(), SessionError> {
        self.ensure_not_completed("select_option")?;
        let option = option.into();
        self.selection = (!option.is_empty()).then_some(option);
        Ok(())
    }

    /// Check the pending choice and reveal the answer.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` outside `InProgress` and
    /// `SessionError::NoSelection` if nothing was chosen.
    pub fn submit_answer(&mut self) -> Result<AnswerFeedback, SessionError> {
        let phase = self.phase();
        if phase != SessionPhase::InProgress {
            return Err(SessionError::InvalidState {
                operation: "submit_answer",
                phase,
            });
        }
        let Some(selected) = self.selection.clone() else {
            return Err(SessionError::NoSelection);
        };
        let Some(exercise) = self.exercises.get(self.current) else {
            return Err(SessionError::InvalidState {
                operation: "submit_answer",
                phase,
            });
        };

        let is_correct = exercise.is_correct(&selected);
        let feedback = AnswerFeedback {
            exercise_id: exercise.id(),
            selected,
            correct_option: exercise.correct_option(),
            is_correct,
            explanation: exercise.explanation().to_owned(),
            counted: self.scored.insert(self.current),
        };
        if feedback.counted && is_correct {
            self.correct += 1;
        }
        self.revealed = true;
        Ok(feedback)
    }

    /// Move past a revealed exercise; completes the session after the last one.
    ///
    /// `now` should come from the services layer clock.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` unless the current answer is revealed.
    pub fn advance(&mut self, now: DateTime<Utc>) -> Result<Advance, SessionError> {
        let phase = self.phase();
        if phase != SessionPhase::Revealed {
            return Err(SessionError::InvalidState {
                operation: "advance",
                phase,
            });
        }

        self.current += 1;
        self.selection = None;
        self.revealed = false;

        if self.current < self.exercises.len() {
            return Ok(Advance::Next {
                index: self.current,
            });
        }

        self.completed_at = Some(now);
        Ok(Advance::Completed(CompletionSummary {
            lesson_id: self.lesson_id,
            score: self.score(),
            started_at: self.started_at,
            completed_at: now,
        }))
    }

    fn ensure_not_completed(&self, operation: &'static str) -> Result<(), SessionError> {
        if self.is_complete() {
            return Err(SessionError::InvalidState {
                operation,
                phase: SessionPhase::Completed,
            });
        }
        Ok(())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
