use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::{ExerciseGroupId, ExerciseId, LessonId, VideoId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LessonValidationError {
    #[error("lesson title cannot be empty")]
    EmptyTitle,

    #[error("exercise {exercise} has an empty question")]
    EmptyQuestion { exercise: ExerciseId },

    #[error("exercise {exercise} has invalid correct option {raw:?}")]
    InvalidCorrectOption { exercise: ExerciseId, raw: String },
}

//
// ─── OPTION KEYS ───────────────────────────────────────────────────────────────
//

/// Label of one of the four answer choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OptionKey {
    A,
    B,
    C,
    D,
}

impl OptionKey {
    pub const ALL: [OptionKey; 4] = [OptionKey::A, OptionKey::B, OptionKey::C, OptionKey::D];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            OptionKey::A => "A",
            OptionKey::B => "B",
            OptionKey::C => "C",
            OptionKey::D => "D",
        }
    }

    fn index(self) -> usize {
        match self {
            OptionKey::A => 0,
            OptionKey::B => 1,
            OptionKey::C => 2,
            OptionKey::D => 3,
        }
    }
}

impl fmt::Display for OptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exact, case-sensitive parse: only `"A"`..`"D"` are keys.
impl FromStr for OptionKey {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(OptionKey::A),
            "B" => Ok(OptionKey::B),
            "C" => Ok(OptionKey::C),
            "D" => Ok(OptionKey::D),
            _ => Err(()),
        }
    }
}

//
// ─── WIRE SHAPES ───────────────────────────────────────────────────────────────
//

/// Lesson detail exactly as the content service sends it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonDraft {
    pub id: LessonId,
    pub title: String,
    #[serde(default)]
    pub videos: Vec<Video>,
    #[serde(default)]
    pub exercise_types: Vec<ExerciseGroupDraft>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseGroupDraft {
    pub id: ExerciseGroupId,
    pub name: String,
    #[serde(default)]
    pub exercises: Vec<ExerciseDraft>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseDraft {
    pub id: ExerciseId,
    pub question: String,
    #[serde(default)]
    pub option_a: String,
    #[serde(default)]
    pub option_b: String,
    #[serde(default)]
    pub option_c: String,
    #[serde(default)]
    pub option_d: String,
    pub correct_option: String,
    #[serde(default)]
    pub explanation: String,
}

impl LessonDraft {
    /// Validate the wire payload into a domain `Lesson`.
    ///
    /// # Errors
    ///
    /// Returns `LessonValidationError` if the title is blank, a question is blank,
    /// or a correct option is not one of `A`–`D`.
    pub fn validate(self) -> Result<Lesson, LessonValidationError> {
        let title = self.title.trim().to_owned();
        if title.is_empty() {
            return Err(LessonValidationError::EmptyTitle);
        }

        let groups = self
            .exercise_types
            .into_iter()
            .map(ExerciseGroupDraft::validate)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Lesson {
            id: self.id,
            title,
            videos: self.videos,
            groups,
            theory: None,
        })
    }
}

impl ExerciseGroupDraft {
    fn validate(self) -> Result<ExerciseGroup, LessonValidationError> {
        let exercises = self
            .exercises
            .into_iter()
            .map(ExerciseDraft::validate)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ExerciseGroup {
            id: self.id,
            name: self.name,
            exercises,
        })
    }
}

impl ExerciseDraft {
    fn validate(self) -> Result<Exercise, LessonValidationError> {
        if self.question.trim().is_empty() {
            return Err(LessonValidationError::EmptyQuestion { exercise: self.id });
        }
        let correct = self.correct_option.parse::<OptionKey>().map_err(|()| {
            LessonValidationError::InvalidCorrectOption {
                exercise: self.id,
                raw: self.correct_option.clone(),
            }
        })?;

        Ok(Exercise {
            id: self.id,
            question: self.question,
            options: [self.option_a, self.option_b, self.option_c, self.option_d],
            correct,
            explanation: self.explanation,
        })
    }
}

//
// ─── DOMAIN ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: VideoId,
    pub title: String,
    pub file_path: String,
}

impl Video {
    /// Embeddable form of the video link.
    ///
    /// Google Drive file and folder links are rewritten to their preview forms;
    /// anything else is returned unchanged.
    #[must_use]
    pub fn embed_url(&self) -> String {
        if let Some(file_id) = drive_segment(&self.file_path, "/file/d/") {
            return format!("https://drive.google.com/file/d/{file_id}/preview");
        }
        if let Some(folder_id) = drive_segment(&self.file_path, "/folders/") {
            return format!("https://drive.google.com/embeddedfolderview?id={folder_id}#grid");
        }
        self.file_path.clone()
    }
}

fn drive_segment<'a>(url: &'a str, marker: &str) -> Option<&'a str> {
    let start = url.find(marker)? + marker.len();
    let rest = &url[start..];
    let end = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '-'))
        .unwrap_or(rest.len());
    (end > 0).then(|| &rest[..end])
}

/// A single multiple-choice question with exactly one correct option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exercise {
    id: ExerciseId,
    question: String,
    options: [String; 4],
    correct: OptionKey,
    explanation: String,
}

impl Exercise {
    #[must_use]
    pub fn new(
        id: ExerciseId,
        question: impl Into<String>,
        options: [String; 4],
        correct: OptionKey,
        explanation: impl Into<String>,
    ) -> Self {
        Self {
            id,
            question: question.into(),
            options,
            correct,
            explanation: explanation.into(),
        }
    }

    #[must_use]
    pub fn id(&self) -> ExerciseId {
        self.id
    }

    #[must_use]
    pub fn question(&self) -> &str {
        &self.question
    }

    #[must_use]
    pub fn option(&self, key: OptionKey) -> &str {
        &self.options[key.index()]
    }

    #[must_use]
    pub fn correct_option(&self) -> OptionKey {
        self.correct
    }

    #[must_use]
    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    /// Exact, case-sensitive comparison against the correct option key.
    #[must_use]
    pub fn is_correct(&self, selection: &str) -> bool {
        selection == self.correct.as_str()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExerciseGroup {
    pub id: ExerciseGroupId,
    pub name: String,
    pub exercises: Vec<Exercise>,
}

/// Validated lesson content. Read-only for the lifetime of a lesson view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lesson {
    pub id: LessonId,
    pub title: String,
    pub videos: Vec<Video>,
    pub groups: Vec<ExerciseGroup>,
    pub theory: Option<String>,
}

impl Lesson {
    /// All exercises in group order, then exercise order within each group.
    #[must_use]
    pub fn flattened_exercises(&self) -> Vec<Exercise> {
        self.groups
            .iter()
            .flat_map(|g| g.exercises.iter().cloned())
            .collect()
    }

    #[must_use]
    pub fn exercise_count(&self) -> usize {
        self.groups.iter().map(|g| g.exercises.len()).sum()
    }

    #[must_use]
    pub fn with_theory(mut self, theory: Option<String>) -> Self {
        self.theory = theory.filter(|t| !t.trim().is_empty());
        self
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
