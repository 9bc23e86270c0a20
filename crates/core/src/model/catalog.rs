use serde::{Deserialize, Serialize};

use crate::model::ids::{CourseId, LessonId, ModuleId};

/// Entry of the course listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    pub name: String,
}

/// Lesson reference as it appears inside a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonSummary {
    pub id: LessonId,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub id: ModuleId,
    pub name: String,
    #[serde(default)]
    pub lessons: Vec<LessonSummary>,
}

/// A course with its ordered modules and lessons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseDetail {
    pub id: CourseId,
    pub name: String,
    #[serde(default)]
    pub modules: Vec<Module>,
}

impl CourseDetail {
    #[must_use]
    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    #[must_use]
    pub fn lesson_count(&self) -> usize {
        self.modules.iter().map(|m| m.lessons.len()).sum()
    }

    /// Lesson ids in course order (module order, then lesson order).
    pub fn lesson_ids(&self) -> impl Iterator<Item = LessonId> + '_ {
        self.modules
            .iter()
            .flat_map(|m| m.lessons.iter().map(|l| l.id))
    }
}
