use std::collections::HashMap;
use std::sync::Arc;

use storage::repository::{LessonProgressRepository, StudyStatsRepository};
use toeic_core::model::{
    CourseDetail, CourseId, LessonId, LessonProgress, ModuleId, User, UserStudyStats, percent_of,
};
use tracing::{debug, warn};

use crate::api::ContentSource;
use crate::error::DashboardError;

/// Completion of one module for the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleProgress {
    pub module_id: ModuleId,
    pub name: String,
    pub completed: u32,
    pub total: u32,
}

impl ModuleProgress {
    #[must_use]
    pub fn percent(&self) -> u32 {
        percent_of(self.completed, self.total)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseProgress {
    pub course_id: CourseId,
    pub name: String,
    pub modules: Vec<ModuleProgress>,
}

impl CourseProgress {
    #[must_use]
    pub fn completed(&self) -> u32 {
        self.modules.iter().map(|m| m.completed).sum()
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.modules.iter().map(|m| m.total).sum()
    }

    #[must_use]
    pub fn percent(&self) -> u32 {
        percent_of(self.completed(), self.total())
    }
}

/// Lesson-based totals for one learner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LearnerProgress {
    pub completed_lessons: u32,
    pub total_lessons: u32,
    /// Mean score over completed lessons that carry one.
    pub average_score: Option<u32>,
}

impl LearnerProgress {
    #[must_use]
    pub fn percent(&self) -> u32 {
        percent_of(self.completed_lessons, self.total_lessons)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardOverview {
    pub course_count: usize,
    pub module_count: usize,
    pub lesson_count: usize,
    /// Present only for a signed-in user.
    pub learner: Option<LearnerProgress>,
    pub stats: Option<UserStudyStats>,
    pub courses: Vec<CourseProgress>,
}

/// Builds the dashboard from the catalog and the user's lesson records.
#[derive(Clone)]
pub struct DashboardService {
    content: Arc<dyn ContentSource>,
    lessons: Arc<dyn LessonProgressRepository>,
    stats: Arc<dyn StudyStatsRepository>,
}

impl DashboardService {
    #[must_use]
    pub fn new(
        content: Arc<dyn ContentSource>,
        lessons: Arc<dyn LessonProgressRepository>,
        stats: Arc<dyn StudyStatsRepository>,
    ) -> Self {
        Self {
            content,
            lessons,
            stats,
        }
    }

    /// Catalog totals plus, when `user` is set, their progress rows.
    ///
    /// A course whose detail fails to load is left out of the totals.
    ///
    /// # Errors
    ///
    /// Returns `DashboardError` if the course list or the user's records
    /// cannot be loaded.
    pub async fn overview(&self, user: Option<&User>) -> Result<DashboardOverview, DashboardError> {
        let courses = self.content.courses().await?;
        let mut details = Vec::with_capacity(courses.len());
        for course in &courses {
            match self.content.course_detail(course.id).await {
                Ok(detail) => details.push(detail),
                Err(err) => warn!(course_id = %course.id, error = %err, "skipping course detail"),
            }
        }

        let module_count = details.iter().map(CourseDetail::module_count).sum();
        let lesson_count = details.iter().map(CourseDetail::lesson_count).sum();

        let (learner, stats, rows) = match user {
            Some(user) => {
                let records = self.lessons.list_lesson_progress(user.id).await?;
                let stats = self.stats.get_stats(user.id).await?;
                let learner = learner_progress(&records, lesson_count);
                (Some(learner), stats, course_rows(&details, &records))
            }
            None => (None, None, course_rows(&details, &[])),
        };
        debug!(
            courses = courses.len(),
            modules = module_count,
            lessons = lesson_count,
            "dashboard built"
        );

        Ok(DashboardOverview {
            course_count: courses.len(),
            module_count,
            lesson_count,
            learner,
            stats,
            courses: rows,
        })
    }
}

fn to_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

fn learner_progress(records: &[LessonProgress], lesson_count: usize) -> LearnerProgress {
    let completed: Vec<_> = records.iter().filter(|r| r.is_completed).collect();
    let scores: Vec<u32> = completed.iter().filter_map(|r| r.score).collect();
    let average_score = (!scores.is_empty()).then(|| {
        let sum: u64 = scores.iter().map(|s| u64::from(*s)).sum();
        let count = scores.len() as u64;
        u32::try_from((sum + count / 2) / count).unwrap_or(u32::MAX)
    });

    LearnerProgress {
        completed_lessons: to_u32(completed.len()),
        total_lessons: to_u32(lesson_count),
        average_score,
    }
}

fn course_rows(details: &[CourseDetail], records: &[LessonProgress]) -> Vec<CourseProgress> {
    let done: HashMap<LessonId, bool> = records
        .iter()
        .map(|r| (r.lesson_id, r.is_completed))
        .collect();

    details
        .iter()
        .map(|course| CourseProgress {
            course_id: course.id,
            name: course.name.clone(),
            modules: course
                .modules
                .iter()
                .map(|module| ModuleProgress {
                    module_id: module.id,
                    name: module.name.clone(),
                    completed: to_u32(
                        module
                            .lessons
                            .iter()
                            .filter(|l| done.get(&l.id).copied().unwrap_or(false))
                            .count(),
                    ),
                    total: to_u32(module.lessons.len()),
                })
                .collect(),
        })
        .collect()
}
