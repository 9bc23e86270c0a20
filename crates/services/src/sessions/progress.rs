/// Where a lesson session stands, for rendering a progress bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionProgress {
    pub total: usize,
    /// Exercises whose answer has been checked.
    pub answered: usize,
    pub remaining: usize,
    pub is_complete: bool,
}

impl SessionProgress {
    /// Share of exercises already checked, rounded to a whole percent.
    #[must_use]
    pub fn percent(&self) -> u32 {
        let answered = u32::try_from(self.answered).unwrap_or(u32::MAX);
        let total = u32::try_from(self.total).unwrap_or(u32::MAX);
        toeic_core::model::percent_of(answered, total)
    }
}
