/// Correct answers out of the exercises in a lesson.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Score {
    pub correct: u32,
    pub total: u32,
}

impl Score {
    #[must_use]
    pub fn new(correct: u32, total: u32) -> Self {
        Self { correct, total }
    }

    /// `round(correct / total × 100)`; an empty lesson scores 0.
    #[must_use]
    pub fn percent(&self) -> u32 {
        percent_of(self.correct, self.total)
    }
}

/// Rounded percentage of `part` in `whole`, 0 when `whole` is 0.
#[must_use]
pub fn percent_of(part: u32, whole: u32) -> u32 {
    if whole == 0 {
        return 0;
    }
    let ratio = f64::from(part) / f64::from(whole) * 100.0;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let rounded = ratio.round() as u32;
    rounded
}
