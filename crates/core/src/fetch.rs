use crate::error::FetchError;

/// Outcome of a remote load as seen by views and the session workflow.
///
/// Replaces scattered `loading`/`error` flags with a single tagged value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FetchState<T> {
    #[default]
    Pending,
    Ok(T),
    Failed(FetchError),
}

impl<T> FetchState<T> {
    #[must_use]
    pub fn from_result(result: Result<T, FetchError>) -> Self {
        match result {
            Ok(value) => Self::Ok(value),
            Err(err) => Self::Failed(err),
        }
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    #[must_use]
    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Ok(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn error(&self) -> Option<&FetchError> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> FetchState<U> {
        match self {
            Self::Pending => FetchState::Pending,
            Self::Ok(value) => FetchState::Ok(f(value)),
            Self::Failed(err) => FetchState::Failed(err),
        }
    }
}

impl<T> From<Result<T, FetchError>> for FetchState<T> {
    fn from(result: Result<T, FetchError>) -> Self {
        Self::from_result(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_pending() {
        let state: FetchState<u32> = FetchState::default();
        assert!(state.is_pending());
        assert!(state.data().is_none());
    }

    #[test]
    fn result_maps_to_variants() {
        let ok: FetchState<u32> = Ok(3).into();
        assert_eq!(ok.data(), Some(&3));

        let failed: FetchState<u32> = FetchState::from_result(Err(FetchError::Transport(
            "offline".into(),
        )));
        assert!(matches!(failed.error(), Some(FetchError::Transport(_))));
    }

    #[test]
    fn map_keeps_failure() {
        let failed: FetchState<u32> = FetchState::Failed(FetchError::Decode("bad".into()));
        let mapped = failed.map(|v| v * 2);
        assert!(mapped.error().is_some());

        let ok = FetchState::Ok(2).map(|v| v * 2);
        assert_eq!(ok, FetchState::Ok(4));
    }
}
