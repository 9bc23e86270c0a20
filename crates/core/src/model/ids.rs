use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error type for parsing an id from string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    kind: &'static str,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {} from string", self.kind)
    }
}

impl std::error::Error for ParseIdError {}

// Remote services key everything by positive integers; each kind gets its own
// newtype so a lesson id can never be passed where a user id is expected.
macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(u64);

        impl $name {
            #[must_use]
            pub fn new(id: u64) -> Self {
                Self(id)
            }

            #[must_use]
            pub fn value(&self) -> u64 {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim()
                    .parse::<u64>()
                    .map(Self::new)
                    .map_err(|_| ParseIdError {
                        kind: stringify!($name),
                    })
            }
        }
    };
}

numeric_id!(
    /// Unique identifier for a Course
    CourseId
);
numeric_id!(
    /// Unique identifier for a Module inside a course
    ModuleId
);
numeric_id!(
    /// Unique identifier for a Lesson
    LessonId
);
numeric_id!(
    /// Unique identifier for an Exercise
    ExerciseId
);
numeric_id!(
    /// Unique identifier for a named exercise group
    ExerciseGroupId
);
numeric_id!(VideoId);
numeric_id!(
    /// Unique identifier for a registered user
    UserId
);
numeric_id!(NoteId);
numeric_id!(HighlightId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lesson_id_display() {
        assert_eq!(LessonId::new(42).to_string(), "42");
    }

    #[test]
    fn user_id_from_str() {
        let id: UserId = " 123 ".parse().unwrap();
        assert_eq!(id, UserId::new(123));
    }

    #[test]
    fn course_id_from_str_invalid() {
        let err = "not-a-number".parse::<CourseId>().unwrap_err();
        assert_eq!(err.to_string(), "failed to parse CourseId from string");
    }

    #[test]
    fn debug_names_the_kind() {
        assert_eq!(format!("{:?}", ExerciseId::new(7)), "ExerciseId(7)");
    }

    #[test]
    fn ids_serialize_as_plain_numbers() {
        let json = serde_json::to_string(&LessonId::new(9)).unwrap();
        assert_eq!(json, "9");
        let back: LessonId = serde_json::from_str("9").unwrap();
        assert_eq!(back, LessonId::new(9));
    }
}
