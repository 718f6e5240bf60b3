use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::{CourseId, EnrollmentId, UserId};

/// A learner's membership in a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: EnrollmentId,
    pub user_id: UserId,
    pub course_id: CourseId,
    pub enrolled_at: DateTime<Utc>,
    pub last_accessed_at: DateTime<Utc>,
    pub is_completed: bool,
}

impl Enrollment {
    #[must_use]
    pub fn new(
        id: EnrollmentId,
        user_id: UserId,
        course_id: CourseId,
        enrolled_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            course_id,
            enrolled_at,
            last_accessed_at: enrolled_at,
            is_completed: false,
        }
    }

    /// Records an access; timestamps never move backwards.
    pub fn touch(&mut self, at: DateTime<Utc>) {
        if at > self.last_accessed_at {
            self.last_accessed_at = at;
        }
    }
}
