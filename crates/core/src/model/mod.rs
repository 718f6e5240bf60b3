mod course;
mod enrollment;
mod ids;
mod progress;
mod quiz;

pub use course::{BlockKind, ContentBlock, Course, CourseError, CourseMeta, Section};
pub use enrollment::Enrollment;
pub use ids::{CourseId, EnrollmentId, ParseIdError, UserId};
pub use progress::UserProgress;
pub use quiz::{Question, Quiz, QuizError};
