#![forbid(unsafe_code)]

pub mod error;
pub mod evaluator;
pub mod model;
pub mod normalize;
pub mod progression;
pub mod time;

pub use error::Error;
pub use evaluator::{Answers, Evaluation, EvaluationError, EvaluationResult, evaluate_quiz};
pub use normalize::{NormalizationError, RawCourse, ShapeKind, normalize, to_canonical_json};
pub use progression::{
    CourseView, Navigation, ProgressPercent, SectionState, compute_section_states, navigation,
    overall_progress,
};
pub use time::Clock;
