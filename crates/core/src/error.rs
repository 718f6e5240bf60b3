use thiserror::Error;

use crate::evaluator::EvaluationError;
use crate::model::CourseError;
use crate::normalize::NormalizationError;

/// Umbrella error for callers that do not care which core stage failed.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Course(#[from] CourseError),
    #[error(transparent)]
    Normalization(#[from] NormalizationError),
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
}
