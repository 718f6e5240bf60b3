use serde::Serialize;
use thiserror::Error;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("question id must not be empty")]
    EmptyQuestionId,

    #[error("question {0} must offer at least two options")]
    TooFewOptions(String),

    #[error("question {id} marks option {index} correct but only has {len} options")]
    CorrectAnswerOutOfRange { id: String, index: usize, len: usize },

    #[error("passing score {passing} exceeds the {questions} available questions")]
    PassingScoreTooHigh { passing: u32, questions: usize },

    #[error("question id {0} appears more than once")]
    DuplicateQuestionId(String),
}

//
// ─── QUESTION ─────────────────────────────────────────────────────────────────
//

/// A single multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    id: String,
    text: String,
    options: Vec<String>,
    correct_answer_index: usize,
}

impl Question {
    /// Creates a validated question.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::EmptyQuestionId` for an empty id,
    /// `QuizError::TooFewOptions` for fewer than two options and
    /// `QuizError::CorrectAnswerOutOfRange` when the index misses the options.
    pub fn new(
        id: impl Into<String>,
        text: impl Into<String>,
        options: Vec<String>,
        correct_answer_index: usize,
    ) -> Result<Self, QuizError> {
        let id = id.into();
        if id.is_empty() {
            return Err(QuizError::EmptyQuestionId);
        }
        if options.len() < 2 {
            return Err(QuizError::TooFewOptions(id));
        }
        if correct_answer_index >= options.len() {
            return Err(QuizError::CorrectAnswerOutOfRange {
                id,
                index: correct_answer_index,
                len: options.len(),
            });
        }
        Ok(Self {
            id,
            text: text.into(),
            options,
            correct_answer_index,
        })
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct_answer_index(&self) -> usize {
        self.correct_answer_index
    }

    /// Text of the correct option. Submissions are compared against this value.
    #[must_use]
    pub fn correct_answer(&self) -> &str {
        &self.options[self.correct_answer_index]
    }
}

//
// ─── QUIZ ─────────────────────────────────────────────────────────────────────
//

/// Quiz attached to a section.
///
/// `passing_score` is an absolute number of correct answers, not a percentage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Quiz {
    title: String,
    passing_score: u32,
    questions: Vec<Question>,
}

impl Quiz {
    /// Creates a validated quiz.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::PassingScoreTooHigh` if more correct answers are
    /// required than there are questions, or `QuizError::DuplicateQuestionId`
    /// when two questions share an id.
    pub fn new(
        title: impl Into<String>,
        passing_score: u32,
        questions: Vec<Question>,
    ) -> Result<Self, QuizError> {
        if usize::try_from(passing_score).map_or(true, |p| p > questions.len()) {
            return Err(QuizError::PassingScoreTooHigh {
                passing: passing_score,
                questions: questions.len(),
            });
        }
        for (pos, q) in questions.iter().enumerate() {
            if questions[..pos].iter().any(|prev| prev.id == q.id) {
                return Err(QuizError::DuplicateQuestionId(q.id.clone()));
            }
        }
        Ok(Self {
            title: title.into(),
            passing_score,
            questions,
        })
    }

    /// A quiz without questions; evaluating it always passes.
    #[must_use]
    pub fn empty(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            passing_score: 0,
            questions: Vec::new(),
        }
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn passing_score(&self) -> u32 {
        self.passing_score
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
