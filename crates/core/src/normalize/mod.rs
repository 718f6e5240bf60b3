//! Turns the course payloads the backend has served over time into one
//! canonical [`Course`].
//!
//! Three shapes are known. They are probed in a fixed order (top-level
//! `sections`, then `content.sections`, then `course.sections`); the first
//! shape whose marker is present is then parsed strictly against its schema.

mod canonical;
mod shapes;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::model::{
    BlockKind, ContentBlock, Course, CourseError, CourseId, CourseMeta, Question, Quiz, Section,
};

pub use canonical::to_canonical_json;
pub use shapes::{CourseHeader, FlatShape, NestedShape, PrefixedShape, RawSection, SectionsBody};

use shapes::{RawAnswer, RawContentItem, RawId, RawQuestion, RawQuiz, value_text};

/// Passing score assumed when a quiz does not declare one.
pub const DEFAULT_PASSING_SCORE: u32 = 4;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum NormalizationError {
    #[error("course payload matches no known shape")]
    UnrecognizedShape,

    #[error("section id {0:?} does not contain a number")]
    InvalidSectionId(String),

    #[error("course payload is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("{shape} course payload is malformed: {message}")]
    Malformed { shape: ShapeKind, message: String },

    #[error("question {question} does not declare a correct answer")]
    MissingCorrectAnswer { question: String },

    #[error("question {question} names {answer:?} as correct but it is not an option")]
    UnknownCorrectAnswer { question: String, answer: String },

    #[error(transparent)]
    InvalidCourse(#[from] CourseError),
}

//
// ─── SHAPES ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    /// `{ "sections": [...] }`
    Flat,
    /// `{ "content": { "sections": [...] } }`
    Nested,
    /// `{ "course": { "sections": [...] } }`
    Prefixed,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 3] = [ShapeKind::Flat, ShapeKind::Nested, ShapeKind::Prefixed];

    /// Probes the payload for each shape's marker in priority order.
    #[must_use]
    pub fn detect(payload: &Value) -> Option<Self> {
        let has_sections = |v: Option<&Value>| {
            v.and_then(|v| v.get("sections"))
                .is_some_and(Value::is_array)
        };

        if has_sections(Some(payload)) {
            Some(Self::Flat)
        } else if has_sections(payload.get("content")) {
            Some(Self::Nested)
        } else if has_sections(payload.get("course")) {
            Some(Self::Prefixed)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Flat => "flat",
            Self::Nested => "nested",
            Self::Prefixed => "prefixed",
        }
    }
}

impl std::fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A payload parsed against exactly one known schema.
#[derive(Debug, Clone)]
pub enum RawCourse {
    Flat(FlatShape),
    Nested(NestedShape),
    Prefixed(PrefixedShape),
}

impl RawCourse {
    /// Detects the shape and parses the payload strictly against it.
    ///
    /// # Errors
    ///
    /// Returns `NormalizationError::UnrecognizedShape` when no marker is
    /// present and `NormalizationError::Malformed` when the detected schema
    /// does not fit.
    pub fn parse(payload: &Value) -> Result<Self, NormalizationError> {
        let shape = ShapeKind::detect(payload).ok_or(NormalizationError::UnrecognizedShape)?;
        let malformed = |err: serde_json::Error| NormalizationError::Malformed {
            shape,
            message: err.to_string(),
        };

        Ok(match shape {
            ShapeKind::Flat => Self::Flat(FlatShape::deserialize(payload).map_err(malformed)?),
            ShapeKind::Nested => {
                Self::Nested(NestedShape::deserialize(payload).map_err(malformed)?)
            }
            ShapeKind::Prefixed => {
                Self::Prefixed(PrefixedShape::deserialize(payload).map_err(malformed)?)
            }
        })
    }

    #[must_use]
    pub fn kind(&self) -> ShapeKind {
        match self {
            Self::Flat(_) => ShapeKind::Flat,
            Self::Nested(_) => ShapeKind::Nested,
            Self::Prefixed(_) => ShapeKind::Prefixed,
        }
    }

    /// Converts the parsed payload into a validated course.
    ///
    /// # Errors
    ///
    /// Returns `NormalizationError` if a section id or answer cannot be
    /// resolved, or the resulting course breaks a `Course` invariant.
    pub fn into_course(self) -> Result<Course, NormalizationError> {
        let (header, sections) = match self {
            Self::Flat(shape) => (shape.header, shape.sections),
            Self::Nested(shape) => (shape.content.header.or(shape.header), shape.content.sections),
            Self::Prefixed(shape) => (shape.course.header.or(shape.header), shape.course.sections),
        };
        build_course(&header, sections)
    }
}

//
// ─── ENTRY POINTS ──────────────────────────────────────────────────────────────
//

/// Normalizes a course payload of any known shape.
///
/// # Errors
///
/// See [`RawCourse::parse`] and [`RawCourse::into_course`].
pub fn normalize(payload: &Value) -> Result<Course, NormalizationError> {
    let raw = RawCourse::parse(payload)?;
    let shape = raw.kind();
    let course = raw.into_course()?;
    debug!(
        course_id = %course.id(),
        %shape,
        sections = course.sections().len(),
        "normalized course payload"
    );
    Ok(course)
}

/// Parses JSON text and normalizes it.
///
/// # Errors
///
/// Returns `NormalizationError::InvalidJson` for unparsable text, otherwise
/// as [`normalize`].
pub fn normalize_str(text: &str) -> Result<Course, NormalizationError> {
    let payload: Value =
        serde_json::from_str(text).map_err(|e| NormalizationError::InvalidJson(e.to_string()))?;
    normalize(&payload)
}

//
// ─── CONVERSION ────────────────────────────────────────────────────────────────
//

fn build_course(
    header: &CourseHeader,
    raw_sections: Vec<RawSection>,
) -> Result<Course, NormalizationError> {
    let mut sections = Vec::with_capacity(raw_sections.len());
    for (position, raw) in (1_u32..).zip(raw_sections) {
        sections.push(build_section(position, raw)?);
    }
    sections.sort_by_key(Section::index);

    let title = header.title().unwrap_or_default().to_owned();
    let id = header
        .course_id()
        .and_then(|raw| CourseId::new(raw).ok())
        .unwrap_or_else(|| slug_id(&title));
    let meta = CourseMeta {
        author: header.author.clone(),
        estimated_duration: header.estimated_duration().map(str::to_owned),
    };

    Ok(Course::new(
        id,
        title,
        header.description().unwrap_or_default(),
        meta,
        sections,
    )?)
}

fn build_section(position: u32, raw: RawSection) -> Result<Section, NormalizationError> {
    let index = match raw.section_id.as_ref().or(raw.id.as_ref()) {
        Some(id) => section_index(id)?,
        None => position,
    };
    let title = raw.title.unwrap_or_default();
    let blocks = raw
        .content
        .or(raw.content_blocks)
        .unwrap_or_default()
        .into_iter()
        .map(build_block)
        .collect();
    let quiz = match raw.quiz {
        Some(quiz) => build_quiz(quiz).map_err(|err| match err {
            QuizBuildError::Normalization(e) => e,
            QuizBuildError::Quiz(source) => CourseError::Quiz {
                section: index,
                source,
            }
            .into(),
        })?,
        None => Quiz::empty("Quiz"),
    };

    Ok(Section::new(index, title, blocks, quiz))
}

/// Reads a section index, keeping only the digits of textual ids such as
/// `"section3"`.
fn section_index(id: &RawId) -> Result<u32, NormalizationError> {
    let text = id.to_text();
    let digits: String = match id {
        RawId::Number(_) => text.clone(),
        RawId::Text(s) => s.chars().filter(char::is_ascii_digit).collect(),
    };
    digits
        .parse::<u32>()
        .ok()
        .filter(|n| *n > 0)
        .ok_or(NormalizationError::InvalidSectionId(text))
}

fn build_block(item: RawContentItem) -> ContentBlock {
    match item {
        RawContentItem::Plain(body) => ContentBlock::new("", body, BlockKind::Raw),
        RawContentItem::Block(block) => {
            let body = [block.body.as_ref(), block.data.as_ref()]
                .into_iter()
                .flatten()
                .map(value_text)
                .find(|s| !s.is_empty())
                .unwrap_or_default();
            let kind = block
                .block_type
                .as_deref()
                .or(block.kind.as_deref())
                .map_or(BlockKind::Text, BlockKind::parse);
            ContentBlock::new(block.title.unwrap_or_default(), body, kind)
        }
    }
}

enum QuizBuildError {
    Normalization(NormalizationError),
    Quiz(crate::model::QuizError),
}

fn build_quiz(raw: RawQuiz) -> Result<Quiz, QuizBuildError> {
    let mut questions = Vec::with_capacity(raw.questions.len());
    for (position, q) in (1_usize..).zip(raw.questions) {
        questions.push(build_question(position, q)?);
    }
    let available = u32::try_from(questions.len()).unwrap_or(u32::MAX);
    let passing = raw
        .passing_score
        .unwrap_or(DEFAULT_PASSING_SCORE)
        .min(available);
    Quiz::new(raw.title.unwrap_or_else(|| "Quiz".into()), passing, questions)
        .map_err(QuizBuildError::Quiz)
}

fn build_question(position: usize, raw: RawQuestion) -> Result<Question, QuizBuildError> {
    let id = raw
        .question_id
        .as_ref()
        .or(raw.id.as_ref())
        .map(RawId::to_text)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| format!("q{position}"));
    let text = raw
        .question_text
        .filter(|t| !t.is_empty())
        .or(raw.question)
        .unwrap_or_default();

    let correct = match (raw.correct_answer_index, raw.correct_answer) {
        (Some(index), _) | (None, Some(RawAnswer::Index(index))) => index,
        (None, Some(RawAnswer::Text(answer))) => raw
            .options
            .iter()
            .position(|opt| *opt == answer)
            .ok_or_else(|| {
                QuizBuildError::Normalization(NormalizationError::UnknownCorrectAnswer {
                    question: id.clone(),
                    answer,
                })
            })?,
        (None, None) => {
            return Err(QuizBuildError::Normalization(
                NormalizationError::MissingCorrectAnswer { question: id },
            ));
        }
    };

    Question::new(id, text, raw.options, correct).map_err(QuizBuildError::Quiz)
}

/// Derives a catalog id from the title when the payload carries none.
fn slug_id(title: &str) -> CourseId {
    let slug = title
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_ascii_uppercase)
        .collect::<Vec<_>>()
        .join("-");
    CourseId::new(slug).unwrap_or_else(|_| CourseId::placeholder())
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests;
