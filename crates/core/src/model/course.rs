use serde::Serialize;
use thiserror::Error;

use crate::model::ids::CourseId;
use crate::model::quiz::{Quiz, QuizError};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CourseError {
    #[error("course must contain at least one section")]
    NoSections,

    #[error("section at position {position} has index {index}")]
    NonContiguousSection { position: u32, index: u32 },

    #[error("invalid quiz in section {section}: {source}")]
    Quiz {
        section: u32,
        #[source]
        source: QuizError,
    },
}

//
// ─── CONTENT ───────────────────────────────────────────────────────────────────
//

/// Presentation hint for a content block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    #[default]
    Text,
    Example,
    Raw,
}

impl BlockKind {
    /// Parses a block kind, treating anything unknown as `Raw`.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "text" => Self::Text,
            "example" => Self::Example,
            _ => Self::Raw,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Example => "example",
            Self::Raw => "raw",
        }
    }
}

/// Display-only content; carried through unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentBlock {
    pub title: String,
    pub body: String,
    pub kind: BlockKind,
}

impl ContentBlock {
    #[must_use]
    pub fn new(title: impl Into<String>, body: impl Into<String>, kind: BlockKind) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            kind,
        }
    }
}

//
// ─── SECTION ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    index: u32,
    title: String,
    content_blocks: Vec<ContentBlock>,
    quiz: Quiz,
}

impl Section {
    /// An empty title becomes `"Section {index}"`.
    #[must_use]
    pub fn new(
        index: u32,
        title: impl Into<String>,
        content_blocks: Vec<ContentBlock>,
        quiz: Quiz,
    ) -> Self {
        let mut title = title.into();
        if title.is_empty() {
            title = format!("Section {index}");
        }
        Self {
            index,
            title,
            content_blocks,
            quiz,
        }
    }

    /// 1-based position within the course.
    #[must_use]
    pub fn index(&self) -> u32 {
        self.index
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn content_blocks(&self) -> &[ContentBlock] {
        &self.content_blocks
    }

    #[must_use]
    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }
}

//
// ─── COURSE ────────────────────────────────────────────────────────────────────
//

/// Catalog metadata that does not influence progression.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CourseMeta {
    pub author: Option<String>,
    pub estimated_duration: Option<String>,
}

impl CourseMeta {
    /// Drops empty strings so that `Some("")` and `None` compare equal.
    #[must_use]
    pub fn canonical(self) -> Self {
        let present = |v: Option<String>| v.filter(|s| !s.is_empty());
        Self {
            author: present(self.author),
            estimated_duration: present(self.estimated_duration),
        }
    }
}

/// A normalized course. Section order is prerequisite order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Course {
    id: CourseId,
    title: String,
    description: String,
    meta: CourseMeta,
    sections: Vec<Section>,
}

impl Course {
    /// Creates a validated course. Empty metadata strings are stored as `None`.
    ///
    /// # Errors
    ///
    /// Returns `CourseError::NoSections` for an empty course and
    /// `CourseError::NonContiguousSection` unless section indexes run `1..=n`
    /// in order.
    pub fn new(
        id: CourseId,
        title: impl Into<String>,
        description: impl Into<String>,
        meta: CourseMeta,
        sections: Vec<Section>,
    ) -> Result<Self, CourseError> {
        if sections.is_empty() {
            return Err(CourseError::NoSections);
        }
        for (position, section) in (1_u32..).zip(&sections) {
            if section.index != position {
                return Err(CourseError::NonContiguousSection {
                    position,
                    index: section.index,
                });
            }
        }
        Ok(Self {
            id,
            title: title.into(),
            description: description.into(),
            meta: meta.canonical(),
            sections,
        })
    }

    /// Returns the same course under a different catalog id.
    #[must_use]
    pub fn with_id(mut self, id: CourseId) -> Self {
        self.id = id;
        self
    }

    #[must_use]
    pub fn id(&self) -> &CourseId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn meta(&self) -> &CourseMeta {
        &self.meta
    }

    #[must_use]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Number of sections; always at least one.
    #[must_use]
    pub fn section_count(&self) -> u32 {
        u32::try_from(self.sections.len()).unwrap_or(u32::MAX)
    }

    /// Looks up a section by its 1-based index.
    #[must_use]
    pub fn section(&self, index: u32) -> Option<&Section> {
        let pos = usize::try_from(index.checked_sub(1)?).ok()?;
        self.sections.get(pos)
    }

    /// Clamps an arbitrary section index into `1..=section_count`.
    #[must_use]
    pub fn clamp_index(&self, index: u32) -> u32 {
        index.clamp(1, self.section_count())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
