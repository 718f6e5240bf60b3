//! Strict schemas for the course payload shapes the backend has served.
//!
//! Field names follow the JSON as served; several fields have two spellings
//! because the course files were authored independently.

use serde::Deserialize;
use serde_json::Value;

/// Section or question id that may arrive as a number or a string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawId {
    Number(i64),
    Text(String),
}

impl RawId {
    pub(crate) fn to_text(&self) -> String {
        match self {
            RawId::Number(n) => n.to_string(),
            RawId::Text(s) => s.clone(),
        }
    }
}

/// Course-level fields shared by every shape.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseHeader {
    pub(crate) id: Option<RawId>,
    pub(crate) course_id: Option<RawId>,
    #[serde(rename = "course_id")]
    pub(crate) course_id_snake: Option<RawId>,
    pub(crate) title: Option<String>,
    pub(crate) course_title: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) course_description: Option<String>,
    pub(crate) author: Option<String>,
    pub(crate) estimated_duration: Option<String>,
    #[serde(rename = "estimated_duration")]
    pub(crate) estimated_duration_snake: Option<String>,
    pub(crate) estimated_completion_time: Option<String>,
}

impl CourseHeader {
    /// Fills every missing field from `fallback`.
    pub(crate) fn or(self, fallback: CourseHeader) -> CourseHeader {
        CourseHeader {
            id: self.id.or(fallback.id),
            course_id: self.course_id.or(fallback.course_id),
            course_id_snake: self.course_id_snake.or(fallback.course_id_snake),
            title: self.title.or(fallback.title),
            course_title: self.course_title.or(fallback.course_title),
            description: self.description.or(fallback.description),
            course_description: self.course_description.or(fallback.course_description),
            author: self.author.or(fallback.author),
            estimated_duration: self.estimated_duration.or(fallback.estimated_duration),
            estimated_duration_snake: self
                .estimated_duration_snake
                .or(fallback.estimated_duration_snake),
            estimated_completion_time: self
                .estimated_completion_time
                .or(fallback.estimated_completion_time),
        }
    }

    pub(crate) fn course_id(&self) -> Option<String> {
        [&self.course_id, &self.course_id_snake, &self.id]
            .into_iter()
            .flatten()
            .map(RawId::to_text)
            .find(|s| !s.trim().is_empty())
    }

    pub(crate) fn title(&self) -> Option<&str> {
        first_present([self.title.as_deref(), self.course_title.as_deref()])
    }

    pub(crate) fn description(&self) -> Option<&str> {
        first_present([
            self.description.as_deref(),
            self.course_description.as_deref(),
        ])
    }

    pub(crate) fn estimated_duration(&self) -> Option<&str> {
        first_present([
            self.estimated_duration.as_deref(),
            self.estimated_duration_snake.as_deref(),
            self.estimated_completion_time.as_deref(),
        ])
    }
}

fn first_present<const N: usize>(candidates: [Option<&str>; N]) -> Option<&str> {
    candidates.into_iter().flatten().find(|s| !s.is_empty())
}

/// `{ "sections": [...] }`
#[derive(Debug, Clone, Deserialize)]
pub struct FlatShape {
    #[serde(flatten)]
    pub(crate) header: CourseHeader,
    pub(crate) sections: Vec<RawSection>,
}

/// `{ "content": { "sections": [...] } }`
#[derive(Debug, Clone, Deserialize)]
pub struct NestedShape {
    #[serde(flatten)]
    pub(crate) header: CourseHeader,
    pub(crate) content: SectionsBody,
}

/// `{ "course": { "sections": [...] } }` with ids like `"section3"`.
#[derive(Debug, Clone, Deserialize)]
pub struct PrefixedShape {
    #[serde(flatten)]
    pub(crate) header: CourseHeader,
    pub(crate) course: SectionsBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SectionsBody {
    #[serde(flatten)]
    pub(crate) header: CourseHeader,
    pub(crate) sections: Vec<RawSection>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSection {
    pub(crate) section_id: Option<RawId>,
    pub(crate) id: Option<RawId>,
    pub(crate) title: Option<String>,
    pub(crate) content: Option<Vec<RawContentItem>>,
    pub(crate) content_blocks: Option<Vec<RawContentItem>>,
    pub(crate) quiz: Option<RawQuiz>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawContentItem {
    Plain(String),
    Block(RawBlock),
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawBlock {
    pub(crate) title: Option<String>,
    pub(crate) body: Option<Value>,
    pub(crate) data: Option<Value>,
    #[serde(rename = "type")]
    pub(crate) block_type: Option<String>,
    pub(crate) kind: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawQuiz {
    pub(crate) title: Option<String>,
    pub(crate) passing_score: Option<u32>,
    #[serde(default)]
    pub(crate) questions: Vec<RawQuestion>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawQuestion {
    pub(crate) question_id: Option<RawId>,
    pub(crate) id: Option<RawId>,
    pub(crate) question_text: Option<String>,
    pub(crate) question: Option<String>,
    #[serde(default)]
    pub(crate) options: Vec<String>,
    pub(crate) correct_answer_index: Option<usize>,
    pub(crate) correct_answer: Option<RawAnswer>,
}

/// `correctAnswer` is either an option index or the option's text.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawAnswer {
    Index(usize),
    Text(String),
}

/// Flattens a body/data value into display text.
pub(crate) fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(value_text)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n"),
        other => other.to_string(),
    }
}
