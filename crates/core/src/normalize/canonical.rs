use serde_json::{Map, Value, json};

use super::ShapeKind;
use crate::model::{Course, Section};

/// Renders a course as a payload of the requested shape.
///
/// The output normalizes back to an equal `Course`, which is how courses are
/// persisted.
#[must_use]
pub fn to_canonical_json(course: &Course, shape: ShapeKind) -> Value {
    let sections: Vec<Value> = course
        .sections()
        .iter()
        .map(|section| section_json(section, shape))
        .collect();

    let mut header = Map::new();
    header.insert("id".into(), json!(course.id().as_str()));
    header.insert("title".into(), json!(course.title()));
    header.insert("description".into(), json!(course.description()));
    if let Some(author) = &course.meta().author {
        header.insert("author".into(), json!(author));
    }
    if let Some(duration) = &course.meta().estimated_duration {
        header.insert("estimatedDuration".into(), json!(duration));
    }

    match shape {
        ShapeKind::Flat => {
            header.insert("sections".into(), Value::Array(sections));
            Value::Object(header)
        }
        ShapeKind::Nested => {
            header.insert("content".into(), json!({ "sections": sections }));
            Value::Object(header)
        }
        ShapeKind::Prefixed => {
            header.insert("sections".into(), Value::Array(sections));
            json!({ "course": Value::Object(header) })
        }
    }
}

fn section_json(section: &Section, shape: ShapeKind) -> Value {
    let content: Vec<Value> = section
        .content_blocks()
        .iter()
        .map(|block| {
            json!({
                "title": block.title,
                "body": block.body,
                "type": block.kind.as_str(),
            })
        })
        .collect();

    let quiz = section.quiz();
    let questions: Vec<Value> = quiz
        .questions()
        .iter()
        .map(|q| {
            json!({
                "questionId": q.id(),
                "questionText": q.text(),
                "options": q.options(),
                "correctAnswer": q.correct_answer_index(),
            })
        })
        .collect();

    let mut out = Map::new();
    match shape {
        ShapeKind::Prefixed => {
            out.insert("id".into(), json!(format!("section{}", section.index())));
        }
        ShapeKind::Flat | ShapeKind::Nested => {
            out.insert("sectionId".into(), json!(section.index()));
        }
    }
    out.insert("title".into(), json!(section.title()));
    out.insert("content".into(), Value::Array(content));
    out.insert(
        "quiz".into(),
        json!({
            "title": quiz.title(),
            "passingScore": quiz.passing_score(),
            "questions": questions,
        }),
    );
    Value::Object(out)
}
