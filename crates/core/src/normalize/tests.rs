use serde_json::json;

use super::*;

fn stock_market_payload() -> Value {
    json!({
        "courseId": "BSM001",
        "courseTitle": "Basics of Stock Market",
        "courseDescription": "Learn how exchanges work.",
        "author": "Financial Education Team",
        "estimatedDuration": "2 hours",
        "sections": [
            {
                "sectionId": 1,
                "title": "What is a stock?",
                "content": [
                    { "title": "Ownership", "data": "A share is a slice of a company." },
                    { "title": "Example", "body": "Buying 10 shares of ACME.", "type": "example" }
                ],
                "quiz": {
                    "title": "Stocks 101",
                    "passingScore": 1,
                    "questions": [
                        {
                            "questionId": "s1q1",
                            "questionText": "A stock represents?",
                            "options": ["Debt", "Ownership"],
                            "correctAnswer": 1
                        }
                    ]
                }
            },
            {
                "sectionId": 2,
                "title": "Exchanges",
                "content": ["Plain paragraph"],
                "quiz": {
                    "questions": [
                        {
                            "id": "s2q1",
                            "question": "NSE is an?",
                            "options": ["Exchange", "Broker"],
                            "correctAnswer": "Exchange"
                        }
                    ]
                }
            }
        ]
    })
}

#[test]
fn detects_shapes_in_priority_order() {
    assert_eq!(
        ShapeKind::detect(&json!({ "sections": [] })),
        Some(ShapeKind::Flat)
    );
    assert_eq!(
        ShapeKind::detect(&json!({ "content": { "sections": [] } })),
        Some(ShapeKind::Nested)
    );
    assert_eq!(
        ShapeKind::detect(&json!({ "course": { "sections": [] } })),
        Some(ShapeKind::Prefixed)
    );
    // Top-level sections win even when other markers are present.
    assert_eq!(
        ShapeKind::detect(&json!({
            "sections": [],
            "course": { "sections": [] }
        })),
        Some(ShapeKind::Flat)
    );
    assert_eq!(ShapeKind::detect(&json!({ "sections": "nope" })), None);
    assert_eq!(ShapeKind::detect(&json!([1, 2, 3])), None);
}

#[test]
fn unknown_shape_is_rejected() {
    let err = normalize(&json!({ "modules": [] })).unwrap_err();
    assert_eq!(err, NormalizationError::UnrecognizedShape);
}

#[test]
fn flat_payload_normalizes() {
    let course = normalize(&stock_market_payload()).unwrap();

    assert_eq!(course.id().as_str(), "BSM001");
    assert_eq!(course.title(), "Basics of Stock Market");
    assert_eq!(course.description(), "Learn how exchanges work.");
    assert_eq!(course.meta().estimated_duration.as_deref(), Some("2 hours"));
    assert_eq!(course.sections().len(), 2);

    let first = course.section(1).unwrap();
    assert_eq!(first.content_blocks()[0].body, "A share is a slice of a company.");
    assert_eq!(first.content_blocks()[0].kind, BlockKind::Text);
    assert_eq!(first.content_blocks()[1].kind, BlockKind::Example);
    assert_eq!(first.quiz().passing_score(), 1);
    assert_eq!(first.quiz().questions()[0].correct_answer(), "Ownership");

    let second = course.section(2).unwrap();
    assert_eq!(second.content_blocks()[0].kind, BlockKind::Raw);
    assert_eq!(second.content_blocks()[0].body, "Plain paragraph");
    let question = &second.quiz().questions()[0];
    assert_eq!(question.id(), "s2q1");
    assert_eq!(question.text(), "NSE is an?");
    assert_eq!(question.correct_answer_index(), 0);
}

#[test]
fn missing_passing_score_defaults_and_clamps() {
    let course = normalize(&stock_market_payload()).unwrap();
    // Default of 4 clamped to the single available question.
    assert_eq!(course.section(2).unwrap().quiz().passing_score(), 1);
}

#[test]
fn nested_payload_uses_outer_fields_as_fallback() {
    let payload = json!({
        "id": 5,
        "course_id": "BSM001",
        "title": "Stock Market (catalog)",
        "description": "From the catalog",
        "content": {
            "courseTitle": "Basics of Stock Market",
            "sections": [
                {
                    "sectionId": 1,
                    "title": "Intro",
                    "content": []
                }
            ]
        }
    });

    let course = normalize(&payload).unwrap();
    assert_eq!(course.id().as_str(), "BSM001");
    assert_eq!(course.title(), "Stock Market (catalog)");
    assert_eq!(course.description(), "From the catalog");
    assert!(course.section(1).unwrap().quiz().is_empty());
}

#[test]
fn prefixed_payload_strips_section_prefixes() {
    let payload = json!({
        "course": {
            "id": "BRM001",
            "title": "Basics of Risk Management",
            "estimatedCompletionTime": "90 minutes",
            "sections": [
                { "id": "section2", "title": "Diversification", "content": [] },
                { "id": "section1", "title": "What is risk?", "content": [] }
            ]
        }
    });

    let course = normalize(&payload).unwrap();
    assert_eq!(course.id().as_str(), "BRM001");
    assert_eq!(course.meta().estimated_duration.as_deref(), Some("90 minutes"));
    assert_eq!(course.section(1).unwrap().title(), "What is risk?");
    assert_eq!(course.section(2).unwrap().title(), "Diversification");
}

#[test]
fn prefixed_section_without_digits_is_invalid() {
    let payload = json!({
        "course": {
            "title": "Risk",
            "sections": [ { "id": "intro", "title": "Intro" } ]
        }
    });

    let err = normalize(&payload).unwrap_err();
    assert_eq!(err, NormalizationError::InvalidSectionId("intro".into()));
}

#[test]
fn malformed_detected_shape_reports_shape() {
    let payload = json!({ "sections": [ { "title": 12 } ] });
    let err = normalize(&payload).unwrap_err();
    assert!(matches!(
        err,
        NormalizationError::Malformed {
            shape: ShapeKind::Flat,
            ..
        }
    ));
}

#[test]
fn question_ids_default_to_position() {
    let payload = json!({
        "title": "Investing",
        "sections": [{
            "title": "Intro",
            "quiz": {
                "passingScore": 1,
                "questions": [
                    { "question": "First?", "options": ["a", "b"], "correctAnswerIndex": 0 },
                    { "question": "Second?", "options": ["a", "b"], "correctAnswerIndex": 1 }
                ]
            }
        }]
    });

    let course = normalize(&payload).unwrap();
    let ids: Vec<_> = course.section(1).unwrap().quiz().questions()
        .iter()
        .map(|q| q.id().to_string())
        .collect();
    assert_eq!(ids, vec!["q1", "q2"]);
    assert_eq!(course.id().as_str(), "INVESTING");
}

#[test]
fn unknown_correct_answer_text_is_rejected() {
    let payload = json!({
        "sections": [{
            "quiz": {
                "questions": [
                    { "questionId": "q1", "question": "?", "options": ["a", "b"], "correctAnswer": "c" }
                ]
            }
        }]
    });

    let err = normalize(&payload).unwrap_err();
    assert_eq!(
        err,
        NormalizationError::UnknownCorrectAnswer {
            question: "q1".into(),
            answer: "c".into()
        }
    );
}

#[test]
fn missing_correct_answer_is_rejected() {
    let payload = json!({
        "sections": [{
            "quiz": { "questions": [ { "question": "?", "options": ["a", "b"] } ] }
        }]
    });

    let err = normalize(&payload).unwrap_err();
    assert_eq!(
        err,
        NormalizationError::MissingCorrectAnswer {
            question: "q1".into()
        }
    );
}

#[test]
fn invalid_quiz_is_reported_with_section() {
    let payload = json!({
        "sections": [{
            "sectionId": 1,
            "quiz": {
                "questions": [ { "question": "?", "options": ["only"], "correctAnswer": 0 } ]
            }
        }]
    });

    let err = normalize(&payload).unwrap_err();
    assert!(matches!(
        err,
        NormalizationError::InvalidCourse(CourseError::Quiz { section: 1, .. })
    ));
}

#[test]
fn duplicate_section_indexes_are_rejected() {
    let payload = json!({
        "sections": [ { "sectionId": 1 }, { "sectionId": 1 } ]
    });

    let err = normalize(&payload).unwrap_err();
    assert!(matches!(
        err,
        NormalizationError::InvalidCourse(CourseError::NonContiguousSection { .. })
    ));
}

#[test]
fn empty_course_is_rejected() {
    let err = normalize(&json!({ "sections": [] })).unwrap_err();
    assert_eq!(err, NormalizationError::InvalidCourse(CourseError::NoSections));
}

#[test]
fn normalization_is_idempotent_through_every_shape() {
    let course = normalize(&stock_market_payload()).unwrap();

    for shape in ShapeKind::ALL {
        let payload = to_canonical_json(&course, shape);
        assert_eq!(ShapeKind::detect(&payload), Some(shape));
        let again = normalize(&payload).unwrap();
        assert_eq!(again, course, "round trip through {shape} shape");
    }
}

#[test]
fn constructed_edge_values_survive_every_shape() {
    let options = |items: &[&str]| items.iter().map(|s| (*s).to_string()).collect::<Vec<_>>();
    let first = Section::new(
        1,
        "",
        vec![
            ContentBlock::new("", "", BlockKind::Text),
            ContentBlock::new("Chart", "see below", BlockKind::Raw),
        ],
        Quiz::new(
            "",
            1,
            vec![
                Question::new(" ", "", options(&["", "b"]), 1).unwrap(),
                Question::new("7", "Seven?", options(&["yes", "no"]), 0).unwrap(),
            ],
        )
        .unwrap(),
    );
    let second = Section::new(2, "Reading", Vec::new(), Quiz::empty(""));
    let course = Course::new(
        CourseId::new("EDGE1").unwrap(),
        "",
        "",
        CourseMeta {
            author: Some(String::new()),
            estimated_duration: Some(String::new()),
        },
        vec![first, second],
    )
    .unwrap();

    for shape in ShapeKind::ALL {
        let again = normalize(&to_canonical_json(&course, shape)).unwrap();
        assert_eq!(again, course, "round trip through {shape} shape");
    }
    assert_eq!(course.section(1).unwrap().title(), "Section 1");
    assert_eq!(course.meta(), &CourseMeta::default());
}

#[test]
fn serializer_duration_is_read_from_outer_object() {
    let payload = json!({
        "course_id": "BSM001",
        "author": "Finzo Team",
        "estimated_duration": "2 hours",
        "content": {
            "sections": [ { "sectionId": 1, "title": "Intro" } ]
        }
    });

    let course = normalize(&payload).unwrap();
    assert_eq!(course.meta().author.as_deref(), Some("Finzo Team"));
    assert_eq!(course.meta().estimated_duration.as_deref(), Some("2 hours"));
}

#[test]
fn normalize_str_reports_bad_json() {
    let err = normalize_str("{ not json").unwrap_err();
    assert!(matches!(err, NormalizationError::InvalidJson(_)));
}
