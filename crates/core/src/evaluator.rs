//! Quiz scoring and the progress update it implies.

use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;

use crate::model::{Course, Quiz, UserProgress};

/// Learner's answers keyed by question id; values are the chosen option text.
pub type Answers = HashMap<String, String>;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EvaluationError {
    /// Recoverable: the caller should keep the form open until every
    /// question is answered.
    #[error("{} question(s) left unanswered", .missing.len())]
    IncompleteSubmission { missing: Vec<String> },

    #[error("section {index} does not exist in a course of {total} sections")]
    UnknownSection { index: u32, total: u32 },
}

//
// ─── RESULTS ───────────────────────────────────────────────────────────────────
//

/// Outcome of one submission.
///
/// `score_percent` is what the learner sees; `passed` compares
/// `correct_count` with the quiz's absolute passing score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EvaluationResult {
    pub score_percent: f64,
    pub passed: bool,
    pub correct_count: u32,
    pub total_questions: u32,
}

/// Result plus the progress value the caller should persist.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub result: EvaluationResult,
    pub updated_progress: UserProgress,
}

//
// ─── EVALUATION ────────────────────────────────────────────────────────────────
//

/// Scores `answers` against `quiz` for `section_index` and returns the next
/// progress value. `progress` itself is never modified.
///
/// An answer is correct only when it equals the correct option's text
/// exactly. The score is recorded on every attempt, replacing earlier ones.
/// A pass adds the section to the completed set and moves the current
/// section to the first incomplete one (`min(section + 1, total)` when
/// sections are taken in order).
///
/// # Errors
///
/// Returns `EvaluationError::IncompleteSubmission` if any question has no
/// answer and `EvaluationError::UnknownSection` if `section_index` is outside
/// `1..=total_sections`.
pub fn evaluate_quiz(
    quiz: &Quiz,
    answers: &Answers,
    section_index: u32,
    total_sections: u32,
    progress: &UserProgress,
) -> Result<Evaluation, EvaluationError> {
    if section_index == 0 || section_index > total_sections {
        return Err(EvaluationError::UnknownSection {
            index: section_index,
            total: total_sections,
        });
    }

    let missing: Vec<String> = quiz
        .questions()
        .iter()
        .filter(|q| !answers.contains_key(q.id()))
        .map(|q| q.id().to_owned())
        .collect();
    if !missing.is_empty() {
        return Err(EvaluationError::IncompleteSubmission { missing });
    }

    let total = u32::try_from(quiz.questions().len()).unwrap_or(u32::MAX);
    let correct = quiz
        .questions()
        .iter()
        .filter(|q| answers.get(q.id()).is_some_and(|a| a == q.correct_answer()))
        .count();
    let correct = u32::try_from(correct).unwrap_or(u32::MAX);

    let score_percent = if total == 0 {
        0.0
    } else {
        100.0 * f64::from(correct) / f64::from(total)
    };
    let passed = correct >= quiz.passing_score();

    let mut updated = progress.clone();
    updated.quiz_scores.insert(section_index, score_percent);
    if passed {
        updated.completed_sections.insert(section_index);
        updated.current_section = updated.first_incomplete(total_sections);
    }

    Ok(Evaluation {
        result: EvaluationResult {
            score_percent,
            passed,
            correct_count: correct,
            total_questions: total,
        },
        updated_progress: updated,
    })
}

impl Course {
    /// Evaluates the quiz of section `index` of this course.
    ///
    /// # Errors
    ///
    /// As [`evaluate_quiz`].
    pub fn evaluate_section(
        &self,
        index: u32,
        answers: &Answers,
        progress: &UserProgress,
    ) -> Result<Evaluation, EvaluationError> {
        let total = self.section_count();
        let section = self
            .section(index)
            .ok_or(EvaluationError::UnknownSection { index, total })?;
        evaluate_quiz(section.quiz(), answers, index, total, progress)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CourseId, CourseMeta, Question, Section};
    use crate::progression::compute_section_states;

    fn question(id: &str, correct: usize) -> Question {
        Question::new(
            id,
            format!("Question {id}"),
            vec!["Alpha".into(), "Beta".into(), "Gamma".into()],
            correct,
        )
        .unwrap()
    }

    fn quiz(questions: usize, passing: u32) -> Quiz {
        let qs = (1..=questions).map(|i| question(&format!("q{i}"), 0)).collect();
        Quiz::new("Quiz", passing, qs).unwrap()
    }

    /// Answers the first `correct` questions right and the rest wrong.
    fn answers(total: usize, correct: usize) -> Answers {
        (1..=total)
            .map(|i| {
                let pick = if i <= correct { "Alpha" } else { "Beta" };
                (format!("q{i}"), pick.to_string())
            })
            .collect()
    }

    fn two_section_course() -> Course {
        Course::new(
            CourseId::new("BSM001").unwrap(),
            "Basics of Stock Market",
            "",
            CourseMeta::default(),
            vec![
                Section::new(1, "Stocks", Vec::new(), quiz(3, 2)),
                Section::new(2, "Exchanges", Vec::new(), quiz(3, 2)),
            ],
        )
        .unwrap()
    }

    #[test]
    fn pass_threshold_is_inclusive() {
        let q = quiz(5, 4);
        let progress = UserProgress::new();

        let four = evaluate_quiz(&q, &answers(5, 4), 1, 3, &progress).unwrap();
        assert!(four.result.passed);
        assert_eq!(four.result.correct_count, 4);
        assert!((four.result.score_percent - 80.0).abs() < 1e-9);

        let three = evaluate_quiz(&q, &answers(5, 3), 1, 3, &progress).unwrap();
        assert!(!three.result.passed);
        assert_eq!(three.result.correct_count, 3);
    }

    #[test]
    fn incomplete_submission_changes_nothing() {
        let q = quiz(5, 4);
        let progress = UserProgress::new();
        let mut partial = answers(5, 5);
        partial.remove("q5");

        let err = evaluate_quiz(&q, &partial, 1, 3, &progress).unwrap_err();
        assert_eq!(
            err,
            EvaluationError::IncompleteSubmission {
                missing: vec!["q5".into()]
            }
        );
        assert_eq!(progress, UserProgress::new());
    }

    #[test]
    fn failing_records_score_without_advancing() {
        let q = quiz(5, 4);
        let progress = UserProgress::new();

        let eval = evaluate_quiz(&q, &answers(5, 2), 1, 3, &progress).unwrap();
        assert!(!eval.result.passed);
        let updated = eval.updated_progress;
        assert_eq!(updated.current_section, 1);
        assert!(updated.completed_sections.is_empty());
        assert!((updated.score(1).unwrap() - 40.0).abs() < 1e-9);
    }

    #[test]
    fn repassing_keeps_set_semantics_and_overwrites_score() {
        let q = quiz(5, 4);
        let first = evaluate_quiz(&q, &answers(5, 5), 1, 3, &UserProgress::new()).unwrap();
        assert!((first.updated_progress.score(1).unwrap() - 100.0).abs() < 1e-9);

        let second = evaluate_quiz(&q, &answers(5, 4), 1, 3, &first.updated_progress).unwrap();
        let updated = second.updated_progress;
        assert_eq!(updated.completed_sections.len(), 1);
        assert!(updated.is_completed(1));
        assert!((updated.score(1).unwrap() - 80.0).abs() < 1e-9);
    }

    #[test]
    fn failed_retake_keeps_completion_but_records_lower_score() {
        let q = quiz(5, 4);
        let passed = evaluate_quiz(&q, &answers(5, 5), 1, 3, &UserProgress::new()).unwrap();
        let retake = evaluate_quiz(&q, &answers(5, 1), 1, 3, &passed.updated_progress).unwrap();

        assert!(!retake.result.passed);
        assert!(retake.updated_progress.is_completed(1));
        assert!((retake.updated_progress.score(1).unwrap() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn answers_compare_by_exact_text() {
        let q = quiz(1, 1);
        let mut given = Answers::new();
        given.insert("q1".into(), "alpha".into());
        let eval = evaluate_quiz(&q, &given, 1, 1, &UserProgress::new()).unwrap();
        assert!(!eval.result.passed);

        given.insert("q1".into(), " Alpha".into());
        let eval = evaluate_quiz(&q, &given, 1, 1, &UserProgress::new()).unwrap();
        assert!(!eval.result.passed);
    }

    #[test]
    fn last_section_keeps_current_at_end() {
        let q = quiz(1, 1);
        let mut progress = UserProgress::new();
        progress.completed_sections.extend([1, 2]);
        progress.current_section = 3;

        let eval = evaluate_quiz(&q, &answers(1, 1), 3, 3, &progress).unwrap();
        assert_eq!(eval.updated_progress.current_section, 3);
        assert_eq!(eval.updated_progress.completed_sections.len(), 3);
    }

    #[test]
    fn empty_quiz_passes_with_zero_score() {
        let eval =
            evaluate_quiz(&Quiz::empty("Read"), &Answers::new(), 1, 2, &UserProgress::new())
                .unwrap();
        assert!(eval.result.passed);
        assert_eq!(eval.result.total_questions, 0);
        assert_eq!(eval.result.score_percent, 0.0);
        assert_eq!(eval.updated_progress.current_section, 2);
    }

    #[test]
    fn unknown_section_is_rejected() {
        let course = two_section_course();
        let err = course
            .evaluate_section(3, &answers(3, 3), &UserProgress::new())
            .unwrap_err();
        assert_eq!(err, EvaluationError::UnknownSection { index: 3, total: 2 });
    }

    #[test]
    fn end_to_end_two_section_course() {
        let course = two_section_course();
        let progress = UserProgress::new();

        let eval = course
            .evaluate_section(1, &answers(3, 2), &progress)
            .unwrap();
        assert!(eval.result.passed);
        assert_eq!(eval.result.correct_count, 2);
        assert_eq!(eval.result.total_questions, 3);
        assert!((eval.result.score_percent - 66.67).abs() < 0.01);

        let updated = &eval.updated_progress;
        assert_eq!(updated.current_section, 2);
        assert_eq!(updated.completed_sections.iter().copied().collect::<Vec<_>>(), vec![1]);
        assert!((updated.score(1).unwrap() - 66.67).abs() < 0.01);

        let states = compute_section_states(&course, updated);
        assert!(!states[1].is_locked);
        assert!(states[1].is_current);
    }
}
