use std::sync::Arc;

use finzo_core::model::{Course, CourseId, Enrollment, UserId, UserProgress};
use finzo_core::{Answers, CourseView, EvaluationResult, ProgressPercent, overall_progress};
use storage::repository::{
    CourseRepository, EnrollOutcome, EnrollmentRepository, ProgressStore, SessionStore,
    StorageError,
};

use crate::Clock;
use crate::error::LearningError;

/// A course opened by the signed-in learner.
#[derive(Debug, Clone)]
pub struct CourseSession {
    pub course: Course,
    pub enrollment: Enrollment,
    pub progress: UserProgress,
    pub view: CourseView,
}

/// Outcome of a quiz submission after it has been persisted.
#[derive(Debug, Clone)]
pub struct QuizSubmission {
    pub result: EvaluationResult,
    pub progress: UserProgress,
    pub view: CourseView,
    /// True once the final section has been passed.
    pub course_completed: bool,
}

/// One row of the learner's enrollment list.
#[derive(Debug, Clone)]
pub struct EnrollmentOverview {
    pub enrollment: Enrollment,
    pub course_title: String,
    pub progress: ProgressPercent,
}

/// Orchestrates enrollment, course viewing and quiz submission for the
/// signed-in user.
#[derive(Clone)]
pub struct LearningService {
    clock: Clock,
    courses: Arc<dyn CourseRepository>,
    enrollments: Arc<dyn EnrollmentRepository>,
    progress: Arc<dyn ProgressStore>,
    sessions: Arc<dyn SessionStore>,
}

impl LearningService {
    #[must_use]
    pub fn new(
        clock: Clock,
        courses: Arc<dyn CourseRepository>,
        enrollments: Arc<dyn EnrollmentRepository>,
        progress: Arc<dyn ProgressStore>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            clock,
            courses,
            enrollments,
            progress,
            sessions,
        }
    }

    /// # Errors
    ///
    /// Returns `LearningError::Storage` if the session cannot be stored.
    pub async fn sign_in(&self, user_id: UserId) -> Result<(), LearningError> {
        self.sessions.sign_in(user_id).await?;
        tracing::info!(user = %user_id, "signed in");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `LearningError::Storage` if the session cannot be cleared.
    pub async fn sign_out(&self) -> Result<(), LearningError> {
        self.sessions.sign_out().await?;
        Ok(())
    }

    /// The signed-in user.
    ///
    /// # Errors
    ///
    /// Returns `LearningError::NoActiveUser` when nobody is signed in.
    pub async fn current_user(&self) -> Result<UserId, LearningError> {
        self.sessions
            .current_user()
            .await?
            .ok_or(LearningError::NoActiveUser)
    }

    /// Enroll the signed-in user. Enrolling twice returns the existing
    /// enrollment with `created == false`.
    ///
    /// # Errors
    ///
    /// Returns `LearningError::NoActiveUser`, `LearningError::UnknownCourse`
    /// or `LearningError::Storage`.
    pub async fn enroll(&self, course_id: &CourseId) -> Result<EnrollOutcome, LearningError> {
        let user_id = self.current_user().await?;
        self.load_course(course_id).await?;

        let outcome = self
            .enrollments
            .enroll(user_id, course_id, self.clock.now())
            .await?;
        if outcome.created {
            self.progress
                .save_progress(outcome.enrollment.id, &UserProgress::new())
                .await?;
            tracing::info!(user = %user_id, course = %course_id, "enrolled");
        }
        Ok(outcome)
    }

    /// Enrollments of the signed-in user with their overall progress.
    ///
    /// # Errors
    ///
    /// Returns `LearningError::NoActiveUser` or `LearningError::Storage`.
    pub async fn enrollments(&self) -> Result<Vec<EnrollmentOverview>, LearningError> {
        let user_id = self.current_user().await?;
        let enrollments = self.enrollments.list_enrollments(user_id).await?;

        let mut out = Vec::with_capacity(enrollments.len());
        for enrollment in enrollments {
            let course = match self.courses.get_course(&enrollment.course_id).await {
                Ok(course) => course,
                Err(StorageError::NotFound) => {
                    tracing::warn!(course = %enrollment.course_id, "enrolled course is missing");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            let progress = self
                .progress
                .load_progress(enrollment.id)
                .await?
                .unwrap_or_default();
            out.push(EnrollmentOverview {
                course_title: course.title().to_owned(),
                progress: overall_progress(&course, &progress),
                enrollment,
            });
        }
        Ok(out)
    }

    /// Open a course the signed-in user is enrolled in and record the access.
    ///
    /// # Errors
    ///
    /// Returns `LearningError::NoActiveUser`, `LearningError::UnknownCourse`,
    /// `LearningError::NotEnrolled` or `LearningError::Storage`.
    pub async fn open_course(&self, course_id: &CourseId) -> Result<CourseSession, LearningError> {
        let user_id = self.current_user().await?;
        let course = self.load_course(course_id).await?;
        let mut enrollment = self.load_enrollment(user_id, course_id).await?;
        let progress = self
            .progress
            .load_progress(enrollment.id)
            .await?
            .unwrap_or_default();

        enrollment.touch(self.clock.now());
        self.enrollments.update_enrollment(&enrollment).await?;

        let view = CourseView::build(&course, &progress);
        Ok(CourseSession {
            course,
            enrollment,
            progress,
            view,
        })
    }

    /// Score a quiz for the signed-in user and persist the new progress.
    ///
    /// Locked sections are refused. Passing the final section marks the
    /// enrollment completed; it is never un-completed by later attempts.
    ///
    /// # Errors
    ///
    /// Returns `LearningError::UnknownSection` or `LearningError::SectionLocked`
    /// for sections that cannot be attempted,
    /// `LearningError::Evaluation` for incomplete submissions, and the lookup
    /// errors of [`Self::open_course`]. Evaluation errors persist nothing. If
    /// the enrollment update fails after the new progress was saved, the
    /// previous progress is written back before the error is returned.
    pub async fn submit_quiz(
        &self,
        course_id: &CourseId,
        section_index: u32,
        answers: &Answers,
    ) -> Result<QuizSubmission, LearningError> {
        let user_id = self.current_user().await?;
        let course = self.load_course(course_id).await?;
        let mut enrollment = self.load_enrollment(user_id, course_id).await?;
        let progress = self
            .progress
            .load_progress(enrollment.id)
            .await?
            .unwrap_or_default();

        let total = course.section_count();
        let state = CourseView::build(&course, &progress);
        match state.section(section_index) {
            None => {
                return Err(LearningError::UnknownSection {
                    index: section_index,
                    total,
                });
            }
            Some(section) if section.is_locked => {
                return Err(LearningError::SectionLocked(section_index));
            }
            Some(_) => {}
        }

        let evaluation = course.evaluate_section(section_index, answers, &progress)?;
        let updated = evaluation.updated_progress;
        self.progress.save_progress(enrollment.id, &updated).await?;

        if evaluation.result.passed && section_index == total {
            enrollment.is_completed = true;
        }
        enrollment.touch(self.clock.now());
        if let Err(err) = self.enrollments.update_enrollment(&enrollment).await {
            if let Err(restore) = self.progress.save_progress(enrollment.id, &progress).await {
                tracing::warn!(
                    enrollment = enrollment.id.value(),
                    error = %restore,
                    "failed to restore progress after enrollment update error"
                );
            }
            return Err(err.into());
        }

        tracing::info!(
            user = %user_id,
            course = %course_id,
            section = section_index,
            score = evaluation.result.score_percent,
            passed = evaluation.result.passed,
            "quiz submitted"
        );

        let view = CourseView::build(&course, &updated);
        Ok(QuizSubmission {
            result: evaluation.result,
            progress: updated,
            view,
            course_completed: enrollment.is_completed,
        })
    }

    async fn load_course(&self, course_id: &CourseId) -> Result<Course, LearningError> {
        match self.courses.get_course(course_id).await {
            Ok(course) => Ok(course),
            Err(StorageError::NotFound) => Err(LearningError::UnknownCourse(course_id.clone())),
            Err(e) => Err(e.into()),
        }
    }

    async fn load_enrollment(
        &self,
        user_id: UserId,
        course_id: &CourseId,
    ) -> Result<Enrollment, LearningError> {
        self.enrollments
            .get_enrollment(user_id, course_id)
            .await?
            .ok_or_else(|| LearningError::NotEnrolled(course_id.clone()))
    }
}
