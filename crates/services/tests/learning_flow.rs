use std::io::Write;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use finzo_core::model::{CourseId, Enrollment, EnrollmentId, UserId, UserProgress};
use finzo_core::time::fixed_clock;
use finzo_core::{Answers, EvaluationError};
use services::{AppServices, CourseFetcher, CourseFetcherConfig, LearningError, LearningService};
use storage::repository::{
    EnrollOutcome, EnrollmentRepository, ProgressStore, Storage, StorageError,
};

const STOCK_COURSE: &str = r#"{
    "courseId": "BSM001",
    "courseTitle": "Basics of Stock Market",
    "courseDescription": "Learn how exchanges work.",
    "sections": [
        {
            "sectionId": 1,
            "title": "What is a stock?",
            "content": [ { "title": "Ownership", "data": "A share is a slice of a company." } ],
            "quiz": {
                "passingScore": 2,
                "questions": [
                    { "questionId": "q1", "questionText": "A stock is?", "options": ["Debt", "Ownership"], "correctAnswer": 1 },
                    { "questionId": "q2", "questionText": "Traded on?", "options": ["Exchange", "Bank"], "correctAnswer": "Exchange" },
                    { "questionId": "q3", "questionText": "Dividends are?", "options": ["Profit share", "Loans"], "correctAnswer": 0 }
                ]
            }
        },
        {
            "sectionId": 2,
            "title": "Exchanges",
            "content": [ "NSE and BSE are Indian exchanges." ],
            "quiz": {
                "passingScore": 1,
                "questions": [
                    { "questionId": "q1", "questionText": "NSE is an?", "options": ["Exchange", "Broker"], "correctAnswer": 0 }
                ]
            }
        }
    ]
}"#;

fn offline_fetcher() -> CourseFetcher {
    CourseFetcher::new(CourseFetcherConfig {
        base_url: "http://127.0.0.1:9".into(),
        token: None,
    })
}

fn answers(pairs: &[(&str, &str)]) -> Answers {
    pairs
        .iter()
        .map(|(q, a)| ((*q).to_string(), (*a).to_string()))
        .collect()
}

#[tokio::test]
async fn sqlite_flow_import_enroll_submit_complete() {
    let services = AppServices::new_sqlite(
        "sqlite:file:memdb_learning_flow?mode=memory&cache=shared",
        fixed_clock(),
        offline_fetcher(),
    )
    .await
    .expect("services");

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(STOCK_COURSE.as_bytes()).unwrap();
    let course = services
        .catalog()
        .import_file(file.path(), None)
        .await
        .expect("import");
    let id = course.id().clone();

    let learning = services.learning();
    learning.sign_in(UserId::new(42)).await.unwrap();
    let enrolled = learning.enroll(&id).await.unwrap();
    assert!(enrolled.created);
    assert!(!learning.enroll(&id).await.unwrap().created);

    let opened = learning.open_course(&id).await.unwrap();
    assert!(opened.view.section(2).unwrap().is_locked);
    assert_eq!(opened.view.progress.rounded(), 0);

    let partial = learning
        .submit_quiz(&id, 1, &answers(&[("q1", "Ownership")]))
        .await
        .unwrap_err();
    assert!(matches!(
        partial,
        LearningError::Evaluation(EvaluationError::IncompleteSubmission { .. })
    ));

    let first = learning
        .submit_quiz(
            &id,
            1,
            &answers(&[("q1", "Ownership"), ("q2", "Exchange"), ("q3", "Loans")]),
        )
        .await
        .unwrap();
    assert!(first.result.passed);
    assert!((first.result.score_percent - 66.67).abs() < 0.01);
    assert_eq!(first.progress.current_section, 2);
    assert!(!first.view.section(2).unwrap().is_locked);
    assert!(!first.course_completed);

    let last = learning
        .submit_quiz(&id, 2, &answers(&[("q1", "Exchange")]))
        .await
        .unwrap();
    assert!(last.course_completed);
    assert_eq!(last.view.progress.rounded(), 100);

    let reopened = learning.open_course(&id).await.unwrap();
    assert!(reopened.enrollment.is_completed);
    assert_eq!(reopened.progress, last.progress);

    let overview = learning.enrollments().await.unwrap();
    assert_eq!(overview.len(), 1);
    assert_eq!(overview[0].course_title, "Basics of Stock Market");

    learning.sign_out().await.unwrap();
    assert!(matches!(
        learning.open_course(&id).await.unwrap_err(),
        LearningError::NoActiveUser
    ));
}

#[tokio::test]
async fn opening_without_enrollment_is_refused() {
    let services = AppServices::in_memory(fixed_clock(), offline_fetcher());
    let course = services.catalog().import_str(STOCK_COURSE, None).await.unwrap();

    let learning = services.learning();
    learning.sign_in(UserId::new(1)).await.unwrap();
    let err = learning.open_course(course.id()).await.unwrap_err();
    assert!(matches!(err, LearningError::NotEnrolled(_)));
}

struct FailingProgress;

#[async_trait]
impl ProgressStore for FailingProgress {
    async fn load_progress(
        &self,
        _enrollment_id: EnrollmentId,
    ) -> Result<Option<UserProgress>, StorageError> {
        Ok(None)
    }

    async fn save_progress(
        &self,
        _enrollment_id: EnrollmentId,
        _progress: &UserProgress,
    ) -> Result<(), StorageError> {
        Err(StorageError::Connection("disk full".into()))
    }
}

#[tokio::test]
async fn progress_store_failures_propagate() {
    let storage = Storage::in_memory();
    let learning = LearningService::new(
        fixed_clock(),
        Arc::clone(&storage.courses),
        Arc::clone(&storage.enrollments),
        Arc::new(FailingProgress),
        Arc::clone(&storage.sessions),
    );
    let catalog = services::CatalogService::new(Arc::clone(&storage.courses));
    catalog.import_str(STOCK_COURSE, None).await.unwrap();

    learning.sign_in(UserId::new(1)).await.unwrap();
    let err = learning
        .enroll(&CourseId::new("BSM001").unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, LearningError::Storage(StorageError::Connection(_))));
}

/// Delegates to a real repository but refuses enrollment updates.
struct FrozenEnrollments(Arc<dyn EnrollmentRepository>);

#[async_trait]
impl EnrollmentRepository for FrozenEnrollments {
    async fn enroll(
        &self,
        user_id: UserId,
        course_id: &CourseId,
        at: DateTime<Utc>,
    ) -> Result<EnrollOutcome, StorageError> {
        self.0.enroll(user_id, course_id, at).await
    }

    async fn get_enrollment(
        &self,
        user_id: UserId,
        course_id: &CourseId,
    ) -> Result<Option<Enrollment>, StorageError> {
        self.0.get_enrollment(user_id, course_id).await
    }

    async fn list_enrollments(&self, user_id: UserId) -> Result<Vec<Enrollment>, StorageError> {
        self.0.list_enrollments(user_id).await
    }

    async fn update_enrollment(&self, _enrollment: &Enrollment) -> Result<(), StorageError> {
        Err(StorageError::Connection("database is locked".into()))
    }
}

#[tokio::test]
async fn failed_enrollment_update_restores_previous_progress() {
    let storage = Storage::in_memory();
    let learning = LearningService::new(
        fixed_clock(),
        Arc::clone(&storage.courses),
        Arc::new(FrozenEnrollments(Arc::clone(&storage.enrollments))),
        Arc::clone(&storage.progress),
        Arc::clone(&storage.sessions),
    );
    let catalog = services::CatalogService::new(Arc::clone(&storage.courses));
    catalog.import_str(STOCK_COURSE, None).await.unwrap();
    let course_id = CourseId::new("BSM001").unwrap();

    learning.sign_in(UserId::new(1)).await.unwrap();
    learning.enroll(&course_id).await.unwrap();
    let enrollment = storage
        .enrollments
        .get_enrollment(UserId::new(1), &course_id)
        .await
        .unwrap()
        .unwrap();
    let before = storage.progress.load_progress(enrollment.id).await.unwrap();

    let err = learning
        .submit_quiz(
            &course_id,
            1,
            &answers(&[("q1", "Ownership"), ("q2", "Exchange"), ("q3", "Profit share")]),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, LearningError::Storage(StorageError::Connection(_))));
    let after = storage.progress.load_progress(enrollment.id).await.unwrap();
    assert_eq!(after, before);
    assert!(after.unwrap().completed_sections.is_empty());
}
