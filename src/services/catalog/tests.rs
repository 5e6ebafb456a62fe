use std::sync::Arc;

use chrono::{TimeZone, Utc};

use super::CatalogService;
use crate::cache::ObjectCache;
use crate::cache::object_cache::moka::MokaCacheWrapper;
use crate::errors::PortalError;
use crate::models::catalog::requests::{
    CreateAssessmentRequest, CreateCategoryRequest, CreateQuestionRequest,
};
use crate::models::catalog::seed::CatalogSeed;
use crate::storage::Storage;
use crate::storage::sea_orm_storage::SeaOrmStorage;
use crate::utils::ManualClock;

async fn catalog() -> CatalogService {
    let storage: Arc<dyn Storage> = Arc::new(
        SeaOrmStorage::connect("sqlite::memory:", 1, 5)
            .await
            .expect("in-memory database"),
    );
    let cache: Arc<dyn ObjectCache> = Arc::new(MokaCacheWrapper::with_settings(100, 60));
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap(),
    ));
    CatalogService::new(storage, cache, clock)
}

fn question(category_id: i64, correct_option: i32) -> CreateQuestionRequest {
    CreateQuestionRequest {
        category_id,
        prompt: "Which number is prime?".into(),
        options: vec!["4".into(), "6".into(), "7".into()],
        correct_option,
        difficulty: None,
        time_allowance: None,
        marks: None,
    }
}

fn assessment(title: &str) -> CreateAssessmentRequest {
    CreateAssessmentRequest {
        category_id: None,
        title: title.into(),
        description: None,
        duration_minutes: 15,
        total_marks: 3,
        pass_percentage: 60.0,
        start_at: None,
        end_at: None,
        allow_multiple_attempts: false,
        show_results_immediately: true,
        show_correct_answers: false,
    }
}

const SEED: &str = r#"{
  "categories": ["Aptitude"],
  "questions": [
    { "key": "q1", "category": "Aptitude", "prompt": "2 + 2 = ?",
      "options": ["3", "4", "5"], "correct_option": 1, "difficulty": "easy", "marks": 2 },
    { "key": "q2", "category": "Logic", "prompt": "Odd one out",
      "options": ["cat", "dog", "car"], "correct_option": 2, "marks": 3 }
  ],
  "assessments": [
    { "title": "Warm-up", "category": "Aptitude", "duration_minutes": 10,
      "pass_percentage": 50, "questions": ["q1", "q2"] }
  ]
}"#;

#[tokio::test]
async fn rejects_invalid_catalog_writes() {
    let c = catalog().await;
    let category = c
        .create_category(CreateCategoryRequest {
            name: "Quant".into(),
        })
        .await
        .unwrap();

    let err = c
        .create_category(CreateCategoryRequest {
            name: " Quant ".into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, PortalError::Validation(_)));

    let err = c.create_question(question(category.id, 3)).await.unwrap_err();
    assert!(matches!(err, PortalError::Validation(_)));

    let err = c.create_question(question(9_999, 0)).await.unwrap_err();
    assert!(matches!(err, PortalError::Validation(_)));

    let mut bad = assessment("Broken");
    bad.pass_percentage = 120.0;
    let err = c.create_assessment(bad).await.unwrap_err();
    assert!(matches!(err, PortalError::Validation(_)));
}

#[tokio::test]
async fn referenced_category_cannot_be_deleted() {
    let c = catalog().await;
    let category = c
        .create_category(CreateCategoryRequest {
            name: "Quant".into(),
        })
        .await
        .unwrap();
    c.create_question(question(category.id, 2)).await.unwrap();

    let err = c.delete_category(category.id).await.unwrap_err();
    assert!(matches!(err, PortalError::InvalidTransition(_)));

    let err = c.delete_category(9_999).await.unwrap_err();
    assert!(matches!(err, PortalError::NotFound(_)));
}

#[tokio::test]
async fn attach_rejects_duplicates() {
    let c = catalog().await;
    let category = c
        .create_category(CreateCategoryRequest {
            name: "Quant".into(),
        })
        .await
        .unwrap();
    let q = c.create_question(question(category.id, 2)).await.unwrap();
    let a = c.create_assessment(assessment("Primes")).await.unwrap();

    let err = c.attach_questions(a.id, &[q.id, q.id]).await.unwrap_err();
    assert!(matches!(err, PortalError::Validation(_)));

    c.attach_questions(a.id, &[q.id]).await.unwrap();
    let err = c.attach_questions(a.id, &[q.id]).await.unwrap_err();
    assert!(matches!(err, PortalError::Validation(_)));
}

#[tokio::test]
async fn paper_cache_follows_catalog_changes() {
    let c = catalog().await;
    let category = c
        .create_category(CreateCategoryRequest {
            name: "Quant".into(),
        })
        .await
        .unwrap();
    let q1 = c.create_question(question(category.id, 2)).await.unwrap();
    let q2 = c.create_question(question(category.id, 2)).await.unwrap();
    let a = c.create_assessment(assessment("Primes")).await.unwrap();
    c.attach_questions(a.id, &[q1.id, q2.id]).await.unwrap();

    let view = c.paper_for_student(a.id).await.unwrap();
    assert_eq!(view.questions.len(), 2);

    c.set_question_active(q2.id, false).await.unwrap();
    let view = c.paper_for_student(a.id).await.unwrap();
    assert_eq!(view.questions.len(), 1);
    assert_eq!(view.questions[0].id, q1.id);

    c.delete_assessment(a.id).await.unwrap();
    let err = c.paper_for_student(a.id).await.unwrap_err();
    assert!(matches!(err, PortalError::NotFound(_)));
    // 历史作答仍可读取已删除测评的试卷
    assert!(c.get_paper(a.id).await.unwrap().assessment.is_deleted());
}

#[tokio::test]
async fn seeds_only_an_empty_catalog() {
    let c = catalog().await;
    let seed: CatalogSeed = serde_json::from_str(SEED).unwrap();

    let report = c.seed(seed.clone()).await.unwrap();
    assert!(!report.skipped);
    assert_eq!(report.categories, 2);
    assert_eq!(report.questions, 2);
    assert_eq!(report.assessments, 1);

    let ids = c.storage().list_assessment_question_ids(1).await.unwrap();
    assert_eq!(ids.len(), 2);
    let paper = c.get_paper(1).await.unwrap();
    // 未给出总分时取题目分值之和
    assert_eq!(paper.assessment.total_marks, 5);
    assert_eq!(paper.category_name.as_deref(), Some("Aptitude"));

    let again = c.seed(seed).await.unwrap();
    assert!(again.skipped);
    assert_eq!(c.storage().count_assessments().await.unwrap(), 1);
}

#[tokio::test]
async fn seed_with_unknown_question_key_fails() {
    let c = catalog().await;
    let mut seed: CatalogSeed = serde_json::from_str(SEED).unwrap();
    seed.assessments[0].questions.push("missing".into());

    let err = c.seed(seed).await.unwrap_err();
    assert!(matches!(err, PortalError::Validation(_)));
}
