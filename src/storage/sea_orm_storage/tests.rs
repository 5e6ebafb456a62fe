use chrono::{Duration, NaiveDate, TimeZone, Utc};

use super::SeaOrmStorage;
use crate::models::analytics::entities::{AnalyticsKey, AnalyticsUpsert};
use crate::models::attempts::entities::{
    AnswerWrite, Finalization, NewSession, PassStatus, SessionStatus,
};
use crate::models::catalog::entities::Difficulty;
use crate::models::catalog::requests::{
    AvailableAssessmentQuery, CreateAssessmentRequest, CreateQuestionRequest,
};
use crate::storage::Storage;

async fn storage() -> SeaOrmStorage {
    SeaOrmStorage::connect("sqlite::memory:", 1, 5)
        .await
        .expect("in-memory database")
}

fn assessment_request(title: &str, category_id: Option<i64>) -> CreateAssessmentRequest {
    CreateAssessmentRequest {
        category_id,
        title: title.into(),
        description: None,
        duration_minutes: 20,
        total_marks: 4,
        pass_percentage: 40.0,
        start_at: None,
        end_at: None,
        allow_multiple_attempts: false,
        show_results_immediately: true,
        show_correct_answers: false,
    }
}

fn question_request(category_id: i64, prompt: &str) -> CreateQuestionRequest {
    CreateQuestionRequest {
        category_id,
        prompt: prompt.into(),
        options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
        correct_option: 2,
        difficulty: Some(Difficulty::Medium),
        time_allowance: None,
        marks: Some(2),
    }
}

/// 一个分类、两道题、一个已关联题目的测评
async fn seeded(s: &SeaOrmStorage) -> (i64, i64, Vec<i64>) {
    let category = s.create_category("Verbal").await.unwrap();
    let q1 = s
        .create_question(question_request(category.id, "Synonym of brisk"))
        .await
        .unwrap();
    let q2 = s
        .create_question(question_request(category.id, "Antonym of scarce"))
        .await
        .unwrap();
    let assessment = s
        .create_assessment(assessment_request("Verbal Basics", Some(category.id)))
        .await
        .unwrap();
    s.attach_questions(assessment.id, &[q1.id, q2.id])
        .await
        .unwrap();
    (category.id, assessment.id, vec![q1.id, q2.id])
}

async fn open_session(s: &SeaOrmStorage, student_id: i64, assessment_id: i64) -> i64 {
    s.create_session(NewSession {
        student_id,
        assessment_id,
        start_time: Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap(),
        total_marks: 4,
        pass_percentage: 40.0,
        duration_minutes: 20,
    })
    .await
    .unwrap()
    .id
}

#[tokio::test]
async fn question_defaults_and_options_survive_storage() {
    let s = storage().await;
    let category = s.create_category("Quant").await.unwrap();
    let question = s
        .create_question(CreateQuestionRequest {
            category_id: category.id,
            prompt: "2 + 2".into(),
            options: vec!["3".into(), "4".into()],
            correct_option: 1,
            difficulty: None,
            time_allowance: None,
            marks: None,
        })
        .await
        .unwrap();

    let loaded = s.get_question_by_id(question.id).await.unwrap().unwrap();
    assert_eq!(loaded.options, vec!["3".to_string(), "4".to_string()]);
    assert_eq!(loaded.difficulty, Difficulty::Medium);
    assert_eq!(loaded.time_allowance, 60);
    assert_eq!(loaded.marks, 1);
    assert!(loaded.is_active);
}

#[tokio::test]
async fn category_references_are_reported() {
    let s = storage().await;
    let (category_id, _, _) = seeded(&s).await;
    let unused = s.create_category("Unused").await.unwrap();

    assert!(s.category_in_use(category_id).await.unwrap());
    assert!(!s.category_in_use(unused.id).await.unwrap());
    assert!(s.delete_category(unused.id).await.unwrap());
    assert!(s.get_category_by_id(unused.id).await.unwrap().is_none());
    assert!(!s.delete_category(unused.id).await.unwrap());
}

#[tokio::test]
async fn paper_keeps_positions_and_category_names() {
    let s = storage().await;
    let (category_id, assessment_id, ids) = seeded(&s).await;

    // 追加的题目排在已有题目之后
    let q3 = s
        .create_question(question_request(category_id, "Odd one out"))
        .await
        .unwrap();
    s.attach_questions(assessment_id, &[q3.id]).await.unwrap();

    let paper = s.get_assessment_paper(assessment_id).await.unwrap().unwrap();
    let positions: Vec<(i64, i32)> = paper
        .questions
        .iter()
        .map(|pq| (pq.question.id, pq.position))
        .collect();
    assert_eq!(positions, vec![(ids[0], 1), (ids[1], 2), (q3.id, 3)]);
    assert_eq!(paper.category_name.as_deref(), Some("Verbal"));
    assert!(paper.questions.iter().all(|pq| pq.category_name == "Verbal"));

    assert_eq!(
        s.list_assessment_question_ids(assessment_id).await.unwrap(),
        vec![ids[0], ids[1], q3.id]
    );
}

#[tokio::test]
async fn attaching_a_question_twice_fails() {
    let s = storage().await;
    let (_, assessment_id, ids) = seeded(&s).await;
    assert!(s.attach_questions(assessment_id, &[ids[0]]).await.is_err());
    assert_eq!(
        s.list_assessment_question_ids(assessment_id).await.unwrap().len(),
        2
    );
}

#[tokio::test]
async fn active_question_counts_skip_deactivated_questions() {
    let s = storage().await;
    let (_, assessment_id, ids) = seeded(&s).await;
    let empty = s
        .create_assessment(assessment_request("Empty", None))
        .await
        .unwrap();

    assert!(s.set_question_active(ids[1], false).await.unwrap());
    let counts = s
        .count_active_questions(&[assessment_id, empty.id])
        .await
        .unwrap();
    assert_eq!(counts.get(&assessment_id), Some(&1));
    assert_eq!(counts.get(&empty.id), None);
}

#[tokio::test]
async fn available_list_filters_window_deleted_and_search() {
    let s = storage().await;
    let (_, assessment_id, _) = seeded(&s).await;
    let now = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();

    let mut future = assessment_request("Future Verbal", None);
    future.start_at = Some(now + Duration::days(1));
    s.create_assessment(future).await.unwrap();

    let mut closed = assessment_request("Closed Verbal", None);
    closed.end_at = Some(now - Duration::days(1));
    s.create_assessment(closed).await.unwrap();

    let deleted = s
        .create_assessment(assessment_request("Deleted Verbal", None))
        .await
        .unwrap();
    assert!(s.soft_delete_assessment(deleted.id).await.unwrap());
    assert!(!s.soft_delete_assessment(deleted.id).await.unwrap());

    let (items, pagination) = s
        .list_available_assessments(AvailableAssessmentQuery {
            page: Some(1),
            size: Some(10),
            category_id: None,
            search: Some("verbal".into()),
            now,
        })
        .await
        .unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, assessment_id);
    assert_eq!(pagination.total, 1);

    // 软删除后仍可按 ID 读取
    let loaded = s.get_assessment_by_id(deleted.id).await.unwrap().unwrap();
    assert!(loaded.is_deleted());
}

#[tokio::test]
async fn finalize_fills_blanks_and_grades_once() {
    let s = storage().await;
    let (_, assessment_id, ids) = seeded(&s).await;
    let session_id = open_session(&s, 7, assessment_id).await;

    s.upsert_answer(AnswerWrite {
        session_id,
        question_id: ids[0],
        student_answer: Some("2".into()),
        is_correct: true,
        marks_obtained: 2,
        time_spent: 30,
    })
    .await
    .unwrap();

    let finished_at = Utc.with_ymd_and_hms(2025, 3, 1, 9, 10, 0).unwrap();
    let finalization = Finalization {
        session_id,
        time_taken: 600,
        finished_at,
        unanswered_question_ids: ids.clone(),
    };
    let outcome = s
        .finalize_session(finalization.clone())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(outcome.obtained_marks, 2);
    assert_eq!(outcome.percentage, 50.0);
    assert_eq!(outcome.pass_status, PassStatus::Pass);

    // 第二次收卷不再评分
    assert!(s.finalize_session(finalization).await.unwrap().is_none());

    let session = s.get_session_by_id(session_id).await.unwrap().unwrap();
    assert_eq!(session.status, SessionStatus::Completed);
    assert_eq!(session.time_taken, Some(600));
    assert_eq!(session.submit_time, Some(finished_at));

    let answers = s.list_answers(session_id).await.unwrap();
    assert_eq!(answers.len(), 2);
    assert!(answers[1].student_answer.is_none());
    assert_eq!(answers[1].marks_obtained, 0);

    let err = s
        .upsert_answer(AnswerWrite {
            session_id,
            question_id: ids[1],
            student_answer: Some("2".into()),
            is_correct: true,
            marks_obtained: 2,
            time_spent: 5,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, crate::errors::PortalError::AlreadyGraded(_)));
}

#[tokio::test]
async fn abandoned_session_cannot_be_finalized() {
    let s = storage().await;
    let (_, assessment_id, ids) = seeded(&s).await;
    let session_id = open_session(&s, 7, assessment_id).await;
    let at = Utc.with_ymd_and_hms(2025, 3, 1, 9, 5, 0).unwrap();

    assert!(s.abandon_session(session_id, at).await.unwrap());
    assert!(!s.abandon_session(session_id, at).await.unwrap());
    assert!(
        s.find_in_progress_session(7, assessment_id)
            .await
            .unwrap()
            .is_none()
    );

    let outcome = s
        .finalize_session(Finalization {
            session_id,
            time_taken: 0,
            finished_at: at,
            unanswered_question_ids: ids,
        })
        .await
        .unwrap();
    assert!(outcome.is_none());
    assert!(s.list_answers(session_id).await.unwrap().is_empty());
    assert!(!s.has_completed_session(7, assessment_id).await.unwrap());
}

#[tokio::test]
async fn latest_session_per_assessment() {
    let s = storage().await;
    let (_, assessment_id, _) = seeded(&s).await;
    let first = open_session(&s, 7, assessment_id).await;
    s.abandon_session(first, Utc::now()).await.unwrap();
    let second = s
        .create_session(NewSession {
            student_id: 7,
            assessment_id,
            start_time: Utc.with_ymd_and_hms(2025, 3, 2, 9, 0, 0).unwrap(),
            total_marks: 4,
            pass_percentage: 40.0,
            duration_minutes: 20,
        })
        .await
        .unwrap();

    let latest = s.latest_sessions(7, &[assessment_id]).await.unwrap();
    assert_eq!(latest.get(&assessment_id).map(|s| s.id), Some(second.id));
    assert!(s.latest_sessions(8, &[assessment_id]).await.unwrap().is_empty());

    let (page, info) = s.list_sessions_for_student(7, 1, 10).await.unwrap();
    assert_eq!(page.iter().map(|s| s.id).collect::<Vec<_>>(), vec![second.id, first]);
    assert_eq!(info.total, 2);
}

fn upsert(key: AnalyticsKey, existing_id: Option<i64>, accuracy: f64) -> AnalyticsUpsert {
    AnalyticsUpsert {
        key,
        existing_id,
        total_questions: 4,
        correct_answers: 2,
        incorrect_answers: 2,
        accuracy_percentage: accuracy,
        avg_time_per_question: 12.5,
        questions_too_slow: 1,
        questions_too_fast: 0,
        questions_skipped: 0,
        common_mistakes: vec![3, 9],
        weak_topics: vec!["Verbal".into()],
        strong_topics: vec![],
        improvement_rate: 0.0,
        consistency_score: 0.0,
        streak_correct: 1,
        max_streak: 2,
        study_time_minutes: 6,
        last_activity_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
    }
}

#[tokio::test]
async fn analytics_rows_insert_then_update() {
    let s = storage().await;
    let key = AnalyticsKey {
        student_id: 7,
        assessment_id: 1,
        category: "Verbal".into(),
        difficulty: Difficulty::Medium,
    };

    s.save_analytics(vec![upsert(key.clone(), None, 50.0)])
        .await
        .unwrap();
    let row = s.get_analytics(&key).await.unwrap().unwrap();
    assert_eq!(row.common_mistakes, vec![3, 9]);
    assert_eq!(row.weak_topics, vec!["Verbal".to_string()]);
    assert_eq!(
        row.last_activity_date,
        NaiveDate::from_ymd_opt(2025, 3, 1)
    );

    s.save_analytics(vec![upsert(key.clone(), Some(row.id), 75.0)])
        .await
        .unwrap();
    let rows = s.list_analytics_for_student(7).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].accuracy_percentage, 75.0);

    let other_key = AnalyticsKey {
        assessment_id: 2,
        ..key.clone()
    };
    s.save_analytics(vec![upsert(other_key, None, 20.0)])
        .await
        .unwrap();

    let history = s
        .recent_accuracies(7, "Verbal", Difficulty::Medium, Some(row.id), 9)
        .await
        .unwrap();
    assert_eq!(history, vec![20.0]);
    let all = s
        .recent_accuracies(7, "Verbal", Difficulty::Medium, None, 9)
        .await
        .unwrap();
    assert_eq!(all.len(), 2);
    assert!(
        s.recent_accuracies(7, "Verbal", Difficulty::Hard, None, 9)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn ping_and_count() {
    let s = storage().await;
    s.ping().await.unwrap();
    assert_eq!(s.count_assessments().await.unwrap(), 0);
    seeded(&s).await;
    assert_eq!(s.count_assessments().await.unwrap(), 1);
}
