use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::PaginationInfo;
use crate::models::attempts::entities::{PassStatus, Session, SessionStatus, StudentAnswer};
use crate::models::catalog::entities::{Assessment, AssessmentPaper};

/// 作答摘要，用于列表
#[derive(Debug, Clone, Serialize)]
pub struct AttemptSummary {
    pub id: i64,
    pub assessment_id: i64,
    pub status: SessionStatus,
    pub start_time: DateTime<Utc>,
    pub submit_time: Option<DateTime<Utc>>,
    pub deadline: DateTime<Utc>,
    pub obtained_marks: Option<i32>,
    pub total_marks: i32,
    pub percentage: Option<f64>,
    pub pass_status: Option<PassStatus>,
}

impl AttemptSummary {
    /// `show_scores` 为 false 时隐藏分数
    pub fn from_session(session: &Session, show_scores: bool) -> Self {
        let graded = show_scores && session.status == SessionStatus::Completed;
        Self {
            id: session.id,
            assessment_id: session.assessment_id,
            status: session.status,
            start_time: session.start_time,
            submit_time: session.submit_time,
            deadline: session.deadline(),
            obtained_marks: graded.then_some(session.obtained_marks),
            total_marks: session.total_marks,
            percentage: graded.then_some(session.percentage),
            pass_status: if graded { session.pass_status } else { None },
        }
    }
}

/// 开始作答响应
#[derive(Debug, Clone, Serialize)]
pub struct StartAttemptResponse {
    pub attempt: AttemptSummary,
    /// 是否为继续之前未完成的作答
    pub resumed: bool,
}

/// 单题作答结果（作答过程中不暴露正误）
#[derive(Debug, Clone, Serialize)]
pub struct RecordedAnswerResponse {
    pub question_id: i64,
    pub student_answer: Option<String>,
    pub time_spent: i32,
}

impl From<&StudentAnswer> for RecordedAnswerResponse {
    fn from(answer: &StudentAnswer) -> Self {
        Self {
            question_id: answer.question_id,
            student_answer: answer.student_answer.clone(),
            time_spent: answer.time_spent,
        }
    }
}

/// 结果页中的单题
#[derive(Debug, Clone, Serialize)]
pub struct AnswerReview {
    pub question_id: i64,
    pub position: i32,
    pub prompt: String,
    pub options: Vec<String>,
    pub student_answer: Option<String>,
    pub time_spent: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_correct: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marks_obtained: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_option: Option<i32>,
}

/// 作答结果
#[derive(Debug, Clone, Serialize)]
pub struct AttemptResultResponse {
    pub attempt: AttemptSummary,
    pub assessment_title: String,
    pub time_taken: Option<i32>,
    pub formatted_time_taken: Option<String>,
    pub results_visible: bool,
    pub answers: Vec<AnswerReview>,
}

impl AttemptResultResponse {
    pub fn build(session: &Session, paper: &AssessmentPaper, answers: &[StudentAnswer]) -> Self {
        let assessment: &Assessment = &paper.assessment;
        let completed = session.status == SessionStatus::Completed;
        let show_scores = assessment.show_results_immediately;
        let show_key = completed && assessment.show_correct_answers;

        let reviews = paper
            .questions
            .iter()
            .filter_map(|pq| {
                let answer = answers.iter().find(|a| a.question_id == pq.question.id);
                // 停用的题目只在有作答记录时展示
                if answer.is_none() && !pq.question.is_active {
                    return None;
                }
                Some(AnswerReview {
                    question_id: pq.question.id,
                    position: pq.position,
                    prompt: pq.question.prompt.clone(),
                    options: pq.question.options.clone(),
                    student_answer: answer.and_then(|a| a.student_answer.clone()),
                    time_spent: answer.map(|a| a.time_spent).unwrap_or(0),
                    is_correct: (completed && show_scores)
                        .then(|| answer.is_some_and(|a| a.is_correct)),
                    marks_obtained: (completed && show_scores)
                        .then(|| answer.map(|a| a.marks_obtained).unwrap_or(0)),
                    correct_option: show_key.then_some(pq.question.correct_option),
                })
            })
            .collect();

        Self {
            attempt: AttemptSummary::from_session(session, show_scores),
            assessment_title: assessment.title.clone(),
            time_taken: session.time_taken,
            formatted_time_taken: session.formatted_time_taken(),
            results_visible: completed && show_scores,
            answers: reviews,
        }
    }
}

/// 作答历史列表
#[derive(Debug, Clone, Serialize)]
pub struct AttemptListResponse {
    pub items: Vec<AttemptSummary>,
    pub pagination: PaginationInfo,
}
