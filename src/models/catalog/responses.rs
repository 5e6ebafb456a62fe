use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::PaginationInfo;
use crate::models::attempts::responses::AttemptSummary;
use crate::models::catalog::entities::{Assessment, AssessmentPaper, Difficulty};

/// 可参加测评列表项
#[derive(Debug, Clone, Serialize)]
pub struct AvailableAssessmentItem {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub category_id: Option<i64>,
    pub duration_minutes: i32,
    pub total_marks: i32,
    pub pass_percentage: f64,
    pub question_count: i64,
    pub start_at: Option<DateTime<Utc>>,
    pub end_at: Option<DateTime<Utc>>,
    pub allow_multiple_attempts: bool,
    /// 当前学生最近一次作答
    pub latest_attempt: Option<AttemptSummary>,
}

impl AvailableAssessmentItem {
    pub fn new(
        assessment: Assessment,
        question_count: i64,
        latest_attempt: Option<AttemptSummary>,
    ) -> Self {
        Self {
            id: assessment.id,
            title: assessment.title,
            description: assessment.description,
            category_id: assessment.category_id,
            duration_minutes: assessment.duration_minutes,
            total_marks: assessment.total_marks,
            pass_percentage: assessment.pass_percentage,
            question_count,
            start_at: assessment.start_at,
            end_at: assessment.end_at,
            allow_multiple_attempts: assessment.allow_multiple_attempts,
            latest_attempt,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AvailableAssessmentListResponse {
    pub items: Vec<AvailableAssessmentItem>,
    pub pagination: PaginationInfo,
}

/// 作答视图中的题目（不含正确答案）
#[derive(Debug, Clone, Serialize)]
pub struct PaperQuestionView {
    pub id: i64,
    pub position: i32,
    pub prompt: String,
    pub options: Vec<String>,
    pub difficulty: Difficulty,
    pub time_allowance: i32,
    pub marks: i32,
}

/// 作答视图中的测评试卷
#[derive(Debug, Clone, Serialize)]
pub struct AssessmentPaperResponse {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub duration_minutes: i32,
    pub total_marks: i32,
    pub pass_percentage: f64,
    pub questions: Vec<PaperQuestionView>,
}

impl From<&AssessmentPaper> for AssessmentPaperResponse {
    fn from(paper: &AssessmentPaper) -> Self {
        let assessment = &paper.assessment;
        Self {
            id: assessment.id,
            title: assessment.title.clone(),
            description: assessment.description.clone(),
            category: paper.category_name.clone(),
            duration_minutes: assessment.duration_minutes,
            total_marks: assessment.total_marks,
            pass_percentage: assessment.pass_percentage,
            questions: paper
                .active_questions()
                .map(|pq| PaperQuestionView {
                    id: pq.question.id,
                    position: pq.position,
                    prompt: pq.question.prompt.clone(),
                    options: pq.question.options.clone(),
                    difficulty: pq.question.difficulty,
                    time_allowance: pq.question.time_allowance,
                    marks: pq.question.marks,
                })
                .collect(),
        }
    }
}
