use crate::models::catalog::entities::Difficulty;
use crate::models::common::pagination::PaginationQuery;
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// 创建分类请求
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
}

/// 创建题目请求
#[derive(Debug, Clone, Deserialize)]
pub struct CreateQuestionRequest {
    pub category_id: i64,
    pub prompt: String,
    pub options: Vec<String>,
    /// 正确选项下标，从 0 开始
    pub correct_option: i32,
    pub difficulty: Option<Difficulty>,
    pub time_allowance: Option<i32>, // 秒，默认 60
    pub marks: Option<i32>,          // 默认 1
}

/// 创建测评请求
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAssessmentRequest {
    pub category_id: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    pub duration_minutes: i32,
    pub total_marks: i32,
    pub pass_percentage: f64,
    pub start_at: Option<DateTime<Utc>>, // ISO 8601 格式
    pub end_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub allow_multiple_attempts: bool,
    #[serde(default = "default_true")]
    pub show_results_immediately: bool,
    #[serde(default)]
    pub show_correct_answers: bool,
}

fn default_true() -> bool {
    true
}

/// 可参加测评列表查询参数（HTTP 请求）
#[derive(Debug, Clone, Deserialize)]
pub struct AvailableAssessmentParams {
    #[serde(flatten)]
    pub pagination: PaginationQuery,
    pub category_id: Option<i64>,
    pub search: Option<String>,
}

// 用于存储层的内部查询参数
#[derive(Debug, Clone)]
pub struct AvailableAssessmentQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub category_id: Option<i64>,
    pub search: Option<String>,
    pub now: DateTime<Utc>,
}

impl AvailableAssessmentParams {
    pub fn into_query(self, now: DateTime<Utc>) -> AvailableAssessmentQuery {
        AvailableAssessmentQuery {
            page: Some(self.pagination.page),
            size: Some(self.pagination.size),
            category_id: self.category_id,
            search: self.search.filter(|s| !s.trim().is_empty()),
            now,
        }
    }
}
