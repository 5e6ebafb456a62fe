use serde::Serialize;

use crate::models::attempts::responses::AttemptSummary;
use crate::models::catalog::entities::Difficulty;

/// 强项/弱项条目
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TopicSummaryItem {
    pub category: String,
    pub difficulty: Difficulty,
    pub accuracy_percentage: f64,
    pub total_questions: i32,
    pub weak_topics: Vec<String>,
    pub strong_topics: Vec<String>,
}

/// 时间管理分析
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TimeManagementInsights {
    pub avg_time_per_question: f64,
    pub questions_too_slow: i32,
    pub questions_too_fast: i32,
    pub questions_skipped: i32,
    pub recommendation: String,
}

/// 按分类汇总的成绩
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CategoryPerformance {
    pub category: String,
    pub attempts: i64,
    pub passed: i64,
    pub average_percentage: f64,
}

/// 学生成绩总览
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceDashboard {
    pub completed_assessments: i64,
    /// 已完成但成绩暂未公布的次数，不计入下列成绩统计
    pub pending_results: i64,
    pub passed: i64,
    pub failed: i64,
    pub average_percentage: f64,
    pub pass_rate: f64,
    pub categories: Vec<CategoryPerformance>,
    pub recent_attempts: Vec<AttemptSummary>,
}
