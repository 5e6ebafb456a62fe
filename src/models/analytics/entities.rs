use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::models::catalog::entities::Difficulty;

/// 学习表现统计行
///
/// 以 (学生, 测评, 分类名, 难度) 为键，跨会话累积。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PerformanceAnalytics {
    pub id: i64,
    pub student_id: i64,
    pub assessment_id: Option<i64>,
    pub category: String,
    pub difficulty: Difficulty,
    pub total_questions: i32,
    pub correct_answers: i32,
    pub incorrect_answers: i32,
    pub accuracy_percentage: f64,
    pub avg_time_per_question: f64,
    pub questions_too_slow: i32,
    pub questions_too_fast: i32,
    pub questions_skipped: i32,
    /// 答错的题目 ID
    pub common_mistakes: Vec<i64>,
    pub weak_topics: Vec<String>,
    pub strong_topics: Vec<String>,
    pub improvement_rate: f64,
    pub consistency_score: f64,
    pub streak_correct: i32,
    pub max_streak: i32,
    pub study_time_minutes: i32,
    pub last_activity_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 统计分组键
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnalyticsKey {
    pub student_id: i64,
    pub assessment_id: i64,
    pub category: String,
    pub difficulty: Difficulty,
}

/// 聚合结果，由存储层插入或更新
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsUpsert {
    pub key: AnalyticsKey,
    /// 已存在行的 ID
    pub existing_id: Option<i64>,
    pub total_questions: i32,
    pub correct_answers: i32,
    pub incorrect_answers: i32,
    pub accuracy_percentage: f64,
    pub avg_time_per_question: f64,
    pub questions_too_slow: i32,
    pub questions_too_fast: i32,
    pub questions_skipped: i32,
    pub common_mistakes: Vec<i64>,
    pub weak_topics: Vec<String>,
    pub strong_topics: Vec<String>,
    pub improvement_rate: f64,
    pub consistency_score: f64,
    pub streak_correct: i32,
    pub max_streak: i32,
    pub study_time_minutes: i32,
    pub last_activity_date: NaiveDate,
}
