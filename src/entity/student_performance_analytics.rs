//! 学习表现统计实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "student_performance_analytics")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub student_id: i64,
    pub assessment_id: Option<i64>,
    pub category: String,
    pub difficulty_level: String,
    pub total_questions: i32,
    pub correct_answers: i32,
    pub incorrect_answers: i32,
    pub accuracy_percentage: f64,
    pub avg_time_per_question: f64,
    pub questions_too_slow: i32,
    pub questions_too_fast: i32,
    pub questions_skipped: i32,
    // 以下三列为 JSON 数组
    #[sea_orm(column_type = "Text")]
    pub common_mistakes: String,
    #[sea_orm(column_type = "Text")]
    pub weak_topics: String,
    #[sea_orm(column_type = "Text")]
    pub strong_topics: String,
    pub improvement_rate: f64,
    pub consistency_score: f64,
    pub streak_correct: i32,
    pub max_streak: i32,
    pub study_time_minutes: i32,
    pub last_activity_date: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

// 从数据库模型转换为业务模型
impl Model {
    pub fn into_analytics(self) -> crate::models::analytics::entities::PerformanceAnalytics {
        use crate::models::analytics::entities::PerformanceAnalytics;
        use crate::models::catalog::entities::Difficulty;
        use chrono::{DateTime, NaiveDate, Utc};

        PerformanceAnalytics {
            id: self.id,
            student_id: self.student_id,
            assessment_id: self.assessment_id,
            category: self.category,
            difficulty: self
                .difficulty_level
                .parse::<Difficulty>()
                .unwrap_or(Difficulty::Medium),
            total_questions: self.total_questions,
            correct_answers: self.correct_answers,
            incorrect_answers: self.incorrect_answers,
            accuracy_percentage: self.accuracy_percentage,
            avg_time_per_question: self.avg_time_per_question,
            questions_too_slow: self.questions_too_slow,
            questions_too_fast: self.questions_too_fast,
            questions_skipped: self.questions_skipped,
            common_mistakes: serde_json::from_str(&self.common_mistakes).unwrap_or_default(),
            weak_topics: serde_json::from_str(&self.weak_topics).unwrap_or_default(),
            strong_topics: serde_json::from_str(&self.strong_topics).unwrap_or_default(),
            improvement_rate: self.improvement_rate,
            consistency_score: self.consistency_score,
            streak_correct: self.streak_correct,
            max_streak: self.max_streak,
            study_time_minutes: self.study_time_minutes,
            last_activity_date: self
                .last_activity_date
                .and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok()),
            created_at: DateTime::<Utc>::from_timestamp(self.created_at, 0).unwrap_or_default(),
            updated_at: DateTime::<Utc>::from_timestamp(self.updated_at, 0).unwrap_or_default(),
        }
    }
}
