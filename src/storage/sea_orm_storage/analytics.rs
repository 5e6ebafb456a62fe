//! 学习统计存储操作

use super::SeaOrmStorage;
use crate::entity::prelude::*;
use crate::entity::student_performance_analytics::Column;
use crate::errors::{PortalError, Result};
use crate::models::analytics::entities::{AnalyticsKey, AnalyticsUpsert, PerformanceAnalytics};
use crate::models::catalog::entities::Difficulty;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};

impl SeaOrmStorage {
    /// 获取统计行
    pub async fn get_analytics_impl(
        &self,
        key: &AnalyticsKey,
    ) -> Result<Option<PerformanceAnalytics>> {
        let result = StudentPerformanceAnalytics::find()
            .filter(Column::StudentId.eq(key.student_id))
            .filter(Column::AssessmentId.eq(key.assessment_id))
            .filter(Column::Category.eq(key.category.as_str()))
            .filter(Column::DifficultyLevel.eq(key.difficulty.to_string()))
            .one(&self.db)
            .await
            .map_err(|e| PortalError::database_operation(format!("查询学习统计失败: {e}")))?;

        Ok(result.map(|m| m.into_analytics()))
    }

    /// 同一 (学生, 分类, 难度) 最近的正确率，新的在前
    pub async fn recent_accuracies_impl(
        &self,
        student_id: i64,
        category: &str,
        difficulty: Difficulty,
        exclude_id: Option<i64>,
        limit: u64,
    ) -> Result<Vec<f64>> {
        let mut select = StudentPerformanceAnalytics::find()
            .filter(Column::StudentId.eq(student_id))
            .filter(Column::Category.eq(category))
            .filter(Column::DifficultyLevel.eq(difficulty.to_string()));

        if let Some(id) = exclude_id {
            select = select.filter(Column::Id.ne(id));
        }

        select
            .order_by_desc(Column::UpdatedAt)
            .order_by_desc(Column::Id)
            .limit(limit)
            .select_only()
            .column(Column::AccuracyPercentage)
            .into_tuple::<f64>()
            .all(&self.db)
            .await
            .map_err(|e| PortalError::database_operation(format!("查询历史正确率失败: {e}")))
    }

    /// 在一个事务中写入统计行
    pub async fn save_analytics_impl(&self, rows: Vec<AnalyticsUpsert>) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }

        let now = chrono::Utc::now().timestamp();
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| PortalError::database_operation(format!("开启事务失败: {e}")))?;

        for row in rows {
            let mut model = PerformanceAnalyticsActiveModel {
                student_id: Set(row.key.student_id),
                assessment_id: Set(Some(row.key.assessment_id)),
                category: Set(row.key.category),
                difficulty_level: Set(row.key.difficulty.to_string()),
                total_questions: Set(row.total_questions),
                correct_answers: Set(row.correct_answers),
                incorrect_answers: Set(row.incorrect_answers),
                accuracy_percentage: Set(row.accuracy_percentage),
                avg_time_per_question: Set(row.avg_time_per_question),
                questions_too_slow: Set(row.questions_too_slow),
                questions_too_fast: Set(row.questions_too_fast),
                questions_skipped: Set(row.questions_skipped),
                common_mistakes: Set(serde_json::to_string(&row.common_mistakes)?),
                weak_topics: Set(serde_json::to_string(&row.weak_topics)?),
                strong_topics: Set(serde_json::to_string(&row.strong_topics)?),
                improvement_rate: Set(row.improvement_rate),
                consistency_score: Set(row.consistency_score),
                streak_correct: Set(row.streak_correct),
                max_streak: Set(row.max_streak),
                study_time_minutes: Set(row.study_time_minutes),
                last_activity_date: Set(Some(
                    row.last_activity_date.format("%Y-%m-%d").to_string(),
                )),
                updated_at: Set(now),
                ..Default::default()
            };

            match row.existing_id {
                Some(id) => {
                    model.id = Set(id);
                    model.update(&txn).await.map_err(|e| {
                        PortalError::database_operation(format!("更新学习统计失败: {e}"))
                    })?;
                }
                None => {
                    model.created_at = Set(now);
                    model.insert(&txn).await.map_err(|e| {
                        PortalError::database_operation(format!("写入学习统计失败: {e}"))
                    })?;
                }
            }
        }

        txn.commit()
            .await
            .map_err(|e| PortalError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(())
    }

    /// 学生的全部统计行
    pub async fn list_analytics_for_student_impl(
        &self,
        student_id: i64,
    ) -> Result<Vec<PerformanceAnalytics>> {
        let rows = StudentPerformanceAnalytics::find()
            .filter(Column::StudentId.eq(student_id))
            .order_by_desc(Column::UpdatedAt)
            .order_by_desc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| PortalError::database_operation(format!("查询学习统计失败: {e}")))?;

        Ok(rows.into_iter().map(|m| m.into_analytics()).collect())
    }
}
