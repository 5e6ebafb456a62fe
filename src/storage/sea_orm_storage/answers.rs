//! 作答记录存储操作

use super::SeaOrmStorage;
use crate::entity::prelude::*;
use crate::entity::{student_answers::Column, student_assessments};
use crate::errors::{PortalError, Result};
use crate::models::attempts::entities::{AnswerWrite, SessionStatus, StudentAnswer};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};

impl SeaOrmStorage {
    /// 写入或覆盖单题作答
    ///
    /// 会话已不在进行中时拒绝写入，评分后的作答记录不可修改。
    pub async fn upsert_answer_impl(&self, answer: AnswerWrite) -> Result<StudentAnswer> {
        let now = chrono::Utc::now().timestamp();

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| PortalError::database_operation(format!("开启事务失败: {e}")))?;

        let status = StudentAssessments::find_by_id(answer.session_id)
            .one(&txn)
            .await
            .map_err(|e| PortalError::database_operation(format!("查询会话失败: {e}")))?
            .map(|s| s.status)
            .ok_or_else(|| PortalError::not_found(format!("会话 {} 不存在", answer.session_id)))?;

        if status != SessionStatus::IN_PROGRESS {
            return Err(PortalError::already_graded(format!(
                "会话 {} 已结束，作答不可修改",
                answer.session_id
            )));
        }

        let existing = StudentAnswers::find()
            .filter(Column::StudentAssessmentId.eq(answer.session_id))
            .filter(Column::QuestionId.eq(answer.question_id))
            .one(&txn)
            .await
            .map_err(|e| PortalError::database_operation(format!("查询作答记录失败: {e}")))?;

        let saved = match existing {
            Some(row) => {
                let mut model: StudentAnswerActiveModel = row.into();
                model.student_answer = Set(answer.student_answer);
                model.is_correct = Set(answer.is_correct);
                model.marks_obtained = Set(answer.marks_obtained);
                model.time_spent = Set(answer.time_spent.max(0));
                model.updated_at = Set(now);
                model
                    .update(&txn)
                    .await
                    .map_err(|e| PortalError::database_operation(format!("更新作答失败: {e}")))?
            }
            None => {
                let model = StudentAnswerActiveModel {
                    student_assessment_id: Set(answer.session_id),
                    question_id: Set(answer.question_id),
                    student_answer: Set(answer.student_answer),
                    is_correct: Set(answer.is_correct),
                    marks_obtained: Set(answer.marks_obtained),
                    time_spent: Set(answer.time_spent.max(0)),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                };
                model
                    .insert(&txn)
                    .await
                    .map_err(|e| PortalError::database_operation(format!("写入作答失败: {e}")))?
            }
        };

        // 记录会话的最近活动时间
        StudentAssessments::update_many()
            .col_expr(
                student_assessments::Column::UpdatedAt,
                sea_orm::sea_query::Expr::value(now),
            )
            .filter(student_assessments::Column::Id.eq(answer.session_id))
            .exec(&txn)
            .await
            .map_err(|e| PortalError::database_operation(format!("更新会话失败: {e}")))?;

        txn.commit()
            .await
            .map_err(|e| PortalError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(saved.into_answer())
    }

    /// 会话的全部作答
    pub async fn list_answers_impl(&self, session_id: i64) -> Result<Vec<StudentAnswer>> {
        let rows = StudentAnswers::find()
            .filter(Column::StudentAssessmentId.eq(session_id))
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| PortalError::database_operation(format!("查询作答记录失败: {e}")))?;

        Ok(rows.into_iter().map(|m| m.into_answer()).collect())
    }
}
