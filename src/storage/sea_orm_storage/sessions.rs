//! 答题会话存储操作

use std::collections::{HashMap, HashSet};

use super::SeaOrmStorage;
use crate::entity::prelude::*;
use crate::entity::{student_answers, student_assessments::Column};
use crate::errors::{PortalError, Result};
use crate::models::{
    PaginationInfo,
    attempts::entities::{Finalization, GradeOutcome, NewSession, Session, SessionStatus},
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait, sea_query::Expr,
};
use tracing::debug;

impl SeaOrmStorage {
    /// 创建会话
    pub async fn create_session_impl(&self, session: NewSession) -> Result<Session> {
        let now = chrono::Utc::now().timestamp();

        let model = StudentAssessmentActiveModel {
            student_id: Set(session.student_id),
            assessment_id: Set(session.assessment_id),
            start_time: Set(session.start_time.timestamp()),
            end_time: Set(None),
            submit_time: Set(None),
            status: Set(SessionStatus::IN_PROGRESS.to_string()),
            total_marks: Set(session.total_marks),
            obtained_marks: Set(0),
            percentage: Set(0.0),
            pass_status: Set(None),
            pass_percentage: Set(session.pass_percentage),
            duration_minutes: Set(session.duration_minutes),
            time_taken: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| PortalError::database_operation(format!("创建会话失败: {e}")))?;

        Ok(result.into_session())
    }

    /// 通过 ID 获取会话
    pub async fn get_session_by_id_impl(&self, session_id: i64) -> Result<Option<Session>> {
        let result = StudentAssessments::find_by_id(session_id)
            .one(&self.db)
            .await
            .map_err(|e| PortalError::database_operation(format!("查询会话失败: {e}")))?;

        Ok(result.map(|m| m.into_session()))
    }

    /// 获取进行中的会话
    pub async fn find_in_progress_session_impl(
        &self,
        student_id: i64,
        assessment_id: i64,
    ) -> Result<Option<Session>> {
        let result = StudentAssessments::find()
            .filter(Column::StudentId.eq(student_id))
            .filter(Column::AssessmentId.eq(assessment_id))
            .filter(Column::Status.eq(SessionStatus::IN_PROGRESS))
            .order_by_desc(Column::StartTime)
            .one(&self.db)
            .await
            .map_err(|e| PortalError::database_operation(format!("查询会话失败: {e}")))?;

        Ok(result.map(|m| m.into_session()))
    }

    /// 是否已有完成的会话
    pub async fn has_completed_session_impl(
        &self,
        student_id: i64,
        assessment_id: i64,
    ) -> Result<bool> {
        let count = StudentAssessments::find()
            .filter(Column::StudentId.eq(student_id))
            .filter(Column::AssessmentId.eq(assessment_id))
            .filter(Column::Status.eq(SessionStatus::COMPLETED))
            .count(&self.db)
            .await
            .map_err(|e| PortalError::database_operation(format!("查询会话失败: {e}")))?;

        Ok(count > 0)
    }

    /// 学生在各测评上的最近一次会话
    pub async fn latest_sessions_impl(
        &self,
        student_id: i64,
        assessment_ids: &[i64],
    ) -> Result<HashMap<i64, Session>> {
        if assessment_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = StudentAssessments::find()
            .filter(Column::StudentId.eq(student_id))
            .filter(Column::AssessmentId.is_in(assessment_ids.to_vec()))
            .order_by_desc(Column::StartTime)
            .order_by_desc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| PortalError::database_operation(format!("查询会话失败: {e}")))?;

        let mut latest = HashMap::new();
        for row in rows {
            latest
                .entry(row.assessment_id)
                .or_insert_with(|| row.into_session());
        }
        Ok(latest)
    }

    /// 分页列出学生的会话
    pub async fn list_sessions_for_student_impl(
        &self,
        student_id: i64,
        page: u64,
        size: u64,
    ) -> Result<(Vec<Session>, PaginationInfo)> {
        let page = page.max(1);
        let size = size.clamp(1, 100);

        let paginator = StudentAssessments::find()
            .filter(Column::StudentId.eq(student_id))
            .order_by_desc(Column::StartTime)
            .order_by_desc(Column::Id)
            .paginate(&self.db, size);

        let total = paginator
            .num_items()
            .await
            .map_err(|e| PortalError::database_operation(format!("查询会话总数失败: {e}")))?;

        let pages = paginator
            .num_pages()
            .await
            .map_err(|e| PortalError::database_operation(format!("查询会话页数失败: {e}")))?;

        let sessions = paginator
            .fetch_page(page - 1)
            .await
            .map_err(|e| PortalError::database_operation(format!("查询会话列表失败: {e}")))?;

        Ok((
            sessions.into_iter().map(|m| m.into_session()).collect(),
            PaginationInfo::new(page, size, total, pages),
        ))
    }

    /// 学生全部已完成的会话
    pub async fn list_completed_sessions_impl(&self, student_id: i64) -> Result<Vec<Session>> {
        let rows = StudentAssessments::find()
            .filter(Column::StudentId.eq(student_id))
            .filter(Column::Status.eq(SessionStatus::COMPLETED))
            .order_by_desc(Column::SubmitTime)
            .order_by_desc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| PortalError::database_operation(format!("查询会话失败: {e}")))?;

        Ok(rows.into_iter().map(|m| m.into_session()).collect())
    }

    /// 开始时间早于给定时间的进行中会话
    pub async fn list_in_progress_started_before_impl(
        &self,
        before: DateTime<Utc>,
    ) -> Result<Vec<Session>> {
        let rows = StudentAssessments::find()
            .filter(Column::Status.eq(SessionStatus::IN_PROGRESS))
            .filter(Column::StartTime.lt(before.timestamp()))
            .order_by_asc(Column::StartTime)
            .all(&self.db)
            .await
            .map_err(|e| PortalError::database_operation(format!("查询会话失败: {e}")))?;

        Ok(rows.into_iter().map(|m| m.into_session()).collect())
    }

    /// 放弃会话
    pub async fn abandon_session_impl(&self, session_id: i64, at: DateTime<Utc>) -> Result<bool> {
        let result = StudentAssessments::update_many()
            .col_expr(Column::Status, Expr::value(SessionStatus::ABANDONED))
            .col_expr(Column::EndTime, Expr::value(Some(at.timestamp())))
            .col_expr(Column::UpdatedAt, Expr::value(at.timestamp()))
            .filter(Column::Id.eq(session_id))
            .filter(Column::Status.eq(SessionStatus::IN_PROGRESS))
            .exec(&self.db)
            .await
            .map_err(|e| PortalError::database_operation(format!("放弃会话失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    /// 评分并完成会话
    ///
    /// 在一个事务中补齐未作答题目的空记录，按作答记录汇总得分，
    /// 并把状态从 in_progress 条件更新为 completed。会话已不在进行中时回滚并返回 None。
    pub async fn finalize_session_impl(
        &self,
        finalization: Finalization,
    ) -> Result<Option<GradeOutcome>> {
        let Finalization {
            session_id,
            time_taken,
            finished_at,
            unanswered_question_ids,
        } = finalization;
        let finished = finished_at.timestamp();

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| PortalError::database_operation(format!("开启事务失败: {e}")))?;

        let Some(session) = StudentAssessments::find_by_id(session_id)
            .one(&txn)
            .await
            .map_err(|e| PortalError::database_operation(format!("查询会话失败: {e}")))?
        else {
            return Err(PortalError::not_found(format!("会话 {session_id} 不存在")));
        };

        if session.status != SessionStatus::IN_PROGRESS {
            debug!("Session {} is {}, skip finalization", session_id, session.status);
            return Ok(None);
        }

        let answers = StudentAnswers::find()
            .filter(student_answers::Column::StudentAssessmentId.eq(session_id))
            .all(&txn)
            .await
            .map_err(|e| PortalError::database_operation(format!("查询作答记录失败: {e}")))?;

        // 已经存在的作答记录不再补写
        let existing: HashSet<i64> = answers.iter().map(|a| a.question_id).collect();
        let obtained_marks: i32 = answers.iter().map(|a| a.marks_obtained).sum();

        for question_id in unanswered_question_ids {
            if existing.contains(&question_id) {
                continue;
            }
            let model = StudentAnswerActiveModel {
                student_assessment_id: Set(session_id),
                question_id: Set(question_id),
                student_answer: Set(None),
                is_correct: Set(false),
                marks_obtained: Set(0),
                time_spent: Set(0),
                created_at: Set(finished),
                updated_at: Set(finished),
                ..Default::default()
            };
            model
                .insert(&txn)
                .await
                .map_err(|e| PortalError::database_operation(format!("写入空作答失败: {e}")))?;
        }

        let outcome =
            GradeOutcome::compute(obtained_marks, session.total_marks, session.pass_percentage);

        let result = StudentAssessments::update_many()
            .col_expr(Column::Status, Expr::value(SessionStatus::COMPLETED))
            .col_expr(Column::ObtainedMarks, Expr::value(outcome.obtained_marks))
            .col_expr(Column::Percentage, Expr::value(outcome.percentage))
            .col_expr(
                Column::PassStatus,
                Expr::value(Some(outcome.pass_status.as_str())),
            )
            .col_expr(Column::TimeTaken, Expr::value(Some(time_taken)))
            .col_expr(Column::EndTime, Expr::value(Some(finished)))
            .col_expr(Column::SubmitTime, Expr::value(Some(finished)))
            .col_expr(Column::UpdatedAt, Expr::value(finished))
            .filter(Column::Id.eq(session_id))
            .filter(Column::Status.eq(SessionStatus::IN_PROGRESS))
            .exec(&txn)
            .await
            .map_err(|e| PortalError::database_operation(format!("完成会话失败: {e}")))?;

        if result.rows_affected == 0 {
            debug!("Session {} already finalized, rolling back", session_id);
            txn.rollback()
                .await
                .map_err(|e| PortalError::database_operation(format!("回滚事务失败: {e}")))?;
            return Ok(None);
        }

        txn.commit()
            .await
            .map_err(|e| PortalError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(Some(outcome))
    }
}
