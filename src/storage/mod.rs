use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::errors::Result;
use crate::models::{
    PaginationInfo,
    analytics::entities::{AnalyticsKey, AnalyticsUpsert, PerformanceAnalytics},
    attempts::entities::{
        AnswerWrite, Finalization, GradeOutcome, NewSession, Session, StudentAnswer,
    },
    catalog::{
        entities::{Assessment, AssessmentPaper, Category, Difficulty, Question},
        requests::{AvailableAssessmentQuery, CreateAssessmentRequest, CreateQuestionRequest},
    },
};

pub mod sea_orm_storage;

#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// 题库管理方法
    // 创建分类
    async fn create_category(&self, name: &str) -> Result<Category>;
    // 通过名称获取分类
    async fn get_category_by_name(&self, name: &str) -> Result<Option<Category>>;
    // 通过ID获取分类
    async fn get_category_by_id(&self, category_id: i64) -> Result<Option<Category>>;
    // 分类是否仍被题目或测评引用
    async fn category_in_use(&self, category_id: i64) -> Result<bool>;
    // 删除分类
    async fn delete_category(&self, category_id: i64) -> Result<bool>;
    // 创建题目
    async fn create_question(&self, req: CreateQuestionRequest) -> Result<Question>;
    // 通过ID获取题目
    async fn get_question_by_id(&self, question_id: i64) -> Result<Option<Question>>;
    // 启用/停用题目
    async fn set_question_active(&self, question_id: i64, active: bool) -> Result<bool>;
    // 创建测评
    async fn create_assessment(&self, req: CreateAssessmentRequest) -> Result<Assessment>;
    // 通过ID获取测评（包含已软删除的）
    async fn get_assessment_by_id(&self, assessment_id: i64) -> Result<Option<Assessment>>;
    // 按顺序追加题目
    async fn attach_questions(&self, assessment_id: i64, question_ids: &[i64]) -> Result<()>;
    // 测评中已关联的题目ID
    async fn list_assessment_question_ids(&self, assessment_id: i64) -> Result<Vec<i64>>;
    // 软删除测评
    async fn soft_delete_assessment(&self, assessment_id: i64) -> Result<bool>;
    // 加载测评试卷
    async fn get_assessment_paper(&self, assessment_id: i64) -> Result<Option<AssessmentPaper>>;
    // 分页列出可参加的测评
    async fn list_available_assessments(
        &self,
        query: AvailableAssessmentQuery,
    ) -> Result<(Vec<Assessment>, PaginationInfo)>;
    // 各测评的启用题目数
    async fn count_active_questions(&self, assessment_ids: &[i64]) -> Result<HashMap<i64, i64>>;
    // 测评总数（含软删除）
    async fn count_assessments(&self) -> Result<u64>;

    /// 答题会话方法
    // 创建会话
    async fn create_session(&self, session: NewSession) -> Result<Session>;
    // 通过ID获取会话
    async fn get_session_by_id(&self, session_id: i64) -> Result<Option<Session>>;
    // 获取学生在某测评上进行中的会话
    async fn find_in_progress_session(
        &self,
        student_id: i64,
        assessment_id: i64,
    ) -> Result<Option<Session>>;
    // 学生在某测评上是否已有完成的会话
    async fn has_completed_session(&self, student_id: i64, assessment_id: i64) -> Result<bool>;
    // 学生在各测评上的最近一次会话
    async fn latest_sessions(
        &self,
        student_id: i64,
        assessment_ids: &[i64],
    ) -> Result<HashMap<i64, Session>>;
    // 分页列出学生的会话（新的在前）
    async fn list_sessions_for_student(
        &self,
        student_id: i64,
        page: u64,
        size: u64,
    ) -> Result<(Vec<Session>, PaginationInfo)>;
    // 学生全部已完成的会话（新的在前）
    async fn list_completed_sessions(&self, student_id: i64) -> Result<Vec<Session>>;
    // 开始时间早于给定时间的进行中会话
    async fn list_in_progress_started_before(&self, before: DateTime<Utc>) -> Result<Vec<Session>>;
    // 放弃会话（仅 in_progress）
    async fn abandon_session(&self, session_id: i64, at: DateTime<Utc>) -> Result<bool>;
    // 评分并完成会话；会话已不在进行中时返回 None
    async fn finalize_session(&self, finalization: Finalization) -> Result<Option<GradeOutcome>>;

    /// 作答记录方法
    // 写入或覆盖单题作答（会话必须进行中）
    async fn upsert_answer(&self, answer: AnswerWrite) -> Result<StudentAnswer>;
    // 会话的全部作答
    async fn list_answers(&self, session_id: i64) -> Result<Vec<StudentAnswer>>;

    /// 学习统计方法
    // 获取统计行
    async fn get_analytics(&self, key: &AnalyticsKey) -> Result<Option<PerformanceAnalytics>>;
    // 同一 (学生, 分类, 难度) 最近的正确率（新的在前），排除指定行
    async fn recent_accuracies(
        &self,
        student_id: i64,
        category: &str,
        difficulty: Difficulty,
        exclude_id: Option<i64>,
        limit: u64,
    ) -> Result<Vec<f64>>;
    // 在一个事务中写入一次提交产生的全部统计行
    async fn save_analytics(&self, rows: Vec<AnalyticsUpsert>) -> Result<()>;
    // 学生的全部统计行
    async fn list_analytics_for_student(&self, student_id: i64)
    -> Result<Vec<PerformanceAnalytics>>;

    /// 系统方法
    // 数据库连通性检查
    async fn ping(&self) -> Result<()>;
}

/// 按全局配置创建存储后端
pub async fn create_storage() -> Result<Arc<dyn Storage>> {
    let storage = sea_orm_storage::SeaOrmStorage::new_async().await?;
    Ok(Arc::new(storage))
}
