//! SeaORM 存储实现
//!
//! 统一的数据库存储层，支持 SQLite、PostgreSQL 和 MySQL。

mod analytics;
mod answers;
mod catalog;
mod sessions;

#[cfg(test)]
mod tests;

use crate::config::AppConfig;
use crate::errors::{PortalError, Result};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use std::collections::HashMap;
use std::time::Duration;
use tracing::info;

/// SeaORM 存储实现
#[derive(Clone)]
pub struct SeaOrmStorage {
    pub(crate) db: DatabaseConnection,
}

impl SeaOrmStorage {
    /// 按全局配置创建存储实例
    pub async fn new_async() -> Result<Self> {
        let config = AppConfig::get();
        Self::connect(
            &config.database.url,
            config.database.pool_size,
            config.database.timeout,
        )
        .await
    }

    /// 连接数据库并运行迁移
    pub async fn connect(url: &str, pool_size: u32, timeout: u64) -> Result<Self> {
        let db_url = Self::build_database_url(url)?;

        // 根据数据库类型选择连接方式
        let db = if db_url.starts_with("sqlite:") {
            Self::connect_sqlite(&db_url, pool_size, timeout).await?
        } else {
            Self::connect_generic(&db_url, pool_size, timeout).await?
        };

        // 运行迁移
        Migrator::up(&db, None)
            .await
            .map_err(|e| PortalError::database_operation(format!("数据库迁移失败: {e}")))?;

        info!("SeaORM storage initialized, database: {}", db_url);

        Ok(Self { db })
    }

    /// SQLite 专用连接（文件库启用 WAL + pragma 优化）
    async fn connect_sqlite(url: &str, pool_size: u32, timeout: u64) -> Result<DatabaseConnection> {
        use sea_orm::SqlxSqliteConnector;
        use sea_orm::sqlx::sqlite::{
            SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
        };
        use std::str::FromStr;

        let in_memory = url.contains(":memory:");

        let mut opt = SqliteConnectOptions::from_str(url)
            .map_err(|e| PortalError::database_config(format!("SQLite URL 解析失败: {e}")))?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5))
            .pragma("temp_store", "memory");

        if !in_memory {
            opt = opt
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal)
                .pragma("cache_size", "-64000")
                .pragma("wal_autocheckpoint", "1000");
        }

        // 内存库每个连接都是独立的数据库，只能使用单连接
        let (max, idle) = if in_memory {
            (1, None)
        } else {
            (pool_size.max(1), Some(Duration::from_secs(300)))
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(max)
            .min_connections(1)
            .test_before_acquire(true)
            .acquire_timeout(Duration::from_secs(timeout))
            .idle_timeout(idle)
            .max_lifetime(if in_memory { None } else { Some(Duration::from_secs(1800)) })
            .connect_with(opt)
            .await
            .map_err(|e| PortalError::database_connection(format!("SQLite 连接失败: {e}")))?;

        Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
    }

    /// 通用连接（PostgreSQL、MySQL 等）
    async fn connect_generic(
        url: &str,
        pool_size: u32,
        timeout: u64,
    ) -> Result<DatabaseConnection> {
        let mut opt = ConnectOptions::new(url);
        opt.max_connections(pool_size)
            .min_connections(pool_size.min(5))
            .connect_timeout(Duration::from_secs(timeout))
            .acquire_timeout(Duration::from_secs(timeout))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .sqlx_logging(false)
            .sqlx_logging_level(tracing::log::LevelFilter::Debug);

        Database::connect(opt)
            .await
            .map_err(|e| PortalError::database_connection(format!("无法连接到数据库: {e}")))
    }

    /// 从 URL 自动推断数据库类型并构建连接 URL
    fn build_database_url(url: &str) -> Result<String> {
        if url.starts_with("sqlite:") {
            Ok(url.to_string())
        } else if url == ":memory:" {
            Ok("sqlite::memory:".to_string())
        } else if url.ends_with(".db") || url.ends_with(".sqlite") {
            Ok(format!("sqlite://{url}?mode=rwc"))
        } else if url.starts_with("postgres://")
            || url.starts_with("postgresql://")
            || url.starts_with("mysql://")
            || url.starts_with("mariadb://")
        {
            Ok(url.to_string())
        } else {
            Err(PortalError::database_config(format!(
                "无法从 URL 推断数据库类型: {url}. 支持: sqlite://, postgres://, mysql://, 或 .db/.sqlite 文件路径"
            )))
        }
    }
}

// Storage trait 实现
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
use crate::storage::Storage;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
impl Storage for SeaOrmStorage {
    // 题库模块
    async fn create_category(&self, name: &str) -> Result<Category> {
        self.create_category_impl(name).await
    }

    async fn get_category_by_name(&self, name: &str) -> Result<Option<Category>> {
        self.get_category_by_name_impl(name).await
    }

    async fn get_category_by_id(&self, category_id: i64) -> Result<Option<Category>> {
        self.get_category_by_id_impl(category_id).await
    }

    async fn category_in_use(&self, category_id: i64) -> Result<bool> {
        self.category_in_use_impl(category_id).await
    }

    async fn delete_category(&self, category_id: i64) -> Result<bool> {
        self.delete_category_impl(category_id).await
    }

    async fn create_question(&self, req: CreateQuestionRequest) -> Result<Question> {
        self.create_question_impl(req).await
    }

    async fn get_question_by_id(&self, question_id: i64) -> Result<Option<Question>> {
        self.get_question_by_id_impl(question_id).await
    }

    async fn set_question_active(&self, question_id: i64, active: bool) -> Result<bool> {
        self.set_question_active_impl(question_id, active).await
    }

    async fn create_assessment(&self, req: CreateAssessmentRequest) -> Result<Assessment> {
        self.create_assessment_impl(req).await
    }

    async fn get_assessment_by_id(&self, assessment_id: i64) -> Result<Option<Assessment>> {
        self.get_assessment_by_id_impl(assessment_id).await
    }

    async fn attach_questions(&self, assessment_id: i64, question_ids: &[i64]) -> Result<()> {
        self.attach_questions_impl(assessment_id, question_ids)
            .await
    }

    async fn list_assessment_question_ids(&self, assessment_id: i64) -> Result<Vec<i64>> {
        self.list_assessment_question_ids_impl(assessment_id).await
    }

    async fn soft_delete_assessment(&self, assessment_id: i64) -> Result<bool> {
        self.soft_delete_assessment_impl(assessment_id).await
    }

    async fn get_assessment_paper(&self, assessment_id: i64) -> Result<Option<AssessmentPaper>> {
        self.get_assessment_paper_impl(assessment_id).await
    }

    async fn list_available_assessments(
        &self,
        query: AvailableAssessmentQuery,
    ) -> Result<(Vec<Assessment>, PaginationInfo)> {
        self.list_available_assessments_impl(query).await
    }

    async fn count_active_questions(&self, assessment_ids: &[i64]) -> Result<HashMap<i64, i64>> {
        self.count_active_questions_impl(assessment_ids).await
    }

    async fn count_assessments(&self) -> Result<u64> {
        self.count_assessments_impl().await
    }

    // 会话模块
    async fn create_session(&self, session: NewSession) -> Result<Session> {
        self.create_session_impl(session).await
    }

    async fn get_session_by_id(&self, session_id: i64) -> Result<Option<Session>> {
        self.get_session_by_id_impl(session_id).await
    }

    async fn find_in_progress_session(
        &self,
        student_id: i64,
        assessment_id: i64,
    ) -> Result<Option<Session>> {
        self.find_in_progress_session_impl(student_id, assessment_id)
            .await
    }

    async fn has_completed_session(&self, student_id: i64, assessment_id: i64) -> Result<bool> {
        self.has_completed_session_impl(student_id, assessment_id)
            .await
    }

    async fn latest_sessions(
        &self,
        student_id: i64,
        assessment_ids: &[i64],
    ) -> Result<HashMap<i64, Session>> {
        self.latest_sessions_impl(student_id, assessment_ids).await
    }

    async fn list_sessions_for_student(
        &self,
        student_id: i64,
        page: u64,
        size: u64,
    ) -> Result<(Vec<Session>, PaginationInfo)> {
        self.list_sessions_for_student_impl(student_id, page, size)
            .await
    }

    async fn list_completed_sessions(&self, student_id: i64) -> Result<Vec<Session>> {
        self.list_completed_sessions_impl(student_id).await
    }

    async fn list_in_progress_started_before(&self, before: DateTime<Utc>) -> Result<Vec<Session>> {
        self.list_in_progress_started_before_impl(before).await
    }

    async fn abandon_session(&self, session_id: i64, at: DateTime<Utc>) -> Result<bool> {
        self.abandon_session_impl(session_id, at).await
    }

    async fn finalize_session(&self, finalization: Finalization) -> Result<Option<GradeOutcome>> {
        self.finalize_session_impl(finalization).await
    }

    // 作答模块
    async fn upsert_answer(&self, answer: AnswerWrite) -> Result<StudentAnswer> {
        self.upsert_answer_impl(answer).await
    }

    async fn list_answers(&self, session_id: i64) -> Result<Vec<StudentAnswer>> {
        self.list_answers_impl(session_id).await
    }

    // 统计模块
    async fn get_analytics(&self, key: &AnalyticsKey) -> Result<Option<PerformanceAnalytics>> {
        self.get_analytics_impl(key).await
    }

    async fn recent_accuracies(
        &self,
        student_id: i64,
        category: &str,
        difficulty: Difficulty,
        exclude_id: Option<i64>,
        limit: u64,
    ) -> Result<Vec<f64>> {
        self.recent_accuracies_impl(student_id, category, difficulty, exclude_id, limit)
            .await
    }

    async fn save_analytics(&self, rows: Vec<AnalyticsUpsert>) -> Result<()> {
        self.save_analytics_impl(rows).await
    }

    async fn list_analytics_for_student(
        &self,
        student_id: i64,
    ) -> Result<Vec<PerformanceAnalytics>> {
        self.list_analytics_for_student_impl(student_id).await
    }

    // 系统模块
    async fn ping(&self) -> Result<()> {
        self.db
            .execute_unprepared("SELECT 1")
            .await
            .map_err(|e| PortalError::database_connection(format!("数据库连通性检查失败: {e}")))?;
        Ok(())
    }
}
