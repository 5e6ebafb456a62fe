//! 作答会话服务
//!
//! 开始、记录作答、提交评分、放弃以及超时收卷。同一会话的作答写入与收卷由会话锁串行化，
//! 评分本身再由存储层的条件状态更新保证只发生一次。

pub mod abandon;
pub mod record;
pub mod result;
pub mod start;
pub mod submit;
pub mod sweep;


use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::config::AssessmentConfig;
use crate::errors::{PortalError, Result};
use crate::models::attempts::entities::Session;
use crate::models::attempts::requests::{
    AttemptHistoryParams, RecordAnswerRequest, SubmitAttemptRequest,
};
use crate::models::attempts::responses::{
    AttemptListResponse, AttemptResultResponse, AttemptSummary, RecordedAnswerResponse,
    StartAttemptResponse,
};
use crate::models::catalog::entities::AssessmentPaper;
use crate::services::analytics::AnalyticsService;
use crate::services::catalog::CatalogService;
use crate::services::notifier::Notifier;
use crate::storage::Storage;
use crate::utils::{Clock, KeyedLocks};

/// 作答相关设置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptSettings {
    pub deadline_grace_seconds: i64,
    pub trust_client_elapsed: bool,
}

impl Default for AttemptSettings {
    fn default() -> Self {
        Self::from_config(&AssessmentConfig::default())
    }
}

impl AttemptSettings {
    pub fn from_config(config: &AssessmentConfig) -> Self {
        Self {
            deadline_grace_seconds: config.deadline_grace_seconds,
            trust_client_elapsed: config.trust_client_elapsed,
        }
    }
}

pub struct AttemptService {
    storage: Arc<dyn Storage>,
    catalog: Arc<CatalogService>,
    analytics: Arc<AnalyticsService>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    settings: AttemptSettings,
    // 按会话串行化作答写入与收卷
    session_locks: KeyedLocks,
    // 按学生串行化开始作答
    start_locks: KeyedLocks,
}

impl AttemptService {
    pub fn new(
        storage: Arc<dyn Storage>,
        catalog: Arc<CatalogService>,
        analytics: Arc<AnalyticsService>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        settings: AttemptSettings,
    ) -> Self {
        Self {
            storage,
            catalog,
            analytics,
            notifier,
            clock,
            settings,
            session_locks: KeyedLocks::new(),
            start_locks: KeyedLocks::new(),
        }
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub(crate) fn is_expired(&self, session: &Session, now: DateTime<Utc>) -> bool {
        session.is_expired(now, self.settings.deadline_grace_seconds)
    }

    /// 读取会话并校验归属
    pub(crate) async fn load_owned(&self, student_id: i64, session_id: i64) -> Result<Session> {
        let session = self
            .storage
            .get_session_by_id(session_id)
            .await?
            .ok_or_else(|| PortalError::not_found(format!("作答 {session_id} 不存在")))?;

        if !session.is_owned_by(student_id) {
            return Err(PortalError::forbidden(format!(
                "作答 {session_id} 不属于当前学生"
            )));
        }
        Ok(session)
    }

    async fn paper_for(&self, session: &Session) -> Result<AssessmentPaper> {
        self.catalog.get_paper(session.assessment_id).await
    }

    pub async fn start_attempt(
        &self,
        student_id: i64,
        assessment_id: i64,
    ) -> Result<StartAttemptResponse> {
        start::start_attempt(self, student_id, assessment_id).await
    }

    pub async fn record_answer(
        &self,
        student_id: i64,
        session_id: i64,
        req: RecordAnswerRequest,
    ) -> Result<RecordedAnswerResponse> {
        record::record_answer(self, student_id, session_id, req).await
    }

    pub async fn submit_attempt(
        &self,
        student_id: i64,
        session_id: i64,
        req: SubmitAttemptRequest,
    ) -> Result<AttemptResultResponse> {
        submit::submit_attempt(self, student_id, session_id, req).await
    }

    pub async fn abandon_attempt(&self, student_id: i64, session_id: i64) -> Result<AttemptSummary> {
        abandon::abandon_attempt(self, student_id, session_id).await
    }

    pub async fn get_result(
        &self,
        student_id: i64,
        session_id: i64,
    ) -> Result<AttemptResultResponse> {
        result::get_result(self, student_id, session_id).await
    }

    pub async fn list_results(
        &self,
        student_id: i64,
        params: AttemptHistoryParams,
    ) -> Result<AttemptListResponse> {
        result::list_results(self, student_id, params).await
    }

    /// 收掉所有已超时的会话，返回本次完成的数量
    pub async fn sweep_expired(&self) -> Result<usize> {
        sweep::sweep_expired(self).await
    }
}
