//! 学习统计服务
//!
//! 评分提交后更新统计行，并为学生提供强弱项、时间管理和成绩总览。

pub mod aggregator;
pub mod insights;

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::errors::{PortalError, Result};
use crate::models::analytics::entities::AnalyticsKey;
use crate::models::analytics::responses::{
    PerformanceDashboard, TimeManagementInsights, TopicSummaryItem,
};
use crate::models::attempts::entities::{Session, StudentAnswer};
use crate::models::catalog::entities::AssessmentPaper;
use crate::services::catalog::CatalogService;
use crate::storage::Storage;
use crate::utils::{Clock, KeyedLocks};

use aggregator::{CONSISTENCY_WINDOW, SubmissionContext};
use insights::AssessmentLabel;

pub struct AnalyticsService {
    storage: Arc<dyn Storage>,
    catalog: Arc<CatalogService>,
    clock: Arc<dyn Clock>,
    // 同一学生的统计更新串行执行
    student_locks: KeyedLocks,
}

impl AnalyticsService {
    pub fn new(
        storage: Arc<dyn Storage>,
        catalog: Arc<CatalogService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            storage,
            catalog,
            clock,
            student_locks: KeyedLocks::new(),
        }
    }

    /// 根据一次已评分的会话更新统计，返回写入的行数
    pub async fn record_session(
        &self,
        session: &Session,
        paper: &AssessmentPaper,
        answers: &[StudentAnswer],
    ) -> Result<usize> {
        self.aggregate(session, paper, answers)
            .await
            .map_err(|e| PortalError::aggregation(format!("会话 {} 统计失败: {e}", session.id)))
    }

    async fn aggregate(
        &self,
        session: &Session,
        paper: &AssessmentPaper,
        answers: &[StudentAnswer],
    ) -> Result<usize> {
        let graded = aggregator::pair_with_paper(paper, answers);
        if graded.len() < answers.len() {
            warn!(
                "Session {}: {} answer(s) reference questions missing from the paper",
                session.id,
                answers.len() - graded.len()
            );
        }
        let groups = aggregator::group_by_difficulty(&graded);
        if groups.is_empty() {
            return Ok(0);
        }

        let category = paper.analytics_category().to_string();
        let ctx = SubmissionContext {
            time_taken: session.time_taken.unwrap_or(0),
            today: self.clock.today(),
        };

        let _guard = self.student_locks.lock(session.student_id).await;

        let mut rows = Vec::with_capacity(groups.len());
        for (difficulty, items) in groups {
            let key = AnalyticsKey {
                student_id: session.student_id,
                assessment_id: session.assessment_id,
                category: category.clone(),
                difficulty,
            };
            let existing = self.storage.get_analytics(&key).await?;
            let history = self
                .storage
                .recent_accuracies(
                    session.student_id,
                    &category,
                    difficulty,
                    existing.as_ref().map(|e| e.id),
                    (CONSISTENCY_WINDOW - 1) as u64,
                )
                .await?;

            let stats = aggregator::summarize_group(&items);
            rows.push(aggregator::merge_group(
                key,
                existing.as_ref(),
                &stats,
                &history,
                ctx,
            ));
        }

        let written = rows.len();
        self.storage.save_analytics(rows).await?;
        debug!(
            "Analytics updated for session {} ({} bucket(s))",
            session.id, written
        );
        Ok(written)
    }

    pub async fn weakness_summary(&self, student_id: i64) -> Result<Vec<TopicSummaryItem>> {
        let rows = self.storage.list_analytics_for_student(student_id).await?;
        Ok(insights::weakness_summary(&rows))
    }

    pub async fn strength_summary(&self, student_id: i64) -> Result<Vec<TopicSummaryItem>> {
        let rows = self.storage.list_analytics_for_student(student_id).await?;
        Ok(insights::strength_summary(&rows))
    }

    pub async fn time_management(&self, student_id: i64) -> Result<TimeManagementInsights> {
        let rows = self.storage.list_analytics_for_student(student_id).await?;
        Ok(insights::time_management(&rows))
    }

    pub async fn dashboard(&self, student_id: i64) -> Result<PerformanceDashboard> {
        let sessions = self.storage.list_completed_sessions(student_id).await?;

        let mut labels: HashMap<i64, AssessmentLabel> = HashMap::new();
        for session in &sessions {
            if labels.contains_key(&session.assessment_id) {
                continue;
            }
            let paper = self.catalog.get_paper(session.assessment_id).await?;
            labels.insert(
                session.assessment_id,
                AssessmentLabel {
                    category: paper.analytics_category().to_string(),
                    show_results: paper.assessment.show_results_immediately,
                },
            );
        }

        Ok(insights::performance_dashboard(&sessions, &labels))
    }
}
