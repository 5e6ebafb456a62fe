//! 成绩通知
//!
//! 评分提交后异步发出"成绩已出"事件，发送失败只记录日志。

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::errors::Result;
use crate::models::attempts::entities::{PassStatus, Session};
use crate::models::catalog::entities::Assessment;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ResultsAvailable {
    pub session_id: i64,
    pub student_id: i64,
    pub assessment_id: i64,
    pub assessment_title: String,
    /// 测评不公布成绩时为空
    pub percentage: Option<f64>,
    pub pass_status: Option<PassStatus>,
    pub graded_at: DateTime<Utc>,
}

impl ResultsAvailable {
    pub fn from_session(session: &Session, assessment: &Assessment) -> Self {
        let visible = assessment.show_results_immediately;
        Self {
            session_id: session.id,
            student_id: session.student_id,
            assessment_id: session.assessment_id,
            assessment_title: assessment.title.clone(),
            percentage: visible.then_some(session.percentage),
            pass_status: session.pass_status.filter(|_| visible),
            graded_at: session.submit_time.unwrap_or(session.updated_at),
        }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn results_available(&self, event: &ResultsAvailable) -> Result<()>;
}

/// 默认通知实现：写一条结构化日志
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn results_available(&self, event: &ResultsAvailable) -> Result<()> {
        info!(
            session_id = event.session_id,
            student_id = event.student_id,
            assessment_id = event.assessment_id,
            percentage = ?event.percentage,
            "Results available for {}",
            event.assessment_title
        );
        Ok(())
    }
}

/// 在后台发送通知，不等待结果
pub fn dispatch(notifier: Arc<dyn Notifier>, event: ResultsAvailable) {
    tokio::spawn(async move {
        if let Err(e) = notifier.results_available(&event).await {
            warn!(
                "Failed to deliver results notification for session {}: {}",
                event.session_id, e
            );
        }
    });
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    /// 记录收到的事件
    #[derive(Debug, Default)]
    pub struct RecordingNotifier {
        pub events: Mutex<Vec<ResultsAvailable>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn results_available(&self, event: &ResultsAvailable) -> Result<()> {
            self.events.lock().unwrap().push(event.clone());
            Ok(())
        }
    }

    struct FailingNotifier;

    #[async_trait]
    impl Notifier for FailingNotifier {
        async fn results_available(&self, _event: &ResultsAvailable) -> Result<()> {
            Err(crate::errors::PortalError::validation("mail relay down"))
        }
    }

    fn event() -> ResultsAvailable {
        ResultsAvailable {
            session_id: 1,
            student_id: 2,
            assessment_id: 3,
            assessment_title: "Aptitude".into(),
            percentage: Some(50.0),
            pass_status: Some(PassStatus::Pass),
            graded_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn dispatch_delivers_in_background() {
        let notifier = Arc::new(RecordingNotifier::default());
        dispatch(notifier.clone(), event());
        for _ in 0..50 {
            if !notifier.events.lock().unwrap().is_empty() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        assert_eq!(notifier.events.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failures_are_swallowed() {
        dispatch(Arc::new(FailingNotifier), event());
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        assert!(LogNotifier.results_available(&event()).await.is_ok());
    }
}
