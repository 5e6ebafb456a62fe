use tracing::info;

use super::AttemptService;
use super::submit::finalize_expired;
use crate::errors::{PortalError, Result};
use crate::models::attempts::entities::NewSession;
use crate::models::attempts::responses::{AttemptSummary, StartAttemptResponse};

pub async fn start_attempt(
    service: &AttemptService,
    student_id: i64,
    assessment_id: i64,
) -> Result<StartAttemptResponse> {
    let paper = service.catalog.get_paper(assessment_id).await?;
    let assessment = &paper.assessment;
    if assessment.is_deleted() {
        return Err(PortalError::not_found(format!("测评 {assessment_id} 不存在")));
    }
    let show_scores = assessment.show_results_immediately;

    // 同一学生的开始请求串行处理，避免并发创建两个进行中的会话
    let _guard = service.start_locks.lock(student_id).await;

    if let Some(existing) = service
        .storage
        .find_in_progress_session(student_id, assessment_id)
        .await?
    {
        if !service.is_expired(&existing, service.now()) {
            return Ok(StartAttemptResponse {
                attempt: AttemptSummary::from_session(&existing, show_scores),
                resumed: true,
            });
        }
        finalize_expired(service, existing.id, &paper).await?;
    }

    let now = service.now();
    paper.readiness(now).map_err(PortalError::not_ready)?;

    if !assessment.allow_multiple_attempts
        && service
            .storage
            .has_completed_session(student_id, assessment_id)
            .await?
    {
        return Err(PortalError::duplicate_attempt(format!(
            "测评 {assessment_id} 只允许作答一次"
        )));
    }

    let session = service
        .storage
        .create_session(NewSession {
            student_id,
            assessment_id,
            start_time: now,
            total_marks: assessment.total_marks,
            pass_percentage: assessment.pass_percentage,
            duration_minutes: assessment.duration_minutes,
        })
        .await?;

    info!(
        "Student {} started assessment {} (session {})",
        student_id, assessment_id, session.id
    );

    Ok(StartAttemptResponse {
        attempt: AttemptSummary::from_session(&session, show_scores),
        resumed: false,
    })
}
