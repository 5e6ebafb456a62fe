use tracing::info;

use super::AttemptService;
use super::submit::finalize_locked;
use crate::errors::{PortalError, Result};
use crate::models::attempts::entities::SessionStatus;
use crate::models::attempts::responses::AttemptSummary;

/// 放弃进行中的作答：不评分，不计入统计，也不占用单次作答名额
pub async fn abandon_attempt(
    service: &AttemptService,
    student_id: i64,
    session_id: i64,
) -> Result<AttemptSummary> {
    let _guard = service.session_locks.lock(session_id).await;
    let session = service.load_owned(student_id, session_id).await?;

    session
        .status
        .transition(SessionStatus::Abandoned)
        .map_err(PortalError::invalid_transition)?;

    let paper = service.paper_for(&session).await?;
    let now = service.now();

    // 超时的会话按收卷处理
    if service.is_expired(&session, now) {
        finalize_locked(service, &session, &paper, None).await?;
        return Err(PortalError::deadline_passed(format!(
            "作答 {session_id} 已超过截止时间，已自动提交"
        )));
    }

    if !service.storage.abandon_session(session_id, now).await? {
        return Err(PortalError::invalid_transition(format!(
            "作答 {session_id} 已不在进行中"
        )));
    }

    let abandoned = service
        .storage
        .get_session_by_id(session_id)
        .await?
        .ok_or_else(|| PortalError::not_found(format!("作答 {session_id} 不存在")))?;

    info!("Student {} abandoned session {}", student_id, session_id);
    Ok(AttemptSummary::from_session(
        &abandoned,
        paper.assessment.show_results_immediately,
    ))
}
