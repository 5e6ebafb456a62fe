use std::collections::HashMap;

use tracing::warn;

use super::AttemptService;
use super::submit::finalize_expired;
use crate::errors::Result;
use crate::models::attempts::entities::{Session, SessionStatus};
use crate::models::attempts::requests::AttemptHistoryParams;
use crate::models::attempts::responses::{
    AttemptListResponse, AttemptResultResponse, AttemptSummary,
};
use crate::models::catalog::entities::AssessmentPaper;

pub(crate) async fn build_result(
    service: &AttemptService,
    session: &Session,
    paper: &AssessmentPaper,
) -> Result<AttemptResultResponse> {
    let answers = service.storage.list_answers(session.id).await?;
    Ok(AttemptResultResponse::build(session, paper, &answers))
}

pub async fn get_result(
    service: &AttemptService,
    student_id: i64,
    session_id: i64,
) -> Result<AttemptResultResponse> {
    let mut session = service.load_owned(student_id, session_id).await?;
    let paper = service.paper_for(&session).await?;

    // 访问时顺带收掉已超时的会话
    if session.status == SessionStatus::InProgress && service.is_expired(&session, service.now()) {
        session = finalize_expired(service, session_id, &paper).await?;
    }

    build_result(service, &session, &paper).await
}

pub async fn list_results(
    service: &AttemptService,
    student_id: i64,
    params: AttemptHistoryParams,
) -> Result<AttemptListResponse> {
    let (page, size) = params.pagination.normalized();
    let (sessions, pagination) = service
        .storage
        .list_sessions_for_student(student_id, page, size)
        .await?;

    let mut show_scores: HashMap<i64, bool> = HashMap::new();
    for session in &sessions {
        if show_scores.contains_key(&session.assessment_id) {
            continue;
        }
        let show = match service.paper_for(session).await {
            Ok(paper) => paper.assessment.show_results_immediately,
            Err(e) => {
                // 读不到测评时按不公布处理
                warn!(
                    "Failed to load assessment {} for history: {}",
                    session.assessment_id, e
                );
                false
            }
        };
        show_scores.insert(session.assessment_id, show);
    }

    let items = sessions
        .iter()
        .map(|s| {
            AttemptSummary::from_session(
                s,
                show_scores.get(&s.assessment_id).copied().unwrap_or(false),
            )
        })
        .collect();

    Ok(AttemptListResponse { items, pagination })
}
