use std::collections::HashSet;

use tracing::{debug, error, info, warn};

use super::AttemptService;
use super::record::{ensure_answerable, write_answer};
use super::result::build_result;
use crate::errors::{PortalError, Result};
use crate::models::attempts::entities::{Finalization, Session, SessionStatus};
use crate::models::attempts::requests::SubmitAttemptRequest;
use crate::models::attempts::responses::AttemptResultResponse;
use crate::models::catalog::entities::AssessmentPaper;
use crate::services::notifier::{self, ResultsAvailable};

pub async fn submit_attempt(
    service: &AttemptService,
    student_id: i64,
    session_id: i64,
    req: SubmitAttemptRequest,
) -> Result<AttemptResultResponse> {
    let _guard = service.session_locks.lock(session_id).await;
    let session = service.load_owned(student_id, session_id).await?;
    let paper = service.paper_for(&session).await?;

    match session.status {
        SessionStatus::InProgress => {}
        // 重复提交直接返回已有成绩
        SessionStatus::Completed => {
            debug!("Session {} already graded, returning stored result", session_id);
            return build_result(service, &session, &paper).await;
        }
        SessionStatus::Abandoned => {
            return Err(PortalError::invalid_transition(format!(
                "作答 {session_id} 已放弃，不能提交"
            )));
        }
    }

    if service.is_expired(&session, service.now()) {
        if !req.answers.is_empty() {
            warn!(
                "Session {} submitted after deadline, {} inline answer(s) discarded",
                session_id,
                req.answers.len()
            );
        }
    } else {
        // 先整体校验，避免部分写入后才发现题目不属于该测评
        let mut seen = HashSet::new();
        for answer in &req.answers {
            ensure_answerable(&paper, answer.question_id)?;
            if !seen.insert(answer.question_id) {
                return Err(PortalError::validation(format!(
                    "题目 {} 在一次提交中重复作答",
                    answer.question_id
                )));
            }
        }
        for answer in &req.answers {
            write_answer(service, &session, &paper, answer).await?;
        }
    }

    let graded = finalize_locked(service, &session, &paper, req.elapsed_seconds).await?;
    build_result(service, &graded, &paper).await
}

/// 收卷并评分，调用方需持有会话锁
///
/// 会话已被其他路径完成时不会重复评分，返回库中的会话。
pub(crate) async fn finalize_locked(
    service: &AttemptService,
    session: &Session,
    paper: &AssessmentPaper,
    client_elapsed: Option<i32>,
) -> Result<Session> {
    let now = service.now();
    let time_taken = match client_elapsed {
        Some(elapsed) if service.settings.trust_client_elapsed => {
            elapsed.clamp(0, session.duration_seconds() as i32)
        }
        _ => session.measured_seconds(now),
    };

    let unanswered_question_ids = paper.active_questions().map(|q| q.question.id).collect();

    let outcome = service
        .storage
        .finalize_session(Finalization {
            session_id: session.id,
            time_taken,
            finished_at: now,
            unanswered_question_ids,
        })
        .await?;

    let stored = service
        .storage
        .get_session_by_id(session.id)
        .await?
        .ok_or_else(|| PortalError::not_found(format!("作答 {} 不存在", session.id)))?;

    let Some(outcome) = outcome else {
        debug!("Session {} was finalized elsewhere", session.id);
        return Ok(stored);
    };

    info!(
        "Session {} graded: {}/{} ({}%, {})",
        stored.id, outcome.obtained_marks, stored.total_marks, outcome.percentage, outcome.pass_status
    );

    // 统计失败不影响成绩
    match service.storage.list_answers(stored.id).await {
        Ok(answers) => {
            if let Err(e) = service.analytics.record_session(&stored, paper, &answers).await {
                error!("{}", e);
            }
        }
        Err(e) => error!("Failed to load answers for analytics of session {}: {}", stored.id, e),
    }

    notifier::dispatch(
        service.notifier.clone(),
        ResultsAvailable::from_session(&stored, &paper.assessment),
    );

    Ok(stored)
}

/// 超时收卷，自行获取会话锁
pub(crate) async fn finalize_expired(
    service: &AttemptService,
    session_id: i64,
    paper: &AssessmentPaper,
) -> Result<Session> {
    let _guard = service.session_locks.lock(session_id).await;
    let session = service
        .storage
        .get_session_by_id(session_id)
        .await?
        .ok_or_else(|| PortalError::not_found(format!("作答 {session_id} 不存在")))?;

    if session.status != SessionStatus::InProgress || !service.is_expired(&session, service.now()) {
        return Ok(session);
    }

    info!("Session {} passed its deadline, finalizing", session_id);
    finalize_locked(service, &session, paper, None).await
}
