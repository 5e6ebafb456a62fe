use super::AttemptService;
use super::submit::finalize_locked;
use crate::errors::{PortalError, Result};
use crate::models::attempts::entities::{AnswerWrite, Session, SessionStatus, StudentAnswer};
use crate::models::attempts::requests::RecordAnswerRequest;
use crate::models::attempts::responses::RecordedAnswerResponse;
use crate::models::catalog::entities::{AssessmentPaper, PaperQuestion};
use crate::services::grading::evaluate_answer;

/// 题目必须属于该测评且处于启用状态
pub(crate) fn ensure_answerable(
    paper: &AssessmentPaper,
    question_id: i64,
) -> Result<&PaperQuestion> {
    paper
        .find_question(question_id)
        .filter(|q| q.question.is_active)
        .ok_or_else(|| {
            PortalError::invalid_question(format!(
                "题目 {question_id} 不属于测评 {}",
                paper.assessment.id
            ))
        })
}

/// 判分并写入单题作答，调用方需持有会话锁
pub(crate) async fn write_answer(
    service: &AttemptService,
    session: &Session,
    paper: &AssessmentPaper,
    req: &RecordAnswerRequest,
) -> Result<StudentAnswer> {
    let question = ensure_answerable(paper, req.question_id)?;
    let evaluation = evaluate_answer(&question.question, req.answer.as_deref());

    service
        .storage
        .upsert_answer(AnswerWrite {
            session_id: session.id,
            question_id: req.question_id,
            student_answer: evaluation.normalized,
            is_correct: evaluation.is_correct,
            marks_obtained: evaluation.marks_obtained,
            time_spent: req.time_spent.max(0),
        })
        .await
}

pub async fn record_answer(
    service: &AttemptService,
    student_id: i64,
    session_id: i64,
    req: RecordAnswerRequest,
) -> Result<RecordedAnswerResponse> {
    let _guard = service.session_locks.lock(session_id).await;
    let session = service.load_owned(student_id, session_id).await?;

    if session.status != SessionStatus::InProgress {
        return Err(PortalError::already_graded(format!(
            "作答 {session_id} 已{}，不能再修改",
            if session.status == SessionStatus::Completed {
                "提交"
            } else {
                "放弃"
            }
        )));
    }

    let paper = service.paper_for(&session).await?;

    if service.is_expired(&session, service.now()) {
        finalize_locked(service, &session, &paper, None).await?;
        return Err(PortalError::deadline_passed(format!(
            "作答 {session_id} 已超过截止时间，已自动提交"
        )));
    }

    let saved = write_answer(service, &session, &paper, &req).await?;
    Ok(RecordedAnswerResponse::from(&saved))
}
