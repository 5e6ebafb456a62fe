use std::sync::Arc;

use actix_web::{HttpResponse, Result as ActixResult, web};

use super::respond;
use crate::models::attempts::requests::{
    AttemptHistoryParams, RecordAnswerRequest, SubmitAttemptRequest,
};
use crate::services::AttemptService;
use crate::utils::{CurrentStudent, SafeIDI64};

// 作答历史
pub async fn list_attempts(
    attempts: web::Data<Arc<AttemptService>>,
    student: CurrentStudent,
    query: web::Query<AttemptHistoryParams>,
) -> ActixResult<HttpResponse> {
    let result = attempts.list_results(student.0, query.into_inner()).await;
    Ok(respond(result, "获取作答历史成功"))
}

// 作答结果
pub async fn get_attempt(
    attempts: web::Data<Arc<AttemptService>>,
    student: CurrentStudent,
    path: SafeIDI64,
) -> ActixResult<HttpResponse> {
    let result = attempts.get_result(student.0, path.0).await;
    Ok(respond(result, "获取作答结果成功"))
}

// 记录单题作答
pub async fn record_answer(
    attempts: web::Data<Arc<AttemptService>>,
    student: CurrentStudent,
    path: SafeIDI64,
    body: web::Json<RecordAnswerRequest>,
) -> ActixResult<HttpResponse> {
    let result = attempts
        .record_answer(student.0, path.0, body.into_inner())
        .await;
    Ok(respond(result, "作答已保存"))
}

// 提交作答
pub async fn submit_attempt(
    attempts: web::Data<Arc<AttemptService>>,
    student: CurrentStudent,
    path: SafeIDI64,
    body: Option<web::Json<SubmitAttemptRequest>>,
) -> ActixResult<HttpResponse> {
    let req = body.map(|b| b.into_inner()).unwrap_or_default();
    let result = attempts.submit_attempt(student.0, path.0, req).await;
    Ok(respond(result, "提交成功"))
}

// 放弃作答
pub async fn abandon_attempt(
    attempts: web::Data<Arc<AttemptService>>,
    student: CurrentStudent,
    path: SafeIDI64,
) -> ActixResult<HttpResponse> {
    let result = attempts.abandon_attempt(student.0, path.0).await;
    Ok(respond(result, "已放弃作答"))
}

// 配置路由
pub fn configure_attempts_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/attempts")
            .service(web::resource("").route(web::get().to(list_attempts)))
            .service(web::resource("/{id}").route(web::get().to(get_attempt)))
            .service(web::resource("/{id}/answers").route(web::put().to(record_answer)))
            .service(web::resource("/{id}/submit").route(web::post().to(submit_attempt)))
            .service(web::resource("/{id}/abandon").route(web::post().to(abandon_attempt))),
    );
}
