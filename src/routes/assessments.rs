use std::sync::Arc;

use actix_web::{HttpResponse, Result as ActixResult, web};

use super::respond;
use crate::models::catalog::requests::AvailableAssessmentParams;
use crate::services::{AttemptService, CatalogService};
use crate::utils::{CurrentStudent, SafeIDI64};

// 列出可参加的测评
pub async fn list_assessments(
    catalog: web::Data<Arc<CatalogService>>,
    student: CurrentStudent,
    query: web::Query<AvailableAssessmentParams>,
) -> ActixResult<HttpResponse> {
    let result = catalog.list_available(student.0, query.into_inner()).await;
    Ok(respond(result, "获取测评列表成功"))
}

// 获取测评试卷（不含答案）
pub async fn get_assessment(
    catalog: web::Data<Arc<CatalogService>>,
    _student: CurrentStudent,
    path: SafeIDI64,
) -> ActixResult<HttpResponse> {
    let result = catalog.paper_for_student(path.0).await;
    Ok(respond(result, "获取测评成功"))
}

// 开始或继续作答
pub async fn start_attempt(
    attempts: web::Data<Arc<AttemptService>>,
    student: CurrentStudent,
    path: SafeIDI64,
) -> ActixResult<HttpResponse> {
    let result = attempts.start_attempt(student.0, path.0).await;
    Ok(respond(result, "开始作答"))
}

// 配置路由
pub fn configure_assessments_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/assessments")
            .service(web::resource("").route(web::get().to(list_assessments)))
            .service(web::resource("/{id}").route(web::get().to(get_assessment)))
            .service(web::resource("/{id}/attempts").route(web::post().to(start_attempt))),
    );
}
