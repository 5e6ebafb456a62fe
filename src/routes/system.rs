use std::sync::Arc;

use actix_web::{HttpResponse, Result as ActixResult, web};

use crate::models::ApiResponse;
use crate::services::SystemService;

// 健康检查，不需要身份
pub async fn health(system: web::Data<Arc<SystemService>>) -> ActixResult<HttpResponse> {
    let report = system.health().await;
    let mut builder = if report.database {
        HttpResponse::Ok()
    } else {
        HttpResponse::ServiceUnavailable()
    };
    Ok(builder.json(ApiResponse::success(report, "ok")))
}

// 配置路由
pub fn configure_system_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/api/v1/system").route("/health", web::get().to(health)));
}
