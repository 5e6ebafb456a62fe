use std::sync::Arc;

use actix_web::{HttpResponse, Result as ActixResult, middleware, web};

use super::respond;
use crate::services::AnalyticsService;
use crate::utils::CurrentStudent;

// 成绩总览
pub async fn get_dashboard(
    analytics: web::Data<Arc<AnalyticsService>>,
    student: CurrentStudent,
) -> ActixResult<HttpResponse> {
    Ok(respond(
        analytics.dashboard(student.0).await,
        "获取成绩总览成功",
    ))
}

// 弱项
pub async fn get_weaknesses(
    analytics: web::Data<Arc<AnalyticsService>>,
    student: CurrentStudent,
) -> ActixResult<HttpResponse> {
    Ok(respond(
        analytics.weakness_summary(student.0).await,
        "获取弱项成功",
    ))
}

// 强项
pub async fn get_strengths(
    analytics: web::Data<Arc<AnalyticsService>>,
    student: CurrentStudent,
) -> ActixResult<HttpResponse> {
    Ok(respond(
        analytics.strength_summary(student.0).await,
        "获取强项成功",
    ))
}

// 时间管理分析
pub async fn get_time_management(
    analytics: web::Data<Arc<AnalyticsService>>,
    student: CurrentStudent,
) -> ActixResult<HttpResponse> {
    Ok(respond(
        analytics.time_management(student.0).await,
        "获取时间管理分析成功",
    ))
}

// 配置路由
pub fn configure_analytics_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/analytics")
            .wrap(middleware::Compress::default())
            .route("/dashboard", web::get().to(get_dashboard))
            .route("/weaknesses", web::get().to(get_weaknesses))
            .route("/strengths", web::get().to(get_strengths))
            .route("/time-management", web::get().to(get_time_management)),
    );
}
