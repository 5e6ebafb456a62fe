pub mod analytics;

pub mod assessments;

pub mod attempts;

pub mod system;

pub use analytics::configure_analytics_routes;
pub use assessments::configure_assessments_routes;
pub use attempts::configure_attempts_routes;
pub use system::configure_system_routes;

use actix_web::HttpResponse;
use serde::Serialize;

use crate::errors::Result;
use crate::models::ApiResponse;

// 业务结果转换为统一响应
pub(crate) fn respond<T: Serialize>(result: Result<T>, message: &str) -> HttpResponse {
    match result {
        Ok(data) => HttpResponse::Ok().json(ApiResponse::success(data, message)),
        Err(e) => ApiResponse::<()>::from_portal_error(&e),
    }
}
