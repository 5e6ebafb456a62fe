//! 请求参数提取器

use actix_web::{
    Error, FromRequest, HttpRequest, HttpResponse, dev::Payload, error::InternalError,
    http::StatusCode,
};
use futures_util::future::{Ready, ready};

use crate::config::AppConfig;
use crate::models::{ApiResponse, ErrorCode};

fn reject(status: StatusCode, code: ErrorCode, message: String) -> Error {
    let response =
        HttpResponse::build(status).json(ApiResponse::error_empty(code, message.clone()));
    InternalError::from_response(message, response).into()
}

/// 当前学生
///
/// 身份由上游认证网关写入请求头（默认 `X-Student-Id`），这里只做解析。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentStudent(pub i64);

impl CurrentStudent {
    pub fn from_header(req: &HttpRequest, header: &str) -> Result<Self, String> {
        let raw = req
            .headers()
            .get(header)
            .ok_or_else(|| format!("缺少身份请求头 {header}"))?
            .to_str()
            .map_err(|_| format!("身份请求头 {header} 不是合法文本"))?;

        match raw.trim().parse::<i64>() {
            Ok(id) if id > 0 => Ok(Self(id)),
            _ => Err(format!("身份请求头 {header} 不是合法的学生 ID")),
        }
    }
}

impl FromRequest for CurrentStudent {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let header = &AppConfig::get().identity.student_header;
        ready(Self::from_header(req, header).map_err(|message| {
            reject(
                StatusCode::UNAUTHORIZED,
                ErrorCode::Unauthorized,
                message,
            )
        }))
    }
}

/// 路径中的 `{id}` 参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SafeIDI64(pub i64);

impl FromRequest for SafeIDI64 {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let parsed = req
            .match_info()
            .get("id")
            .and_then(|raw| raw.parse::<i64>().ok())
            .filter(|id| *id > 0);

        ready(parsed.map(SafeIDI64).ok_or_else(|| {
            reject(
                StatusCode::BAD_REQUEST,
                ErrorCode::BadRequest,
                "路径参数 id 必须是正整数".to_string(),
            )
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn parses_student_header() {
        let req = TestRequest::default()
            .insert_header(("X-Student-Id", " 42 "))
            .to_http_request();
        assert_eq!(
            CurrentStudent::from_header(&req, "X-Student-Id"),
            Ok(CurrentStudent(42))
        );
    }

    #[test]
    fn rejects_missing_or_invalid_header() {
        let req = TestRequest::default().to_http_request();
        assert!(CurrentStudent::from_header(&req, "X-Student-Id").is_err());

        let req = TestRequest::default()
            .insert_header(("X-Student-Id", "abc"))
            .to_http_request();
        assert!(CurrentStudent::from_header(&req, "X-Student-Id").is_err());

        let req = TestRequest::default()
            .insert_header(("X-Student-Id", "0"))
            .to_http_request();
        assert!(CurrentStudent::from_header(&req, "X-Student-Id").is_err());
    }
}
