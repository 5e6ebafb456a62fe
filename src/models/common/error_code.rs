// API 业务错误码
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ErrorCode {
    Success = 0,

    // 通用错误
    BadRequest = 1000,
    Unauthorized = 1001,
    Forbidden = 1003,
    NotFound = 1004,
    InternalServerError = 1005,

    // 测评相关
    AssessmentNotFound = 3000,
    AssessmentNotReady = 3001,

    // 答题会话相关
    AttemptNotFound = 4000,
    AttemptAlreadyCompleted = 4001,
    AttemptNotInProgress = 4002,
    AttemptDeadlinePassed = 4003,
    QuestionNotInAssessment = 4004,
}
