use serde::Deserialize;

use crate::models::common::pagination::PaginationQuery;

/// 记录单题作答
#[derive(Debug, Clone, Deserialize)]
pub struct RecordAnswerRequest {
    pub question_id: i64,
    /// 选项下标（"2"）或选项字母（"C"）；为空表示清空作答
    pub answer: Option<String>,
    #[serde(default)]
    pub time_spent: i32,
}

/// 提交作答
#[derive(Debug, Clone, Deserialize, Default)]
pub struct SubmitAttemptRequest {
    #[serde(default)]
    pub answers: Vec<RecordAnswerRequest>,
    /// 客户端计时（秒），仅在配置信任客户端计时时使用
    pub elapsed_seconds: Option<i32>,
}

/// 作答历史查询参数
#[derive(Debug, Clone, Deserialize)]
pub struct AttemptHistoryParams {
    #[serde(flatten)]
    pub pagination: PaginationQuery,
}
