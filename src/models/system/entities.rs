use chrono::{DateTime, Utc};

// 应用启动时间，用于健康检查中的运行时长
#[derive(Debug, Clone, Copy)]
pub struct AppStartTime {
    pub start_datetime: DateTime<Utc>,
}
