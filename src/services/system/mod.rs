use std::sync::Arc;

use tracing::warn;

use crate::models::AppStartTime;
use crate::models::system::responses::HealthResponse;
use crate::storage::Storage;
use crate::utils::Clock;

pub struct SystemService {
    storage: Arc<dyn Storage>,
    clock: Arc<dyn Clock>,
    start_time: AppStartTime,
}

impl SystemService {
    pub fn new(storage: Arc<dyn Storage>, clock: Arc<dyn Clock>, start_time: AppStartTime) -> Self {
        Self {
            storage,
            clock,
            start_time,
        }
    }

    /// 健康检查，数据库不可用时状态为 degraded
    pub async fn health(&self) -> HealthResponse {
        let database = match self.storage.ping().await {
            Ok(()) => true,
            Err(e) => {
                warn!("Health check: database unavailable: {}", e);
                false
            }
        };

        HealthResponse {
            status: if database { "ok" } else { "degraded" }.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            database,
            started_at: self.start_time.start_datetime,
            uptime_seconds: (self.clock.now() - self.start_time.start_datetime)
                .num_seconds()
                .max(0),
        }
    }
}
