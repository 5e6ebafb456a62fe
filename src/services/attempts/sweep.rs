use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use super::AttemptService;
use super::submit::finalize_expired;
use crate::errors::Result;
use crate::models::attempts::entities::SessionStatus;

pub async fn sweep_expired(service: &AttemptService) -> Result<usize> {
    let now = service.now();
    let cutoff = now - chrono::Duration::seconds(service.settings.deadline_grace_seconds.max(0));
    let candidates = service
        .storage
        .list_in_progress_started_before(cutoff)
        .await?;

    let mut finalized = 0;
    for session in candidates {
        if !service.is_expired(&session, now) {
            continue;
        }
        let paper = match service.paper_for(&session).await {
            Ok(paper) => paper,
            Err(e) => {
                warn!("Sweeper cannot load paper for session {}: {}", session.id, e);
                continue;
            }
        };
        match finalize_expired(service, session.id, &paper).await {
            Ok(done) if done.status == SessionStatus::Completed => finalized += 1,
            Ok(_) => {}
            Err(e) => warn!("Sweeper failed to finalize session {}: {}", session.id, e),
        }
    }

    if finalized > 0 {
        info!("Sweeper finalized {} expired session(s)", finalized);
    }
    Ok(finalized)
}

/// 启动后台超时扫描，间隔为 0 时不启动
pub fn spawn_sweeper(service: Arc<AttemptService>, interval_seconds: u64) -> Option<JoinHandle<()>> {
    if interval_seconds == 0 {
        return None;
    }

    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_seconds));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            if let Err(e) = service.sweep_expired().await {
                warn!("Expired session sweep failed: {}", e);
            }
        }
    }))
}
