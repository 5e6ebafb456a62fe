use crate::cache::{ObjectCache, register::create_object_cache};
use crate::config::AppConfig;
use crate::models::AppStartTime;
use crate::services::attempts::sweep::spawn_sweeper;
use crate::services::catalog::seed::load_seed_file;
use crate::services::{
    AnalyticsService, AttemptService, AttemptSettings, CatalogService, LogNotifier, Notifier,
    SystemService,
};
use crate::storage::Storage;
use crate::utils::{Clock, SystemClock};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub struct StartupContext {
    pub storage: Arc<dyn Storage>,
    pub cache: Arc<dyn ObjectCache>,
    pub catalog: Arc<CatalogService>,
    pub attempts: Arc<AttemptService>,
    pub analytics: Arc<AnalyticsService>,
    pub system: Arc<SystemService>,
    pub sweeper: Option<JoinHandle<()>>,
}

/// 创建缓存实例，配置的后端不可用时回退到内存缓存
async fn create_cache() -> Result<Arc<dyn ObjectCache>, Box<dyn std::error::Error>> {
    let config = AppConfig::get();
    let cache_type = &config.cache.cache_type;

    warn!("Attempting to create {} cache backend", cache_type);

    match create_object_cache(cache_type).await {
        Ok(cache) => {
            warn!("Successfully created {} cache backend", cache_type);
            return Ok(Arc::from(cache));
        }
        Err(e) => warn!("Failed to create {} cache: {}", cache_type, e),
    }

    if cache_type != "moka" {
        warn!("Falling back to default memory cache");
        match create_object_cache("moka").await {
            Ok(cache) => {
                warn!("Successfully created fallback Moka (in-memory) cache backend");
                return Ok(Arc::from(cache));
            }
            Err(fallback_e) => warn!("Failed to create fallback Moka cache: {}", fallback_e),
        }
    }

    Err(format!("No cache backend available (tried: {cache_type})").into())
}

/// 题库为空时按配置导入初始题库
async fn seed_catalog(catalog: &CatalogService) {
    let Some(path) = AppConfig::get().catalog.seed_file.as_deref() else {
        debug!("No catalog seed file configured, skipping seed");
        return;
    };

    let seed = match load_seed_file(path) {
        Ok(seed) => seed,
        Err(e) => {
            warn!("Failed to load catalog seed from {}: {}", path, e);
            return;
        }
    };

    match catalog.seed(seed).await {
        Ok(report) if report.skipped => {}
        Ok(report) => info!(
            "Catalog seeded from {}: {} categories, {} questions, {} assessments",
            path, report.categories, report.questions, report.assessments
        ),
        Err(e) => warn!("Catalog seed from {} failed: {}", path, e),
    }
}

/// 准备服务器启动的上下文
/// 包括存储、缓存、各业务服务和后台任务
pub async fn prepare_server_startup(start_time: AppStartTime) -> StartupContext {
    let config = AppConfig::get();

    if cfg!(debug_assertions) {
        crate::cache::register::debug_object_cache_registry();
        debug!("Debug mode: Cache registry is enabled");
    }

    let storage = crate::storage::create_storage()
        .await
        .expect("Failed to create storage backend");
    warn!("Storage backend initialized and migrations completed");

    // 创建缓存实例
    let cache = create_cache().await.expect("Failed to create cache");
    warn!("Cache backend initialized");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier);

    let catalog = Arc::new(CatalogService::new(
        storage.clone(),
        cache.clone(),
        clock.clone(),
    ));
    let analytics = Arc::new(AnalyticsService::new(
        storage.clone(),
        catalog.clone(),
        clock.clone(),
    ));
    let attempts = Arc::new(AttemptService::new(
        storage.clone(),
        catalog.clone(),
        analytics.clone(),
        notifier,
        clock.clone(),
        AttemptSettings::from_config(&config.assessment),
    ));
    let system = Arc::new(SystemService::new(storage.clone(), clock, start_time));

    seed_catalog(&catalog).await;

    let sweeper = spawn_sweeper(attempts.clone(), config.assessment.sweep_interval_seconds);
    if sweeper.is_some() {
        warn!(
            "Expired session sweeper running every {} seconds",
            config.assessment.sweep_interval_seconds
        );
    }

    StartupContext {
        storage,
        cache,
        catalog,
        attempts,
        analytics,
        system,
        sweeper,
    }
}
