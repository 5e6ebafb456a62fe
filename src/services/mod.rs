pub mod analytics;
pub mod attempts;
pub mod catalog;
pub mod grading;
pub mod notifier;
pub mod system;

pub use analytics::AnalyticsService;
pub use attempts::{AttemptService, AttemptSettings};
pub use catalog::CatalogService;
pub use notifier::{LogNotifier, Notifier};
pub use system::SystemService;
