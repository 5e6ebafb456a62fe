pub mod analytics;
pub mod attempts;
pub mod catalog;
pub mod common;
pub mod system;

pub use common::error_code::ErrorCode;
pub use common::pagination::{PaginationInfo, PaginationQuery};
pub use common::response::ApiResponse;
pub use system::entities::AppStartTime;
