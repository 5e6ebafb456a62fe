pub mod clock;
pub mod extractor;
pub mod keyed_lock;
pub mod parameter_error_handler;
pub mod sql;
pub mod validate;

pub use clock::{Clock, ManualClock, SystemClock};
pub use extractor::{CurrentStudent, SafeIDI64};
pub use keyed_lock::KeyedLocks;
pub use parameter_error_handler::json_error_handler;
pub use parameter_error_handler::query_error_handler;
pub use sql::escape_like_pattern;
