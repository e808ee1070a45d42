pub mod logger;

pub use logger::{ApprovalLog, LogRecord};
