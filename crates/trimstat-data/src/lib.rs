pub mod loader;
pub mod schema;

pub use loader::{AttemptLog, DataLoadError, load_attempt_log, load_attempts, load_config};
