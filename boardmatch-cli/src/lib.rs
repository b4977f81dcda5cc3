pub mod error;
pub mod infrastructure;

pub use error::{CliError, Result};
pub use infrastructure::observability::LogConfig;
