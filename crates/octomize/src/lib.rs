pub mod cli;
pub mod config;
mod console;
pub mod plan;
mod utils;

pub use cli::Cli;
pub use config::Config;
pub use plan::{Plan, PlanError};
pub use utils::logging::setup_logging;
