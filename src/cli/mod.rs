pub mod commands;
pub mod handlers;
pub mod output;

pub use commands::{CliArgs, Commands, DetectArgs, LaunchArgs, PlanArgs, ResolveArgs};
pub use output::{OutputFormat, OutputFormatter};
