//! CLI command implementations

pub mod error;
pub mod sync;
pub mod validate;

pub use error::CliError;
pub use sync::{Cli, Commands, SyncArgs};
pub use validate::ValidateCommand;
