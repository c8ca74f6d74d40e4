pub mod config;
pub mod envelope;
pub mod json_repair;
pub mod messages;
pub mod prompt;
pub mod types;

pub use config::*;
pub use envelope::*;
pub use json_repair::*;
pub use messages::*;
pub use prompt::*;
pub use types::*;
