pub mod error;
pub mod orchestrator;
pub mod payload;
pub mod retry;
pub mod session;
pub mod traits;
pub mod voice;
