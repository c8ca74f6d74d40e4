pub mod config_store;
pub mod connectivity;
pub mod defaults;
pub mod runtime_engine;
pub mod secrets;
pub mod transport;
