pub mod activity;
pub mod bot;
pub mod config;
pub mod instruction;
pub mod log;
pub mod mock;
pub mod program;
pub mod queue;
pub mod transport;
pub mod types;
pub mod validator;
