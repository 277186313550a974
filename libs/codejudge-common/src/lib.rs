pub mod catalog;
pub mod config;
pub mod progress;
pub mod redis;
pub mod session;
pub mod types;
