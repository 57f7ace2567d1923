pub mod action;
pub mod collection;
pub mod config;
pub mod error;
pub mod notification;
pub mod permission;
pub mod selection;

// Re-export common error type
pub use error::ModconError;
