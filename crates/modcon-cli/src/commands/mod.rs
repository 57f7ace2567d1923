pub mod collections;
pub mod config;
pub mod run;
pub mod show;
pub mod utils;
