pub mod config;
pub mod dict;
pub mod error;
pub mod store;
pub mod types;
pub mod utils;
