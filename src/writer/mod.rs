pub mod batch;
pub mod loader;
pub mod worker;
