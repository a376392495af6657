pub mod iterators;
pub mod planner;
pub mod types;
