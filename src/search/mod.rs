pub mod filter;
pub mod group;
pub mod recommend;
pub mod suggest;
