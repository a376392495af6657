pub mod attribute;
pub mod catalog;
pub mod cube;
pub mod group_hash;
pub mod likes;
pub mod posting;
pub mod tier;
