//! Application services.

pub mod error;
pub mod posts;
pub mod repos;
