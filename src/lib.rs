//! A posts API backed by PostgreSQL with a cache-aside list cache.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
