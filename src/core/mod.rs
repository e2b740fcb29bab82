pub mod common;
pub mod config;
pub mod geometry;
pub mod indexing;
pub mod projection;
pub mod storage;
pub use self::config::Config;
