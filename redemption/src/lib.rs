pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod service;
pub mod storage;
pub mod utils;
