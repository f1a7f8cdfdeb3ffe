pub mod config;
pub mod mock;
pub mod normalize;
pub mod service;
