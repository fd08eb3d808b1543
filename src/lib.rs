pub mod api;
pub mod client;
pub mod config;
pub mod encode;
pub mod models;
pub mod parse;
pub mod prompt;
pub mod relay;
pub mod validate;
