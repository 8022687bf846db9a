pub mod client;
pub mod config;
mod config_env;
pub mod conversation;
pub mod inline_image;
pub mod llm;
pub mod models;
