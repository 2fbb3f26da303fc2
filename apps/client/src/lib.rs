pub mod api_client;
pub mod auth;
pub mod cli;
pub mod config;
pub mod errors;
pub mod export;
pub mod lifecycle;
pub mod models;
pub mod session;
pub mod validation;
