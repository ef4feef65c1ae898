pub mod api;
pub mod client;
pub mod commands;
pub mod config;
pub mod db;
pub mod engine;
pub mod feedback;
pub mod matching;
pub mod models;
pub mod resolve;
pub mod session;
