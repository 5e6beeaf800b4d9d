pub mod audit;
pub mod auth;
pub mod config;
pub mod context;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod images;
pub mod models;
pub mod slides;
pub mod storage;
