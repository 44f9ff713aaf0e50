pub mod analyzers;
pub mod catalog;
pub mod chart;
pub mod config;
pub mod fetch;
pub mod infra;
pub mod models;
pub mod output;
pub mod parser;
pub mod server;
pub mod services;
pub mod session;
