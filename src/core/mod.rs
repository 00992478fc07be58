//! Domain models and configuration

pub mod config;
pub mod models;
