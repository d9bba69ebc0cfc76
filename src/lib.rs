pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod entities;
pub mod error;
pub mod listing;
pub mod metrics;
pub mod migrator;
pub mod scope;
pub mod services;
pub mod telemetry;
pub mod validation;
pub mod web;

pub use sea_orm;
