pub mod alerting;
pub mod api;
pub mod auth;
pub mod config;
pub mod dispatch;
pub mod domain;
pub mod observability;
pub mod store;
pub mod video;
pub mod workers;
