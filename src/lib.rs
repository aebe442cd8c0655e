pub mod api;
pub mod cache;
pub mod config;
pub mod humanize;
pub mod manifest;
pub mod observability;
pub mod upstream;
