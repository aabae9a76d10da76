pub mod asset;
pub mod builder;
pub mod cleanup;
pub mod commands;
pub mod config;
pub mod error;
pub mod github;
pub mod http;
pub mod mapping;
pub mod platform;
pub mod resolver;
pub mod runtime;
pub mod store;
pub mod version;
