pub mod config;
pub mod constants;
pub mod resource_resolver;
