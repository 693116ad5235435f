pub mod env_paths;
pub mod service_config;
