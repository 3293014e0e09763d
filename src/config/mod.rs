pub mod app_config;
pub mod mongo_config;
