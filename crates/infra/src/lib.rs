//! Infrastructure layer: persistence, application services, configuration.

pub mod config;
pub mod services;
pub mod store;

mod integration_tests;
