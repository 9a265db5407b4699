pub mod averages;
pub mod command;
pub mod config;
pub mod error;
pub mod fetch;
pub mod model;
pub mod output;
pub mod services;
pub mod session;
pub mod sheets;
