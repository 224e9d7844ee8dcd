//! Bootstrap module for initializing the inventory server
//!
//! This module handles:
//! - Configuration loading
//! - Database initialization
//! - Service initialization and dependency injection
//! - Mock data seeding and self-registration

pub mod config;
pub mod database;
pub mod mock;
pub mod registration;
pub mod services;

pub use config::load_config;
pub use database::init_database;
pub use mock::seed_mock_data;
pub use registration::register_self;
pub use services::{init_services, Services};
