pub mod auth;
pub mod files;
pub mod generate;
pub mod health;
pub mod mapping;
pub mod send;
pub mod sessions;
pub mod templates;
pub mod uploads;
