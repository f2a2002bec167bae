pub mod app_settings;
pub mod connection;
pub mod messages;
pub mod session;
pub mod ticker;
