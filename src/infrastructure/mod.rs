pub mod config;
pub mod logging;
pub mod mail;
pub mod security;
pub mod uploads;
