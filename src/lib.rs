pub mod commands;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod gateway;
pub mod keyboard;
pub mod question;
pub mod runner;
pub mod session;
