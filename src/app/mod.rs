pub mod adb;
pub mod commands;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod exec;
pub mod fastboot;
pub mod logging;
pub mod models;
