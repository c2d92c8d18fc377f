pub mod config;
pub mod logger;
pub mod questions;
pub mod webhook;
