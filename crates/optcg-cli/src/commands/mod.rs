//! Command handlers

pub mod card;
pub mod config;
pub mod export;
pub mod import;
pub mod save;
pub mod stats;
pub mod status;
