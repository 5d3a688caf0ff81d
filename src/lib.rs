//! Library crate for nmap-inventory-rs exposing reusable modules.
pub mod config;
pub mod error;
pub mod executor;
pub mod inventory;
pub mod parser;
pub mod types;
