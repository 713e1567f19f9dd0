//! Core service wiring

pub mod relay_manager;

pub use relay_manager::RelayManager;
