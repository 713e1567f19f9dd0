//! DM and group channels

pub mod manager;

pub use manager::{ChannelManager, GroupChannel};
