//! Backends that read system state and build the commands that change it.
//!
//! Nothing in here touches GTK. Parsers are plain functions over captured
//! command output so they can be tested without the tools installed.

pub mod audio;
pub mod datetime;
pub mod hardware_info;
pub mod hardware_tools;
pub mod kernels;
pub mod logs;
pub mod network;
pub mod news;
pub mod packages;
pub mod repositories;
pub mod security;
pub mod services;
pub mod system_info;
pub mod tweaks;
pub mod updates;
pub mod users;
