//! CLI Commands

pub mod code;
pub mod jenkins;
pub mod logs;
pub mod stats;
