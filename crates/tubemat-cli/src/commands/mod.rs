//! CLI command implementations.

pub mod calibrate;
pub mod common;
pub mod generate;
pub mod init_config;
pub mod process;
pub mod simulate;
